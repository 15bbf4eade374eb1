//! # Transaction Repository
//!
//! Append-only log of user/product interactions. Rows are inserted and read,
//! never updated or deleted here; the schema also rejects `created_at` edits.

use chrono::{SubsecRound, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::generate_id;
use crate::repository::{begin_write, ensure_exists};
use almacen_core::{NewTransaction, Transaction, TransactionDetail};

const SELECT_DETAIL: &str = r#"
    SELECT
        t.id,
        t.user_id,
        t.product_id,
        t.created_at,
        u.name AS user_name,
        p.name AS product_name
    FROM transactions t
    INNER JOIN users u ON u.id = t.user_id
    INNER JOIN products p ON p.id = t.product_id
"#;

/// Repository for the transaction log.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Logs a transaction stamped with the current time.
    ///
    /// ## Errors
    /// * `DbError::Reference` - user or product does not exist
    pub async fn create(&self, new: &NewTransaction) -> DbResult<Transaction> {
        new.validate()?;

        let transaction = Transaction {
            id: generate_id(),
            user_id: new.user_id.clone(),
            product_id: new.product_id.clone(),
            created_at: Utc::now().trunc_subsecs(3),
        };

        debug!(
            id = %transaction.id,
            user_id = %transaction.user_id,
            product_id = %transaction.product_id,
            "Logging transaction"
        );

        let mut tx = begin_write(&self.pool).await?;

        ensure_exists(&mut *tx, "users", "User", &transaction.user_id).await?;
        ensure_exists(&mut *tx, "products", "Product", &transaction.product_id).await?;

        sqlx::query(
            "INSERT INTO transactions (id, user_id, product_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&transaction.id)
        .bind(&transaction.user_id)
        .bind(&transaction.product_id)
        .bind(transaction.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(transaction)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<TransactionDetail>> {
        let detail =
            sqlx::query_as::<_, TransactionDetail>(&format!("{} WHERE t.id = ?1", SELECT_DETAIL))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(detail)
    }

    /// All transactions, newest first.
    pub async fn list(&self) -> DbResult<Vec<TransactionDetail>> {
        let details = sqlx::query_as::<_, TransactionDetail>(&format!(
            "{} ORDER BY t.created_at DESC, t.id",
            SELECT_DETAIL
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<TransactionDetail>> {
        let details = sqlx::query_as::<_, TransactionDetail>(&format!(
            "{} WHERE t.user_id = ?1 ORDER BY t.created_at DESC, t.id",
            SELECT_DETAIL
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }

    pub async fn list_by_product(&self, product_id: &str) -> DbResult<Vec<TransactionDetail>> {
        let details = sqlx::query_as::<_, TransactionDetail>(&format!(
            "{} WHERE t.product_id = ?1 ORDER BY t.created_at DESC, t.id",
            SELECT_DETAIL
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(details)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_create_and_detail() {
        let db = fixtures::db().await;
        let category = fixtures::category(&db, "Bebidas").await;
        let product = fixtures::product(&db, &category, "Café americano").await;
        let user = fixtures::user(&db, "Elena").await;

        let transaction = db
            .transactions()
            .create(&NewTransaction {
                user_id: user.id.clone(),
                product_id: product.id.clone(),
            })
            .await
            .unwrap();

        let detail = db
            .transactions()
            .get_by_id(&transaction.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.transaction, transaction);
        assert_eq!(detail.to_string(), "Elena - Café americano");

        assert_eq!(db.transactions().list_by_user(&user.id).await.unwrap().len(), 1);
        assert_eq!(
            db.transactions().list_by_product(&product.id).await.unwrap().len(),
            1
        );
        assert_eq!(db.transactions().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_user_is_reference_error() {
        let db = fixtures::db().await;
        let category = fixtures::category(&db, "Bebidas").await;
        let product = fixtures::product(&db, &category, "Café").await;

        let err = db
            .transactions()
            .create(&NewTransaction {
                user_id: generate_id(),
                product_id: product.id.clone(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Reference { ref entity, .. } if entity == "User"));
    }

    #[tokio::test]
    async fn test_created_at_is_immutable() {
        let db = fixtures::db().await;
        let category = fixtures::category(&db, "Bebidas").await;
        let product = fixtures::product(&db, &category, "Café").await;
        let user = fixtures::user(&db, "Iván").await;

        let transaction = db
            .transactions()
            .create(&NewTransaction {
                user_id: user.id.clone(),
                product_id: product.id.clone(),
            })
            .await
            .unwrap();

        let result = sqlx::query(
            "UPDATE transactions SET created_at = '1999-12-31T23:59:59+00:00' WHERE id = ?1",
        )
        .bind(&transaction.id)
        .execute(db.pool())
        .await;
        assert!(result.is_err());

        let stored = db
            .transactions()
            .get_by_id(&transaction.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.transaction.created_at, transaction.created_at);
    }
}
