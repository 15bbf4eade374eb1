//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Rules
//! - A product must belong to an existing category
//! - Deleting a product with stock movements or transactions is refused
//! - Deleting a product unbinds its NFC tags (`product_id` becomes NULL)
//!
//! Stock is not a column here; see [`crate::repository::stock`].

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::generate_id;
use crate::repository::{begin_write, count_referencing, ensure_exists};
use almacen_core::{NewProduct, Product};

const SELECT_PRODUCT: &str =
    "SELECT id, name, image_path, price_cents, description, category_id FROM products";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.create(&new_product).await?;
/// let in_category = repo.list_by_category(&product.category_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// * `DbError::Validation` - name, price or category id invalid
    /// * `DbError::Reference` - category does not exist
    pub async fn create(&self, new: &NewProduct) -> DbResult<Product> {
        new.validate()?;

        let product = Product {
            id: generate_id(),
            name: new.name.clone(),
            image_path: new.image_path.clone(),
            price_cents: new.price_cents,
            description: new.description.clone(),
            category_id: new.category_id.clone(),
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        let mut tx = begin_write(&self.pool).await?;

        ensure_exists(&mut *tx, "categories", "Category", &product.category_id).await?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, image_path, price_cents, description, category_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.image_path)
        .bind(product.price_cents)
        .bind(&product.description)
        .bind(&product.category_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{} WHERE id = ?1", SELECT_PRODUCT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists all products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!("{} ORDER BY name, id", SELECT_PRODUCT))
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists the products of one category ordered by name.
    pub async fn list_by_category(&self, category_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{} WHERE category_id = ?1 ORDER BY name, id",
            SELECT_PRODUCT
        ))
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates every editable field of a product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        product.validate()?;

        debug!(id = %product.id, "Updating product");

        let mut tx = begin_write(&self.pool).await?;

        ensure_exists(&mut *tx, "categories", "Category", &product.category_id).await?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                name = ?2,
                image_path = ?3,
                price_cents = ?4,
                description = ?5,
                category_id = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.image_path)
        .bind(product.price_cents)
        .bind(&product.description)
        .bind(&product.category_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        tx.commit().await?;

        Ok(())
    }

    /// Deletes a product and returns the removed row.
    ///
    /// ## Referential Actions
    /// - stock movements → refused
    /// - transactions → refused
    /// - NFC tags → unbound by the schema (SET NULL)
    pub async fn delete(&self, id: &str) -> DbResult<Product> {
        debug!(id = %id, "Deleting product");

        let mut tx = begin_write(&self.pool).await?;

        let product = sqlx::query_as::<_, Product>(&format!("{} WHERE id = ?1", SELECT_PRODUCT))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        for (table, dependent) in [
            ("stock_movements", "stock movements"),
            ("transactions", "transactions"),
        ] {
            if count_referencing(&mut *tx, table, "product_id", id).await? > 0 {
                return Err(DbError::protected("Product", id, dependent));
            }
        }

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(product)
    }

    /// Counts products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use almacen_core::{MovementType, NewNfcTag, NewStockMovement, NewTransaction, ValidationError};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = fixtures::db().await;
        let category = fixtures::category(&db, "Abarrotes").await;
        let product = fixtures::product(&db, &category, "Frijol negro").await;

        let fetched = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched, product);
        assert_eq!(fetched.price().unwrap().to_string(), "12.50");
    }

    #[tokio::test]
    async fn test_missing_category_is_reference_error() {
        let db = fixtures::db().await;
        let err = db
            .products()
            .create(&NewProduct {
                name: "Huérfano".to_string(),
                category_id: generate_id(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Reference { .. }));
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let db = fixtures::db().await;
        let category = fixtures::category(&db, "Abarrotes").await;
        let err = db
            .products()
            .create(&NewProduct {
                name: "Regalo".to_string(),
                price_cents: -1,
                category_id: category.id.clone(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_and_list_by_category() {
        let db = fixtures::db().await;
        let granos = fixtures::category(&db, "Granos").await;
        let bebidas = fixtures::category(&db, "Bebidas").await;
        let mut product = fixtures::product(&db, &granos, "Avena").await;

        product.category_id = bebidas.id.clone();
        product.description = "Bebida de avena".to_string();
        db.products().update(&product).await.unwrap();

        assert!(db.products().list_by_category(&granos.id).await.unwrap().is_empty());
        assert_eq!(
            db.products().list_by_category(&bebidas.id).await.unwrap(),
            vec![product]
        );
    }

    #[tokio::test]
    async fn test_delete_with_movements_is_protected() {
        let db = fixtures::db().await;
        let category = fixtures::category(&db, "Granos").await;
        let product = fixtures::product(&db, &category, "Lenteja").await;

        db.stock()
            .record_movement(&NewStockMovement {
                product_id: product.id.clone(),
                nfc_tag_id: None,
                quantity: 1,
                movement_type: MovementType::Entrada,
                description: None,
            })
            .await
            .unwrap();

        let err = db.products().delete(&product.id).await.unwrap_err();
        assert!(matches!(err, DbError::ReferentialIntegrity { .. }));
        assert!(db.products().get_by_id(&product.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_with_transactions_is_protected() {
        let db = fixtures::db().await;
        let category = fixtures::category(&db, "Granos").await;
        let product = fixtures::product(&db, &category, "Garbanzo").await;
        let user = fixtures::user(&db, "Lucia").await;

        db.transactions()
            .create(&NewTransaction {
                user_id: user.id.clone(),
                product_id: product.id.clone(),
            })
            .await
            .unwrap();

        let err = db.products().delete(&product.id).await.unwrap_err();
        assert!(matches!(err, DbError::ReferentialIntegrity { .. }));
    }

    #[tokio::test]
    async fn test_delete_unbinds_nfc_tags() {
        let db = fixtures::db().await;
        let category = fixtures::category(&db, "Granos").await;
        let product = fixtures::product(&db, &category, "Maíz").await;

        // Bound after creation, so no movement protects the product
        let created = db
            .nfc_tags()
            .create(&NewNfcTag {
                tag_id: "04:1F:22:AA".to_string(),
                status: "activa".to_string(),
                assigned_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                product_id: None,
            })
            .await
            .unwrap();
        db.nfc_tags()
            .assign_product(&created.tag.id, Some(product.id.as_str()))
            .await
            .unwrap();

        db.products().delete(&product.id).await.unwrap();

        let tag = db.nfc_tags().get_by_id(&created.tag.id).await.unwrap().unwrap();
        assert_eq!(tag.product_id, None);
    }
}
