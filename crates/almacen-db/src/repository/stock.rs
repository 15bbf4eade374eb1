//! # Stock Repository
//!
//! Stock movements and the derived stock figure.
//!
//! ## Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stock_movements                                                        │
//! │  ┌──────────┬──────────────┐                                            │
//! │  │ product  │ movement_type│        SUM(entrada rows)   = entradas      │
//! │  ├──────────┼──────────────┤   ──►  SUM(salida rows)    = salidas       │
//! │  │ P        │ entrada      │        stock = entradas - salidas          │
//! │  │ P        │ entrada      │                                            │
//! │  │ P        │ salida       │        P: 2 - 1 = 1                        │
//! │  └──────────┴──────────────┘                                            │
//! │                                                                         │
//! │  Nothing is cached: every call re-reads the movement rows.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`product_stock`] takes any SQLite executor, so it can be called on an
//! open transaction and sees that transaction's uncommitted movements.

use chrono::{SubsecRound, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::generate_id;
use crate::repository::{begin_write, ensure_exists, row_exists};
use almacen_core::{NewStockMovement, ProductStock, StockLevel, StockMovement, StockMovementDetail};

const SELECT_MOVEMENT: &str = r#"
    SELECT id, product_id, nfc_tag_id, quantity, movement_type, created_at, description
    FROM stock_movements
"#;

// =============================================================================
// Executor-Generic Queries
// =============================================================================

/// Movement counts for one product, read through `executor`.
///
/// A product with no movements (or an unknown id) yields zeros.
pub async fn product_stock<'e, E>(executor: E, product_id: &str) -> DbResult<StockLevel>
where
    E: Executor<'e, Database = Sqlite>,
{
    let level = sqlx::query_as::<_, StockLevel>(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN movement_type = 'entrada' THEN 1 ELSE 0 END), 0) AS entradas,
            COALESCE(SUM(CASE WHEN movement_type = 'salida' THEN 1 ELSE 0 END), 0) AS salidas
        FROM stock_movements
        WHERE product_id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_one(executor)
    .await?;

    Ok(level)
}

/// Writes one movement row. Callers check references first.
pub(crate) async fn insert_movement<'e, E>(
    executor: E,
    new: &NewStockMovement,
) -> DbResult<StockMovement>
where
    E: Executor<'e, Database = Sqlite>,
{
    let movement = StockMovement {
        id: generate_id(),
        product_id: new.product_id.clone(),
        nfc_tag_id: new.nfc_tag_id.clone(),
        quantity: new.quantity,
        movement_type: new.movement_type,
        created_at: Utc::now().trunc_subsecs(3),
        description: new.description.clone(),
    };

    debug!(
        id = %movement.id,
        product_id = %movement.product_id,
        movement_type = %movement.movement_type,
        "Inserting stock movement"
    );

    sqlx::query(
        r#"
        INSERT INTO stock_movements
            (id, product_id, nfc_tag_id, quantity, movement_type, created_at, description)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(&movement.nfc_tag_id)
    .bind(movement.quantity)
    .bind(movement.movement_type)
    .bind(movement.created_at)
    .bind(&movement.description)
    .execute(executor)
    .await?;

    Ok(movement)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock movements and derived stock.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.stock();
/// repo.record_movement(&salida).await?;
/// let level = repo.stock_for(&product_id).await?;
/// println!("{} on hand", level.stock());
/// ```
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Records a manual movement.
    ///
    /// ## Errors
    /// * `DbError::Validation` - quantity below 1 or malformed ids
    /// * `DbError::Reference` - product or NFC tag does not exist
    pub async fn record_movement(&self, new: &NewStockMovement) -> DbResult<StockMovement> {
        new.validate()?;

        let mut tx = begin_write(&self.pool).await?;

        ensure_exists(&mut *tx, "products", "Product", &new.product_id).await?;
        if let Some(nfc_tag_id) = &new.nfc_tag_id {
            ensure_exists(&mut *tx, "nfc_tags", "NfcTag", nfc_tag_id).await?;
        }

        let movement = insert_movement(&mut *tx, new).await?;

        tx.commit().await?;

        Ok(movement)
    }

    /// Gets a movement by ID.
    pub async fn get_movement(&self, id: &str) -> DbResult<Option<StockMovement>> {
        let movement =
            sqlx::query_as::<_, StockMovement>(&format!("{} WHERE id = ?1", SELECT_MOVEMENT))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(movement)
    }

    /// Movement history of one product, newest first.
    pub async fn movements_for_product(&self, product_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "{} WHERE product_id = ?1 ORDER BY created_at DESC, id",
            SELECT_MOVEMENT
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// All movements with their product names, newest first.
    pub async fn list_movements(&self) -> DbResult<Vec<StockMovementDetail>> {
        let movements = sqlx::query_as::<_, StockMovementDetail>(
            r#"
            SELECT
                m.id,
                m.product_id,
                m.nfc_tag_id,
                m.quantity,
                m.movement_type,
                m.created_at,
                m.description,
                p.name AS product_name
            FROM stock_movements m
            INNER JOIN products p ON p.id = m.product_id
            ORDER BY m.created_at DESC, m.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Current stock level of a product.
    ///
    /// Unlike [`product_stock`], an unknown product is `DbError::NotFound`.
    pub async fn stock_for(&self, product_id: &str) -> DbResult<StockLevel> {
        if !row_exists(&self.pool, "products", product_id).await? {
            return Err(DbError::not_found("Product", product_id));
        }

        product_stock(&self.pool, product_id).await
    }

    /// Stock of every product, including those without movements.
    pub async fn stock_report(&self) -> DbResult<Vec<ProductStock>> {
        let report = sqlx::query_as::<_, ProductStock>(
            r#"
            SELECT
                p.id AS product_id,
                p.name AS product_name,
                COALESCE(SUM(CASE WHEN m.movement_type = 'entrada' THEN 1 ELSE 0 END), 0) AS entradas,
                COALESCE(SUM(CASE WHEN m.movement_type = 'salida' THEN 1 ELSE 0 END), 0) AS salidas
            FROM products p
            LEFT JOIN stock_movements m ON m.product_id = p.id
            GROUP BY p.id, p.name
            ORDER BY p.name, p.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(products = report.len(), "Built stock report");
        Ok(report)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
