//! # NFC Tag Repository
//!
//! NFC tags and the automatic stock entry booked when a tag is created
//! already bound to a product.
//!
//! ## Creation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 create(NewNfcTag { product_id: Some(P) })               │
//! │                                                                         │
//! │  BEGIN IMMEDIATE   (write lock first; waits out other writers)          │
//! │    │                                                                    │
//! │    ├── validate fields                                                  │
//! │    ├── P exists?              no ──► ROLLBACK, DbError::Reference       │
//! │    ├── INSERT nfc_tags        dup ─► ROLLBACK, Duplicate(tag_id)        │
//! │    └── INSERT stock_movements                                           │
//! │          { P, this tag, qty 1, entrada,                                 │
//! │            "Asignación automática de etiqueta NFC al producto" }        │
//! │    │                                                                    │
//! │  COMMIT  ──► tag + movement visible together, or neither               │
//! │                                                                         │
//! │  product_id: None     → tag only, no movement                          │
//! │  update/assign later  → never books a movement                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::generate_id;
use crate::repository::{begin_write, ensure_exists};
use crate::repository::stock::insert_movement;
use almacen_core::{NewNfcTag, NewStockMovement, NfcTag, StockMovement};

const SELECT_NFC: &str = "SELECT id, tag_id, status, assigned_on, product_id FROM nfc_tags";

/// Result of creating an NFC tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfcTagCreated {
    pub tag: NfcTag,
    /// The automatic entrada, present when the tag was created with a product.
    pub movement: Option<StockMovement>,
}

/// Creates a tag (and its entrada, if bound) on an open connection or
/// transaction. Nothing is committed here.
///
/// ```rust,ignore
/// let mut tx = db.pool().begin().await?;
/// let created = create_nfc_tag(&mut tx, &new_tag).await?;
/// let level = product_stock(&mut *tx, &product_id).await?; // sees the entrada
/// tx.commit().await?;
/// ```
pub async fn create_nfc_tag(
    conn: &mut SqliteConnection,
    new: &NewNfcTag,
) -> DbResult<NfcTagCreated> {
    new.validate()?;

    let tag = NfcTag {
        id: generate_id(),
        tag_id: new.tag_id.clone(),
        status: new.status.clone(),
        assigned_on: new.assigned_on,
        product_id: new.product_id.clone(),
    };

    debug!(id = %tag.id, tag_id = %tag.tag_id, "Inserting NFC tag");

    if let Some(product_id) = &tag.product_id {
        ensure_exists(&mut *conn, "products", "Product", product_id).await?;
    }

    sqlx::query(
        r#"
        INSERT INTO nfc_tags (id, tag_id, status, assigned_on, product_id)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&tag.id)
    .bind(&tag.tag_id)
    .bind(&tag.status)
    .bind(tag.assigned_on)
    .bind(&tag.product_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from(e).with_duplicate_value("tag_id", &tag.tag_id))?;

    let movement = match &tag.product_id {
        Some(product_id) => {
            let entry = NewStockMovement::nfc_assignment(product_id.as_str(), tag.id.as_str());
            Some(insert_movement(&mut *conn, &entry).await?)
        }
        None => None,
    };

    Ok(NfcTagCreated { tag, movement })
}

/// Repository for NFC tag database operations.
#[derive(Debug, Clone)]
pub struct NfcTagRepository {
    pool: SqlitePool,
}

impl NfcTagRepository {
    /// Creates a new NfcTagRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NfcTagRepository { pool }
    }

    /// Creates a tag in its own transaction.
    ///
    /// With a product, the tag row and one entrada movement commit together.
    /// Any failure rolls back both and surfaces as a single error.
    pub async fn create(&self, new: &NewNfcTag) -> DbResult<NfcTagCreated> {
        let mut tx = begin_write(&self.pool).await?;

        let created = create_nfc_tag(&mut tx, new).await?;

        tx.commit().await?;

        if let Some(movement) = &created.movement {
            info!(
                tag_id = %created.tag.tag_id,
                product_id = %movement.product_id,
                movement_id = %movement.id,
                "Automatic stock entry booked for NFC tag"
            );
        }

        Ok(created)
    }

    /// Gets a tag by its row ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<NfcTag>> {
        let tag = sqlx::query_as::<_, NfcTag>(&format!("{} WHERE id = ?1", SELECT_NFC))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    /// Gets a tag by the identifier read from the chip.
    pub async fn get_by_tag_id(&self, tag_id: &str) -> DbResult<Option<NfcTag>> {
        let tag = sqlx::query_as::<_, NfcTag>(&format!("{} WHERE tag_id = ?1", SELECT_NFC))
            .bind(tag_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    /// Lists all tags ordered by tag id.
    pub async fn list(&self) -> DbResult<Vec<NfcTag>> {
        let tags = sqlx::query_as::<_, NfcTag>(&format!("{} ORDER BY tag_id", SELECT_NFC))
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    /// Lists the tags bound to a product.
    pub async fn list_by_product(&self, product_id: &str) -> DbResult<Vec<NfcTag>> {
        let tags = sqlx::query_as::<_, NfcTag>(&format!(
            "{} WHERE product_id = ?1 ORDER BY tag_id",
            SELECT_NFC
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    /// Updates every field of a tag. Never books a movement, even when the
    /// product binding changes.
    pub async fn update(&self, tag: &NfcTag) -> DbResult<()> {
        tag.validate()?;

        debug!(id = %tag.id, "Updating NFC tag");

        let mut tx = begin_write(&self.pool).await?;

        if let Some(product_id) = &tag.product_id {
            ensure_exists(&mut *tx, "products", "Product", product_id).await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE nfc_tags
            SET tag_id = ?2, status = ?3, assigned_on = ?4, product_id = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&tag.id)
        .bind(&tag.tag_id)
        .bind(&tag.status)
        .bind(tag.assigned_on)
        .bind(&tag.product_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("tag_id", &tag.tag_id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("NfcTag", &tag.id));
        }

        tx.commit().await?;

        Ok(())
    }

    /// Binds (or unbinds with `None`) a tag to a product. No movement.
    pub async fn assign_product(&self, id: &str, product_id: Option<&str>) -> DbResult<NfcTag> {
        debug!(id = %id, product_id = ?product_id, "Assigning NFC tag");

        let mut tx = begin_write(&self.pool).await?;

        if let Some(product_id) = product_id {
            ensure_exists(&mut *tx, "products", "Product", product_id).await?;
        }

        let tag = sqlx::query_as::<_, NfcTag>(
            r#"
            UPDATE nfc_tags SET product_id = ?2 WHERE id = ?1
            RETURNING id, tag_id, status, assigned_on, product_id
            "#,
        )
        .bind(id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("NfcTag", id))?;

        tx.commit().await?;

        Ok(tag)
    }

    /// Deletes a tag and returns the removed row.
    ///
    /// Movements that reference it keep every other field; their
    /// `nfc_tag_id` becomes NULL (schema SET NULL).
    pub async fn delete(&self, id: &str) -> DbResult<NfcTag> {
        debug!(id = %id, "Deleting NFC tag");

        let tag = sqlx::query_as::<_, NfcTag>(
            "DELETE FROM nfc_tags WHERE id = ?1 RETURNING id, tag_id, status, assigned_on, product_id",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("NfcTag", id))?;

        Ok(tag)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
