//! # RFID Tag Repository
//!
//! RFID tags are tracked on their own: no product link, no stock effect.
//! `tag_id` is unique; a duplicate surfaces as
//! `DbError::Validation(ValidationError::Duplicate)`.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::generate_id;
use almacen_core::{NewRfidTag, RfidTag};

const SELECT_RFID: &str =
    "SELECT id, tag_id, device_id, status, arrived_on, assigned_on FROM rfid_tags";

/// Repository for RFID tag database operations.
#[derive(Debug, Clone)]
pub struct RfidTagRepository {
    pool: SqlitePool,
}

impl RfidTagRepository {
    /// Creates a new RfidTagRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RfidTagRepository { pool }
    }

    /// Registers a new RFID tag.
    pub async fn create(&self, new: &NewRfidTag) -> DbResult<RfidTag> {
        new.validate()?;

        let tag = RfidTag {
            id: generate_id(),
            tag_id: new.tag_id.clone(),
            device_id: new.device_id.clone(),
            status: new.status.clone(),
            arrived_on: new.arrived_on,
            assigned_on: new.assigned_on,
        };

        debug!(id = %tag.id, tag_id = %tag.tag_id, "Inserting RFID tag");

        sqlx::query(
            r#"
            INSERT INTO rfid_tags (id, tag_id, device_id, status, arrived_on, assigned_on)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&tag.id)
        .bind(&tag.tag_id)
        .bind(&tag.device_id)
        .bind(&tag.status)
        .bind(tag.arrived_on)
        .bind(tag.assigned_on)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("tag_id", &tag.tag_id))?;

        Ok(tag)
    }

    /// Gets a tag by its row ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<RfidTag>> {
        let tag = sqlx::query_as::<_, RfidTag>(&format!("{} WHERE id = ?1", SELECT_RFID))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    /// Gets a tag by the identifier read from the chip.
    pub async fn get_by_tag_id(&self, tag_id: &str) -> DbResult<Option<RfidTag>> {
        let tag = sqlx::query_as::<_, RfidTag>(&format!("{} WHERE tag_id = ?1", SELECT_RFID))
            .bind(tag_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    /// Lists all tags ordered by tag id.
    pub async fn list(&self) -> DbResult<Vec<RfidTag>> {
        let tags = sqlx::query_as::<_, RfidTag>(&format!("{} ORDER BY tag_id", SELECT_RFID))
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    pub async fn update(&self, tag: &RfidTag) -> DbResult<()> {
        tag.validate()?;

        debug!(id = %tag.id, "Updating RFID tag");

        let result = sqlx::query(
            r#"
            UPDATE rfid_tags
            SET tag_id = ?2, device_id = ?3, status = ?4, arrived_on = ?5, assigned_on = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&tag.id)
        .bind(&tag.tag_id)
        .bind(&tag.device_id)
        .bind(&tag.status)
        .bind(tag.arrived_on)
        .bind(tag.assigned_on)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value("tag_id", &tag.tag_id))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RfidTag", &tag.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting RFID tag");

        let result = sqlx::query("DELETE FROM rfid_tags WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RfidTag", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use almacen_core::ValidationError;
    use chrono::NaiveDate;

    fn new_tag(tag_id: &str) -> NewRfidTag {
        NewRfidTag {
            tag_id: tag_id.to_string(),
            device_id: Some("lector-01".to_string()),
            status: Some("recibida".to_string()),
            arrived_on: NaiveDate::from_ymd_opt(2024, 5, 10),
            assigned_on: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup_by_tag_id() {
        let db = fixtures::db().await;
        let tag = db.rfid_tags().create(&new_tag("E200001722110144")).await.unwrap();

        let by_tag = db
            .rfid_tags()
            .get_by_tag_id("E200001722110144")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_tag, tag);
        assert_eq!(by_tag.arrived_on, NaiveDate::from_ymd_opt(2024, 5, 10));
    }

    #[tokio::test]
    async fn test_optional_fields() {
        let db = fixtures::db().await;
        let tag = db
            .rfid_tags()
            .create(&NewRfidTag {
                tag_id: "E2000099".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let fetched = db.rfid_tags().get_by_id(&tag.id).await.unwrap().unwrap();
        assert_eq!(fetched.device_id, None);
        assert_eq!(fetched.status, None);
        assert_eq!(fetched.arrived_on, None);
    }

    #[tokio::test]
    async fn test_duplicate_tag_id() {
        let db = fixtures::db().await;
        db.rfid_tags().create(&new_tag("E2000017")).await.unwrap();

        let err = db.rfid_tags().create(&new_tag("E2000017")).await.unwrap_err();
        match err {
            DbError::Validation(ValidationError::Duplicate { field, value }) => {
                assert_eq!(field, "tag_id");
                assert_eq!(value, "E2000017");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tag_id_too_long() {
        let db = fixtures::db().await;
        let err = db
            .rfid_tags()
            .create(&new_tag(&"F".repeat(51)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Validation(ValidationError::TooLong { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = fixtures::db().await;
        let mut tag = db.rfid_tags().create(&new_tag("E2000042")).await.unwrap();

        tag.status = Some("asignada".to_string());
        tag.assigned_on = NaiveDate::from_ymd_opt(2024, 6, 1);
        db.rfid_tags().update(&tag).await.unwrap();
        assert_eq!(db.rfid_tags().list().await.unwrap(), vec![tag.clone()]);

        db.rfid_tags().delete(&tag.id).await.unwrap();
        assert!(db.rfid_tags().get_by_id(&tag.id).await.unwrap().is_none());
    }
}
