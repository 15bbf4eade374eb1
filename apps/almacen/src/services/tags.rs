//! # Tag Service
//!
//! RFID tags (reader inventory, unlinked) and NFC tags (bound to products).
//!
//! Creating an NFC tag with a product books one `entrada` in the same
//! database transaction; see [`almacen_db::repository::nfc`].

use almacen_core::{NewNfcTag, NewRfidTag, NfcTag, RfidTag};
use almacen_db::NfcTagCreated;
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::Almacen;

impl Almacen {
    // =========================================================================
    // RFID
    // =========================================================================

    pub async fn register_rfid_tag(&self, new: NewRfidTag) -> ServiceResult<RfidTag> {
        let tag = self.db.rfid_tags().create(&new).await?;
        info!(id = %tag.id, tag_id = %tag.tag_id, "RFID tag registered");
        Ok(tag)
    }

    pub async fn get_rfid_tag(&self, id: &str) -> ServiceResult<RfidTag> {
        self.db
            .rfid_tags()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("RfidTag", id))
    }

    /// Looks a tag up by the identifier printed on it.
    pub async fn find_rfid_tag(&self, tag_id: &str) -> ServiceResult<RfidTag> {
        self.db
            .rfid_tags()
            .get_by_tag_id(tag_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("RfidTag", tag_id))
    }

    pub async fn list_rfid_tags(&self) -> ServiceResult<Vec<RfidTag>> {
        Ok(self.db.rfid_tags().list().await?)
    }

    pub async fn update_rfid_tag(&self, tag: &RfidTag) -> ServiceResult<()> {
        Ok(self.db.rfid_tags().update(tag).await?)
    }

    pub async fn delete_rfid_tag(&self, id: &str) -> ServiceResult<()> {
        Ok(self.db.rfid_tags().delete(id).await?)
    }

    // =========================================================================
    // NFC
    // =========================================================================

    /// Creates a tag; with a product, also its automatic `entrada`.
    pub async fn create_nfc_tag(&self, new: NewNfcTag) -> ServiceResult<NfcTagCreated> {
        Ok(self.db.nfc_tags().create(&new).await?)
    }

    pub async fn get_nfc_tag(&self, id: &str) -> ServiceResult<NfcTag> {
        self.db
            .nfc_tags()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("NfcTag", id))
    }

    pub async fn find_nfc_tag(&self, tag_id: &str) -> ServiceResult<NfcTag> {
        self.db
            .nfc_tags()
            .get_by_tag_id(tag_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("NfcTag", tag_id))
    }

    pub async fn list_nfc_tags(&self) -> ServiceResult<Vec<NfcTag>> {
        Ok(self.db.nfc_tags().list().await?)
    }

    pub async fn nfc_tags_for_product(&self, product_id: &str) -> ServiceResult<Vec<NfcTag>> {
        Ok(self.db.nfc_tags().list_by_product(product_id).await?)
    }

    /// Updates a tag. Never books a movement.
    pub async fn update_nfc_tag(&self, tag: &NfcTag) -> ServiceResult<()> {
        Ok(self.db.nfc_tags().update(tag).await?)
    }

    /// Binds a tag to a product, or unbinds it with `None`. Never books a movement.
    pub async fn assign_nfc_tag(
        &self,
        id: &str,
        product_id: Option<&str>,
    ) -> ServiceResult<NfcTag> {
        Ok(self.db.nfc_tags().assign_product(id, product_id).await?)
    }

    /// Deletes a tag. Its movements stay, with the tag reference cleared.
    pub async fn delete_nfc_tag(&self, id: &str) -> ServiceResult<NfcTag> {
        let tag = self.db.nfc_tags().delete(id).await?;
        info!(id = %tag.id, tag_id = %tag.tag_id, "NFC tag deleted");
        Ok(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing::almacen;
    use crate::services::{CategoryForm, ProductForm};
    use almacen_core::{MovementType, Product, NFC_ASSIGNMENT_DESCRIPTION};
    use chrono::NaiveDate;

    async fn product(svc: &Almacen) -> Product {
        let cat = svc
            .create_category(CategoryForm {
                name: "Bebidas".to_string(),
                image: None,
            })
            .await
            .unwrap();

        svc.create_product(ProductForm {
            name: "Jugo de Naranja".to_string(),
            price_cents: 2_500,
            description: String::new(),
            category_id: cat.id,
            image: None,
        })
        .await
        .unwrap()
    }

    fn nfc(tag_id: &str, product_id: Option<&str>) -> NewNfcTag {
        NewNfcTag {
            tag_id: tag_id.to_string(),
            status: "activo".to_string(),
            assigned_on: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            product_id: product_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_nfc_tag_books_entrada() {
        let (svc, _media) = almacen().await;
        let p = product(&svc).await;

        let created = svc.create_nfc_tag(nfc("04:A1:B2", Some(p.id.as_str()))).await.unwrap();
        let movement = created.movement.unwrap();

        assert_eq!(movement.movement_type, MovementType::Entrada);
        assert_eq!(movement.quantity, 1);
        assert_eq!(movement.nfc_tag_id.as_deref(), Some(created.tag.id.as_str()));
        assert_eq!(movement.description.as_deref(), Some(NFC_ASSIGNMENT_DESCRIPTION));
        assert_eq!(svc.product_stock(&p.id).await.unwrap().stock(), 1);
    }

    #[tokio::test]
    async fn test_assign_later_books_nothing() {
        let (svc, _media) = almacen().await;
        let p = product(&svc).await;

        let created = svc.create_nfc_tag(nfc("04:A1:B3", None)).await.unwrap();
        assert!(created.movement.is_none());

        let tag = svc.assign_nfc_tag(&created.tag.id, Some(p.id.as_str())).await.unwrap();
        assert_eq!(tag.product_id.as_deref(), Some(p.id.as_str()));
        assert_eq!(svc.product_stock(&p.id).await.unwrap().stock(), 0);
        assert_eq!(svc.nfc_tags_for_product(&p.id).await.unwrap(), vec![tag]);
    }

    #[tokio::test]
    async fn test_duplicate_nfc_tag_id() {
        let (svc, _media) = almacen().await;
        let p = product(&svc).await;

        svc.create_nfc_tag(nfc("04:FF", Some(p.id.as_str()))).await.unwrap();
        let err = svc.create_nfc_tag(nfc("04:FF", Some(p.id.as_str()))).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("04:FF"));
        assert_eq!(svc.product_stock(&p.id).await.unwrap().stock(), 1);
    }

    #[tokio::test]
    async fn test_delete_nfc_tag_keeps_movement() {
        let (svc, _media) = almacen().await;
        let p = product(&svc).await;

        let created = svc.create_nfc_tag(nfc("04:0D", Some(p.id.as_str()))).await.unwrap();
        svc.delete_nfc_tag(&created.tag.id).await.unwrap();

        let movements = svc.movements_for_product(&p.id).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].nfc_tag_id, None);
        assert_eq!(svc.product_stock(&p.id).await.unwrap().stock(), 1);
        assert_eq!(
            svc.find_nfc_tag("04:0D").await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }

    #[tokio::test]
    async fn test_rfid_lifecycle() {
        let (svc, _media) = almacen().await;

        let tag = svc
            .register_rfid_tag(NewRfidTag {
                tag_id: "E200-3412".to_string(),
                device_id: Some("esp32-puerta".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let found = svc.find_rfid_tag("E200-3412").await.unwrap();
        assert_eq!(found, tag);

        let mut changed = found.clone();
        changed.status = Some("leido".to_string());
        svc.update_rfid_tag(&changed).await.unwrap();
        assert_eq!(svc.get_rfid_tag(&tag.id).await.unwrap(), changed);

        let err = svc
            .register_rfid_tag(NewRfidTag {
                tag_id: "E200-3412".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        svc.delete_rfid_tag(&tag.id).await.unwrap();
        assert!(svc.list_rfid_tags().await.unwrap().is_empty());
    }
}
