//! # Stock Service
//!
//! Manual stock movements, stock levels and the user/product transaction log.
//!
//! Stock is never stored: it is the number of `entrada` rows minus the number
//! of `salida` rows for a product. Quantity is recorded but does not count.

use almacen_core::stock::ProductStock;
use almacen_core::{
    MovementType, NewStockMovement, NewTransaction, StockLevel, StockMovement,
    StockMovementDetail, Transaction, TransactionDetail,
};
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::Almacen;

/// Movement fields as submitted; the type is free text until parsed.
#[derive(Debug, Clone)]
pub struct MovementForm {
    pub product_id: String,
    pub nfc_tag_id: Option<String>,
    pub quantity: i64,
    /// `"entrada"` or `"salida"`.
    pub movement_type: String,
    pub description: Option<String>,
}

impl MovementForm {
    fn parse(self) -> ServiceResult<NewStockMovement> {
        let movement_type: MovementType = self.movement_type.parse()?;

        Ok(NewStockMovement {
            product_id: self.product_id,
            nfc_tag_id: self.nfc_tag_id,
            quantity: self.quantity,
            movement_type,
            description: self.description,
        })
    }
}

impl Almacen {
    // =========================================================================
    // Movements
    // =========================================================================

    /// Records a manual movement.
    pub async fn record_movement(&self, form: MovementForm) -> ServiceResult<StockMovement> {
        let new = form.parse()?;
        let movement = self.db.stock().record_movement(&new).await?;

        info!(
            id = %movement.id,
            product_id = %movement.product_id,
            movement_type = %movement.movement_type,
            "Stock movement recorded"
        );
        Ok(movement)
    }

    pub async fn get_movement(&self, id: &str) -> ServiceResult<StockMovement> {
        self.db
            .stock()
            .get_movement(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("StockMovement", id))
    }

    pub async fn movements_for_product(&self, product_id: &str) -> ServiceResult<Vec<StockMovement>> {
        Ok(self.db.stock().movements_for_product(product_id).await?)
    }

    /// All movements with their product names.
    pub async fn list_movements(&self) -> ServiceResult<Vec<StockMovementDetail>> {
        Ok(self.db.stock().list_movements().await?)
    }

    // =========================================================================
    // Levels
    // =========================================================================

    /// Current stock of a product.
    pub async fn product_stock(&self, product_id: &str) -> ServiceResult<StockLevel> {
        Ok(self.db.stock().stock_for(product_id).await?)
    }

    /// Stock for every product, including those never moved.
    pub async fn stock_report(&self) -> ServiceResult<Vec<ProductStock>> {
        Ok(self.db.stock().stock_report().await?)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Logs that a user interacted with a product.
    pub async fn log_transaction(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> ServiceResult<Transaction> {
        let new = NewTransaction {
            user_id: user_id.to_string(),
            product_id: product_id.to_string(),
        };
        let transaction = self.db.transactions().create(&new).await?;

        info!(id = %transaction.id, user_id = %user_id, product_id = %product_id, "Transaction logged");
        Ok(transaction)
    }

    pub async fn get_transaction(&self, id: &str) -> ServiceResult<TransactionDetail> {
        self.db
            .transactions()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Transaction", id))
    }

    pub async fn list_transactions(&self) -> ServiceResult<Vec<TransactionDetail>> {
        Ok(self.db.transactions().list().await?)
    }

    pub async fn transactions_for_user(&self, user_id: &str) -> ServiceResult<Vec<TransactionDetail>> {
        Ok(self.db.transactions().list_by_user(user_id).await?)
    }

    pub async fn transactions_for_product(
        &self,
        product_id: &str,
    ) -> ServiceResult<Vec<TransactionDetail>> {
        Ok(self.db.transactions().list_by_product(product_id).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing::almacen;
    use crate::services::{CategoryForm, ProductForm, UserForm};
    use almacen_core::Product;

    async fn product(svc: &Almacen, name: &str) -> Product {
        let cat = match svc.list_categories().await.unwrap().into_iter().next() {
            Some(cat) => cat,
            None => svc
                .create_category(CategoryForm {
                    name: "Abarrotes".to_string(),
                    image: None,
                })
                .await
                .unwrap(),
        };

        svc.create_product(ProductForm {
            name: name.to_string(),
            price_cents: 1_000,
            description: String::new(),
            category_id: cat.id,
            image: None,
        })
        .await
        .unwrap()
    }

    fn movement(product: &Product, kind: &str, quantity: i64) -> MovementForm {
        MovementForm {
            product_id: product.id.clone(),
            nfc_tag_id: None,
            quantity,
            movement_type: kind.to_string(),
            description: Some("conteo".to_string()),
        }
    }

    #[tokio::test]
    async fn test_stock_counts_movements_not_quantities() {
        let (svc, _media) = almacen().await;
        let p = product(&svc, "Harina").await;

        svc.record_movement(movement(&p, "entrada", 10)).await.unwrap();
        svc.record_movement(movement(&p, "entrada", 1)).await.unwrap();
        svc.record_movement(movement(&p, "salida", 7)).await.unwrap();

        let level = svc.product_stock(&p.id).await.unwrap();
        assert_eq!(level, StockLevel { entradas: 2, salidas: 1 });
        assert_eq!(level.stock(), 1);
    }

    #[tokio::test]
    async fn test_unknown_movement_type() {
        let (svc, _media) = almacen().await;
        let p = product(&svc, "Sal").await;

        let err = svc.record_movement(movement(&p, "ajuste", 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(svc.movements_for_product(&p.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_quantity_rejected() {
        let (svc, _media) = almacen().await;
        let p = product(&svc, "Sal").await;

        let err = svc.record_movement(movement(&p, "entrada", 0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_stock_report_and_details() {
        let (svc, _media) = almacen().await;
        let moved = product(&svc, "Aceite").await;
        let idle = product(&svc, "Vinagre").await;

        svc.record_movement(movement(&moved, "salida", 3)).await.unwrap();

        let report = svc.stock_report().await.unwrap();
        let find = |id: &str| report.iter().find(|r| r.product_id == id).unwrap();
        assert_eq!(find(moved.id.as_str()).stock(), -1);
        assert_eq!(find(idle.id.as_str()).stock(), 0);

        let details = svc.list_movements().await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].to_string(), "salida - Aceite - 3");

        let fetched = svc.get_movement(&details[0].movement.id).await.unwrap();
        assert_eq!(fetched, details[0].movement);
    }

    #[tokio::test]
    async fn test_transactions_protect_user_and_product() {
        let (svc, _media) = almacen().await;
        let p = product(&svc, "Café americano").await;
        let user = svc
            .create_user(UserForm {
                name: "Elena".to_string(),
                email: "elena@almacen.test".to_string(),
                password: "secreto".to_string(),
                image: None,
            })
            .await
            .unwrap();

        let tx = svc.log_transaction(&user.id, &p.id).await.unwrap();
        let detail = svc.get_transaction(&tx.id).await.unwrap();
        assert_eq!(detail.to_string(), "Elena - Café americano");
        assert_eq!(svc.transactions_for_user(&user.id).await.unwrap().len(), 1);
        assert_eq!(svc.transactions_for_product(&p.id).await.unwrap().len(), 1);

        assert_eq!(
            svc.delete_user(&user.id).await.unwrap_err().code,
            ErrorCode::ReferentialIntegrity
        );
        assert_eq!(
            svc.delete_product(&p.id).await.unwrap_err().code,
            ErrorCode::ReferentialIntegrity
        );
    }

    #[tokio::test]
    async fn test_transaction_with_missing_user() {
        let (svc, _media) = almacen().await;
        let p = product(&svc, "Té").await;

        let err = svc
            .log_transaction(&almacen_db::generate_id(), &p.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ReferenceError);
        assert!(svc.list_transactions().await.unwrap().is_empty());
    }
}
