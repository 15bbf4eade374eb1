//! # Domain Types
//!
//! The inventory schema shared by every crate in the workspace.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Inventory Schema                                │
//! │                                                                         │
//! │  ┌────────────┐ PROTECT ┌────────────┐ SET NULL ┌────────────┐         │
//! │  │  Category  │◄────────│  Product   │◄─────────│   NfcTag   │         │
//! │  └────────────┘         └─────┬──────┘          └─────┬──────┘         │
//! │                          ▲    ▲ PROTECT               │ SET NULL       │
//! │                 PROTECT  │    │                       │                │
//! │  ┌────────────┐   ┌──────┴────┴──┐           ┌────────▼───────┐        │
//! │  │    User    │◄──│ Transaction  │           │ StockMovement  │        │
//! │  └────────────┘   └──────────────┘           │ (→ Product,    │        │
//! │        PROTECT                               │    PROTECT)    │        │
//! │                                              └────────────────┘        │
//! │  ┌────────────┐                                                        │
//! │  │  RfidTag   │  (tracked on its own, no product link)                 │
//! │  └────────────┘                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity has an `id`: UUID v4 string assigned at creation. Tags also
//! carry the physical `tag_id` read from the chip, which is unique.
//!
//! A product's stock is NOT a field here: it is derived from its movements
//! (see [`crate::stock`]).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::price::Price;
use crate::validation::{self, ValidationResult};

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Relative blob path under `categories_images/`.
    pub image_path: Option<String>,
}

impl Category {
    /// Checks the editable fields before an update.
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("name", &self.name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub image_path: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("name", &self.name)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product tracked in the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Relative blob path under `imagenes/`.
    pub image_path: Option<String>,
    /// Price in cents.
    pub price_cents: i64,
    pub description: String,
    /// Owning category (protect-on-delete).
    pub category_id: String,
}

impl Product {
    /// The price, if `price_cents` is in range.
    pub fn price(&self) -> ValidationResult<Price> {
        Price::from_cents(self.price_cents)
    }

    /// Checks the editable fields before an update.
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("name", &self.name)?;
        validation::validate_price_cents(self.price_cents)?;
        validation::validate_uuid("category_id", &self.category_id)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub image_path: Option<String>,
    pub price_cents: i64,
    pub description: String,
    pub category_id: String,
}

impl NewProduct {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("name", &self.name)?;
        validation::validate_price_cents(self.price_cents)?;
        validation::validate_uuid("category_id", &self.category_id)
    }
}

// =============================================================================
// User
// =============================================================================

/// A person interacting with products.
///
/// The password is stored as given; it is never serialized outwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Relative blob path under `users_images/`.
    pub image_path: Option<String>,
}

impl User {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("name", &self.name)?;
        validation::validate_email(&self.email)?;
        validation::validate_password(&self.password)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub image_path: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_name("name", &self.name)?;
        validation::validate_email(&self.email)?;
        validation::validate_password(&self.password)
    }
}

// =============================================================================
// RFID Tag
// =============================================================================

/// An RFID tag, read by an ESP32 reader. Not linked to products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RfidTag {
    pub id: String,
    /// Physical tag identifier (unique).
    pub tag_id: String,
    /// Reader device the tag was seen by.
    pub device_id: Option<String>,
    pub status: Option<String>,
    pub arrived_on: Option<NaiveDate>,
    pub assigned_on: Option<NaiveDate>,
}

impl RfidTag {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_tag_id(&self.tag_id)?;
        validation::validate_optional_tag_field("device_id", self.device_id.as_deref())?;
        validation::validate_optional_tag_field("status", self.status.as_deref())
    }
}

impl fmt::Display for RfidTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag_id)
    }
}

/// Input for registering an RFID tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRfidTag {
    pub tag_id: String,
    pub device_id: Option<String>,
    pub status: Option<String>,
    pub arrived_on: Option<NaiveDate>,
    pub assigned_on: Option<NaiveDate>,
}

impl NewRfidTag {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_tag_id(&self.tag_id)?;
        validation::validate_optional_tag_field("device_id", self.device_id.as_deref())?;
        validation::validate_optional_tag_field("status", self.status.as_deref())
    }
}

// =============================================================================
// NFC Tag
// =============================================================================

/// An NFC tag, optionally bound to a product.
///
/// Binding at creation time books one `entrada` for that product; changing
/// the binding later does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct NfcTag {
    pub id: String,
    /// Physical tag identifier (unique).
    pub tag_id: String,
    pub status: String,
    pub assigned_on: NaiveDate,
    /// Bound product; nulled when the product is deleted.
    pub product_id: Option<String>,
}

impl NfcTag {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_tag_id(&self.tag_id)?;
        validation::validate_status(&self.status)?;
        if let Some(product_id) = &self.product_id {
            validation::validate_uuid("product_id", product_id)?;
        }
        Ok(())
    }
}

impl fmt::Display for NfcTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag_id)
    }
}

/// Input for creating an NFC tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNfcTag {
    pub tag_id: String,
    pub status: String,
    pub assigned_on: NaiveDate,
    pub product_id: Option<String>,
}

impl NewNfcTag {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_tag_id(&self.tag_id)?;
        validation::validate_status(&self.status)?;
        if let Some(product_id) = &self.product_id {
            validation::validate_uuid("product_id", product_id)?;
        }
        Ok(())
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A logged user/product interaction. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub created_at: DateTime<Utc>,
}

/// Input for logging a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub user_id: String,
    pub product_id: String,
}

impl NewTransaction {
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_uuid("user_id", &self.user_id)?;
        validation::validate_uuid("product_id", &self.product_id)
    }
}

/// A transaction joined with the names of its user and product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionDetail {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub transaction: Transaction,
    pub user_name: String,
    pub product_name: String,
}

impl fmt::Display for TransactionDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.user_name, self.product_name)
    }
}

// =============================================================================
// Movement Type
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Inbound: one more unit on hand.
    Entrada,
    /// Outbound: one unit removed.
    Salida,
}

impl MovementType {
    /// All accepted values, in storage form.
    pub const ALL: [MovementType; 2] = [MovementType::Entrada, MovementType::Salida];

    /// Storage form of the value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entrada => "entrada",
            MovementType::Salida => "salida",
        }
    }

    /// Effect of one movement of this type on the stock figure.
    pub const fn sign(&self) -> i64 {
        match self {
            MovementType::Entrada => 1,
            MovementType::Salida => -1,
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entrada" => Ok(MovementType::Entrada),
            "salida" => Ok(MovementType::Salida),
            _ => Err(ValidationError::NotAllowed {
                field: "movement_type".to_string(),
                allowed: MovementType::ALL
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// One row of a product's stock history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    /// Owning product (protect-on-delete).
    pub product_id: String,
    /// Tag that caused the movement; nulled when the tag is deleted.
    pub nfc_tag_id: Option<String>,
    /// Units affected. Informational: stock counts rows, not units.
    pub quantity: i64,
    pub movement_type: MovementType,
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
}

/// Input for recording a stock movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStockMovement {
    pub product_id: String,
    pub nfc_tag_id: Option<String>,
    pub quantity: i64,
    pub movement_type: MovementType,
    pub description: Option<String>,
}

impl NewStockMovement {
    /// The movement booked when an NFC tag is created already bound to a product.
    pub fn nfc_assignment(product_id: impl Into<String>, nfc_tag_id: impl Into<String>) -> Self {
        NewStockMovement {
            product_id: product_id.into(),
            nfc_tag_id: Some(nfc_tag_id.into()),
            quantity: 1,
            movement_type: MovementType::Entrada,
            description: Some(crate::NFC_ASSIGNMENT_DESCRIPTION.to_string()),
        }
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_uuid("product_id", &self.product_id)?;
        if let Some(tag_id) = &self.nfc_tag_id {
            validation::validate_uuid("nfc_tag_id", tag_id)?;
        }
        validation::validate_quantity(self.quantity)
    }
}

/// A movement joined with its product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovementDetail {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub movement: StockMovement,
    pub product_name: String,
}

impl fmt::Display for StockMovementDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.movement.movement_type, self.product_name, self.movement.quantity
        )
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_ID: &str = "550e8400-e29b-41d4-a716-446655440000";
    const TAG_ID: &str = "6fa459ea-ee8a-3ca4-894e-db77e160355e";

    #[test]
    fn test_movement_type_parsing() {
        assert_eq!("entrada".parse::<MovementType>().unwrap(), MovementType::Entrada);
        assert_eq!("salida".parse::<MovementType>().unwrap(), MovementType::Salida);

        let err = "devolucion".parse::<MovementType>().unwrap_err();
        assert!(matches!(err, ValidationError::NotAllowed { ref field, .. } if field == "movement_type"));
        assert!("Entrada".parse::<MovementType>().is_err());
    }

    #[test]
    fn test_movement_type_serde_uses_storage_form() {
        let json = serde_json::to_string(&MovementType::Salida).unwrap();
        assert_eq!(json, "\"salida\"");
        assert!(serde_json::from_str::<MovementType>("\"ajuste\"").is_err());
    }

    #[test]
    fn test_nfc_assignment_movement() {
        let movement = NewStockMovement::nfc_assignment(PRODUCT_ID, TAG_ID);
        assert_eq!(movement.quantity, 1);
        assert_eq!(movement.movement_type, MovementType::Entrada);
        assert_eq!(movement.nfc_tag_id.as_deref(), Some(TAG_ID));
        assert_eq!(
            movement.description.as_deref(),
            Some(crate::NFC_ASSIGNMENT_DESCRIPTION)
        );
        assert!(movement.validate().is_ok());
    }

    #[test]
    fn test_display_strings() {
        let created_at = Utc::now();
        let detail = StockMovementDetail {
            movement: StockMovement {
                id: TAG_ID.to_string(),
                product_id: PRODUCT_ID.to_string(),
                nfc_tag_id: None,
                quantity: 3,
                movement_type: MovementType::Salida,
                created_at,
                description: None,
            },
            product_name: "Arroz 1kg".to_string(),
        };
        assert_eq!(detail.to_string(), "salida - Arroz 1kg - 3");

        let tx = TransactionDetail {
            transaction: Transaction {
                id: TAG_ID.to_string(),
                user_id: TAG_ID.to_string(),
                product_id: PRODUCT_ID.to_string(),
                created_at,
            },
            user_name: "Lucía".to_string(),
            product_name: "Arroz 1kg".to_string(),
        };
        assert_eq!(tx.to_string(), "Lucía - Arroz 1kg");
    }

    #[test]
    fn test_user_password_not_serialized() {
        let user = User {
            id: TAG_ID.to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "secreto".to_string(),
            image_path: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secreto"));
        assert_eq!(user.to_string(), "Ana");
    }

    #[test]
    fn test_new_product_validation() {
        let mut product = NewProduct {
            name: "Leche".to_string(),
            image_path: None,
            price_cents: 120,
            description: String::new(),
            category_id: PRODUCT_ID.to_string(),
        };
        assert!(product.validate().is_ok());

        product.price_cents = -1;
        assert!(product.validate().is_err());

        product.price_cents = 0;
        product.category_id = "not-a-uuid".to_string();
        assert!(product.validate().is_err());
    }
}
