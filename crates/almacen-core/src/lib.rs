//! # almacen-core: Pure Domain Logic for Almacen
//!
//! This crate holds the inventory schema and the business rules that do not
//! need a database: entity types, field validation, prices, upload
//! file naming and the stock formula.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Almacen Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/almacen (service facade)                │   │
//! │  │    create_nfc_tag, save_product, stock_report, ...              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ almacen-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   stock   │  │  upload   │  │ validation│  │   │
//! │  │   │  Product  │  │StockLevel │  │ slugify   │  │   rules   │  │   │
//! │  │   │  NfcTag   │  │  entrada  │  │ namespace │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO FILES • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          almacen-db (SQLite)   •   almacen-media (blobs)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Category, Product, User, tags, movements)
//! - [`price`] - Integer-cent product prices
//! - [`stock`] - Stock derived from movement history
//! - [`upload`] - Deterministic upload paths for entity images
//! - [`error`] - Domain error types
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use almacen_core::price::Price;
//! use almacen_core::upload::{upload_path, UploadNamespace, UploadSuffix};
//!
//! let price: Price = "12.50".parse().unwrap();
//! assert_eq!(price.cents(), 1250);
//!
//! let suffix = UploadSuffix::parse("1a2b3c4d").unwrap();
//! let path = upload_path(UploadNamespace::Products, "Coca Cola", &suffix, "foto.png").unwrap();
//! assert_eq!(path, "imagenes/coca-cola-1a2b3c4d.png");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod price;
pub mod stock;
pub mod types;
pub mod upload;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use price::Price;
pub use stock::{ProductStock, StockLevel};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of entity names (category, product, user).
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of tag ids, device ids and tag status strings.
pub const MAX_TAG_FIELD_LEN: usize = 50;

/// Maximum length of a user password.
pub const MAX_PASSWORD_LEN: usize = 50;

/// Largest storable price: 10 digits with 2 decimal places (99,999,999.99).
pub const MAX_PRICE_CENTS: i64 = 9_999_999_999;

/// Description written on movements created by NFC tag assignment.
pub const NFC_ASSIGNMENT_DESCRIPTION: &str = "Asignación automática de etiqueta NFC al producto";
