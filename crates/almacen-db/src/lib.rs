//! # almacen-db
//!
//! Inventory tables in SQLite. One repository per entity; stock is read
//! from movements, never stored.
//!
//! ```text
//!   Database ─┬─ categories()   delete blocked while products exist
//!             ├─ products()     delete blocked while movements or sales exist
//!             ├─ users()        delete blocked while sales exist
//!             ├─ rfid_tags()    standalone reader log
//!             ├─ nfc_tags()     create + entrada in one transaction
//!             ├─ stock()        movements, entradas − salidas per product
//!             └─ transactions() sale log (user × product)
//! ```
//!
//! ```rust,ignore
//! use almacen_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("almacen.db")).await?;
//! let created = db.nfc_tags().create(&new_tag).await?;
//! let level = db.stock().stock_for(&created.tag.product_id.unwrap()).await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::nfc::{NfcTagCreated, NfcTagRepository};
pub use repository::product::ProductRepository;
pub use repository::rfid::RfidTagRepository;
pub use repository::stock::StockRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::user::UserRepository;

/// Fresh row id (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
