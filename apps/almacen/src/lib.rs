//! # Almacen Library
//!
//! Service layer for the Almacen inventory: combines the SQLite store, the
//! media store and configuration behind one facade.
//!
//! ## Module Organization
//! ```text
//! almacen/
//! ├── lib.rs          ◄─── You are here (facade, startup, logging)
//! ├── config.rs       ◄─── almacen.toml + ALMACEN_* overrides
//! ├── error.rs        ◄─── ServiceError returned by every operation
//! └── services/
//!     ├── mod.rs      ◄─── Upload helpers shared by services
//!     ├── catalog.rs  ◄─── Categories and products (image resize)
//!     ├── users.rs    ◄─── Users
//!     ├── tags.rs     ◄─── RFID and NFC tags
//!     └── stock.rs    ◄─── Movements, stock levels, transactions
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. AppConfig::load ── defaults → almacen.toml → ALMACEN_* env          │
//! │  2. init_tracing ───── RUST_LOG, else [logging] filter, else default    │
//! │  3. Almacen::open ──── SQLite (WAL, migrations) + FsBlobStore           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod services;

use std::sync::Arc;

use almacen_db::Database;
use almacen_media::{BlobStore, FsBlobStore};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

pub use config::AppConfig;
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use services::ImageUpload;

/// Entry point for all inventory operations.
///
/// Cheap to clone; the pool and the blob store are shared.
#[derive(Clone)]
pub struct Almacen {
    db: Database,
    media: Arc<dyn BlobStore>,
    max_image_dimension: u32,
}

impl Almacen {
    /// Wraps an open database and a media store.
    pub fn new(db: Database, media: Arc<dyn BlobStore>, max_image_dimension: u32) -> Self {
        Almacen {
            db,
            media,
            max_image_dimension,
        }
    }

    /// Opens the database and the filesystem media store from config.
    pub async fn open(config: &AppConfig) -> ServiceResult<Self> {
        info!(
            path = %config.database.path.display(),
            media = %config.media.root.display(),
            "Opening almacen"
        );

        if let Some(parent) = config.database.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ServiceError::internal(format!("Failed to create data directory: {}", e))
                })?;
            }
        }

        let db = Database::new(config.db_config()).await?;
        let media: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&config.media.root));

        Ok(Almacen::new(db, media, config.media.max_image_dimension))
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn media(&self) -> &Arc<dyn BlobStore> {
        &self.media
    }

    /// Longest side allowed for stored product images.
    pub fn max_image_dimension(&self) -> u32 {
        self.max_image_dimension
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins over `filter`. Calling this twice is harmless.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .try_init();
}
