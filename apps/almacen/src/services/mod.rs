//! # Services
//!
//! Operations on [`Almacen`](crate::Almacen), grouped by area. Each file adds
//! an `impl Almacen` block.
//!
//! ## Uploads
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ImageUpload { filename: "Foto Café.PNG", bytes }                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  generate_upload_path(ns, entity name, filename)                        │
//! │         │     → "imagenes/cafe-molido-9f2c01ab.PNG"                     │
//! │         ▼                                                               │
//! │  BlobStore::put  (blocking pool)                                        │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  row written ── failure? ──► blob removed again                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Blob I/O and image work run on tokio's blocking pool.

pub mod catalog;
pub mod stock;
pub mod tags;
pub mod users;

use almacen_core::upload::{generate_upload_path, UploadNamespace};
use almacen_media::normalize_stored;
use tracing::{debug, warn};

use crate::error::ServiceResult;
use crate::Almacen;

pub use catalog::{CategoryForm, ProductForm};
pub use stock::MovementForm;
pub use users::UserForm;

/// An uploaded image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Client-side file name; only its extension is kept.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        ImageUpload {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

impl Almacen {
    /// Stores an upload under a fresh `<ns>/<slug>-<8hex>.<ext>` path.
    pub(crate) async fn store_upload(
        &self,
        namespace: UploadNamespace,
        name: &str,
        upload: &ImageUpload,
    ) -> ServiceResult<String> {
        let path = generate_upload_path(namespace, name, &upload.filename)?;

        let media = self.media.clone();
        let bytes = upload.bytes.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || media.put(&target, &bytes)).await??;

        debug!(path = %path, size = upload.bytes.len(), "Stored upload");
        Ok(path)
    }

    /// Stores the upload if there is one.
    pub(crate) async fn store_optional_upload(
        &self,
        namespace: UploadNamespace,
        name: &str,
        upload: Option<&ImageUpload>,
    ) -> ServiceResult<Option<String>> {
        match upload {
            Some(upload) => Ok(Some(self.store_upload(namespace, name, upload).await?)),
            None => Ok(None),
        }
    }

    /// Removes a blob. Failures are logged, not returned.
    pub(crate) async fn discard_blob(&self, path: &str) {
        let media = self.media.clone();
        let target = path.to_string();

        match tokio::task::spawn_blocking(move || media.delete(&target)).await {
            Ok(Ok(_)) => debug!(path = %path, "Removed blob"),
            Ok(Err(e)) => warn!(path = %path, error = %e, "Failed to remove blob"),
            Err(e) => warn!(path = %path, error = %e, "Blob removal task failed"),
        }
    }

    /// Removes the blob when present.
    pub(crate) async fn discard_optional_blob(&self, path: Option<&str>) {
        if let Some(path) = path {
            self.discard_blob(path).await;
        }
    }

    /// Rewrites a stored product image to RGB within the size limit.
    pub(crate) async fn normalize_product_image(&self, path: &str) -> ServiceResult<()> {
        let media = self.media.clone();
        let target = path.to_string();
        let max = self.max_image_dimension;

        tokio::task::spawn_blocking(move || normalize_stored(media.as_ref(), &target, max))
            .await??;
        Ok(())
    }
}

// =============================================================================
// Test Support
// =============================================================================
