//! # almacen-media: Image Storage for Almacen
//!
//! Blob storage for uploaded images and the product picture normalizer.
//!
//! ## Flow on a Product Save
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  upload bytes ──► BlobStore::put("imagenes/arroz-9f2c01ab.png")        │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                   normalize_stored(store, path, 800)                   │
//! │                          │                                              │
//! │              ┌───────────┴───────────┐                                  │
//! │              ▼                       ▼                                  │
//! │      alpha/palette → RGB     longest side > 800 → downscale            │
//! │              └───────────┬───────────┘                                  │
//! │                          ▼                                              │
//! │              BlobStore::put(same path, re-encoded bytes)               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is synchronous; async callers run it on a blocking
//! worker (`tokio::task::spawn_blocking`).
//!
//! ## Module Organization
//!
//! - [`blob`] - `BlobStore` trait, filesystem and memory stores
//! - [`normalize`] - RGB conversion and aspect-preserving downscale
//! - [`error`] - `MediaError`

pub mod blob;
pub mod error;
pub mod normalize;

pub use blob::{BlobStore, FsBlobStore, MemoryBlobStore};
pub use error::{MediaError, MediaResult};
pub use normalize::{normalize_image, normalize_stored, Normalized, DEFAULT_MAX_DIMENSION};
