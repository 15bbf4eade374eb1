//! # Blob Storage
//!
//! Byte storage keyed by relative upload paths such as
//! `imagenes/arroz-9f2c01ab.png`.
//!
//! ## Implementations
//! ```text
//! ┌──────────────────────────┐      ┌──────────────────────────┐
//! │      FsBlobStore         │      │     MemoryBlobStore      │
//! │                          │      │                          │
//! │  <root>/imagenes/...     │      │  RwLock<HashMap<path,    │
//! │  <root>/users_images/... │      │          Vec<u8>>>       │
//! │  (production media dir)  │      │  (tests)                 │
//! └──────────────────────────┘      └──────────────────────────┘
//! ```

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Byte storage addressed by relative paths.
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `path`, replacing any previous blob.
    fn put(&self, path: &str, bytes: &[u8]) -> MediaResult<()>;

    /// Reads the blob at `path`.
    fn get(&self, path: &str) -> MediaResult<Vec<u8>>;

    /// Removes the blob at `path`. Returns false when nothing was stored.
    fn delete(&self, path: &str) -> MediaResult<bool>;

    fn exists(&self, path: &str) -> MediaResult<bool>;
}

/// Rejects empty, absolute and parent-escaping paths.
fn check_relative(path: &str) -> MediaResult<&Path> {
    let rel = Path::new(path);
    let clean = !path.is_empty()
        && rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    if clean {
        Ok(rel)
    } else {
        Err(MediaError::InvalidPath(path.to_string()))
    }
}

// =============================================================================
// Filesystem
// =============================================================================

/// Blob store rooted at a media directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Creates a store under `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsBlobStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a blob.
    pub fn resolve(&self, path: &str) -> MediaResult<PathBuf> {
        Ok(self.root.join(check_relative(path)?))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, path: &str, bytes: &[u8]) -> MediaResult<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!(path = %path, size = bytes.len(), "Writing blob");
        fs::write(&full, bytes)?;
        Ok(())
    }

    fn get(&self, path: &str) -> MediaResult<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MediaError::NotFound(path.to_string()),
            _ => MediaError::Io(e),
        })
    }

    fn delete(&self, path: &str) -> MediaResult<bool> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full) {
            Ok(()) => {
                debug!(path = %path, "Deleted blob");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MediaError::Io(e)),
        }
    }

    fn exists(&self, path: &str) -> MediaResult<bool> {
        Ok(self.resolve(path)?.is_file())
    }
}

// =============================================================================
// Memory
// =============================================================================

/// Blob store held in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Stored paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, path: &str, bytes: &[u8]) -> MediaResult<()> {
        check_relative(path)?;
        self.blobs.write().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, path: &str) -> MediaResult<Vec<u8>> {
        self.blobs
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| MediaError::NotFound(path.to_string()))
    }

    fn delete(&self, path: &str) -> MediaResult<bool> {
        Ok(self.blobs.write().remove(path).is_some())
    }

    fn exists(&self, path: &str) -> MediaResult<bool> {
        Ok(self.blobs.read().contains_key(path))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(store: &dyn BlobStore) {
        let path = "categories_images/bebidas-0a1b2c3d.png";

        assert!(!store.exists(path).unwrap());
        assert!(matches!(store.get(path), Err(MediaError::NotFound(_))));

        store.put(path, b"first").unwrap();
        store.put(path, b"second").unwrap();
        assert!(store.exists(path).unwrap());
        assert_eq!(store.get(path).unwrap(), b"second");

        assert!(store.delete(path).unwrap());
        assert!(!store.delete(path).unwrap());
        assert!(!store.exists(path).unwrap());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryBlobStore::new();
        exercise(&store);
        assert!(store.is_empty());
    }

    #[test]
    fn test_fs_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp_dir.path());
        exercise(&store);
    }

    #[test]
    fn test_fs_store_creates_namespace_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(temp_dir.path().join("media"));

        store.put("users_images/ana-0a1b2c3d.jpg", b"jpeg").unwrap();
        assert!(temp_dir
            .path()
            .join("media/users_images/ana-0a1b2c3d.jpg")
            .is_file());
    }

    #[test]
    fn test_paths_must_stay_inside_root() {
        let store = MemoryBlobStore::new();
        for bad in ["", "../escape.png", "/etc/passwd", "imagenes/../../x.png"] {
            assert!(
                matches!(store.put(bad, b"x"), Err(MediaError::InvalidPath(_))),
                "accepted {bad:?}"
            );
        }

        let fs_store = FsBlobStore::new("/tmp/almacen-media");
        assert!(fs_store.resolve("../x.png").is_err());
        assert_eq!(
            fs_store.resolve("imagenes/a.png").unwrap(),
            PathBuf::from("/tmp/almacen-media/imagenes/a.png")
        );
    }

    #[test]
    fn test_memory_paths_sorted() {
        let store = MemoryBlobStore::new();
        store.put("imagenes/b.png", b"b").unwrap();
        store.put("imagenes/a.png", b"a").unwrap();
        assert_eq!(store.paths(), vec!["imagenes/a.png", "imagenes/b.png"]);
        assert_eq!(store.len(), 2);
    }
}
