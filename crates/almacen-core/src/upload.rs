//! # Upload Paths
//!
//! Stored file names for entity images.
//!
//! ## Naming Scheme
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product "Café Molido 500g" uploads "IMG_2041.jpeg"                     │
//! │                                                                         │
//! │   namespace   slug(name)           suffix     extension                │
//! │   ─────────   ────────────────     ────────   ─────────                │
//! │   imagenes /  cafe-molido-500g  -  9f2c01ab . jpeg                     │
//! │                                                                         │
//! │  Two products named "Café Molido 500g" get different suffixes, so      │
//! │  concurrent uploads never overwrite each other.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`upload_path`] is pure: the same (name, suffix, file name) always yields
//! the same path. [`generate_upload_path`] draws the suffix from a UUID v4.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Number of hex characters in the random suffix.
pub const SUFFIX_LEN: usize = 8;

// =============================================================================
// Namespace
// =============================================================================

/// Storage directory per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadNamespace {
    Categories,
    Products,
    Users,
}

impl UploadNamespace {
    /// Directory name inside the media root.
    pub const fn dir(&self) -> &'static str {
        match self {
            UploadNamespace::Categories => "categories_images",
            UploadNamespace::Products => "imagenes",
            UploadNamespace::Users => "users_images",
        }
    }
}

impl fmt::Display for UploadNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

// =============================================================================
// Suffix
// =============================================================================

/// Eight lowercase hex characters that disambiguate same-named uploads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UploadSuffix(String);

impl UploadSuffix {
    /// Draws a fresh suffix from the first 8 hex digits of a UUID v4.
    pub fn random() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        UploadSuffix(hex[..SUFFIX_LEN].to_string())
    }

    /// Accepts an existing suffix (e.g. one read back from a stored path).
    pub fn parse(s: &str) -> ValidationResult<Self> {
        let valid = s.len() == SUFFIX_LEN
            && s.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));

        if !valid {
            return Err(ValidationError::invalid_format(
                "upload_suffix",
                "must be 8 lowercase hex characters",
            ));
        }

        Ok(UploadSuffix(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UploadSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Slug
// =============================================================================

/// Folds accented Latin letters to their ASCII base letter.
fn fold_latin(c: char) -> Option<char> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}

/// Turns a display name into a URL-safe slug.
///
/// - lowercased, accented Latin letters folded to ASCII
/// - other non-ASCII characters and punctuation dropped
/// - runs of whitespace and hyphens collapsed to one `-`
/// - leading/trailing `-` and `_` trimmed
///
/// ```rust
/// use almacen_core::upload::slugify;
///
/// assert_eq!(slugify("Café Molido 500g"), "cafe-molido-500g");
/// assert_eq!(slugify("  Leche -- Entera! "), "leche-entera");
/// assert_eq!(slugify("snake_case_name"), "snake_case_name");
/// ```
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii() { Some(c) } else { fold_latin(c) };
        let Some(c) = c else { continue };

        if c.is_whitespace() || c == '-' {
            pending_dash = true;
        } else if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

// =============================================================================
// Paths
// =============================================================================

/// Extension of an uploaded file name (text after the last `.`).
pub fn file_extension(filename: &str) -> ValidationResult<&str> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    match base.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Ok(ext)
        }
        _ => Err(ValidationError::invalid_format(
            "image",
            format!("file name '{}' has no usable extension", filename),
        )),
    }
}

/// Builds the stored path for an uploaded image.
///
/// ```rust
/// use almacen_core::upload::{upload_path, UploadNamespace, UploadSuffix};
///
/// let suffix = UploadSuffix::parse("0a1b2c3d").unwrap();
/// let path = upload_path(UploadNamespace::Users, "Ana Pérez", &suffix, "avatar.JPG").unwrap();
/// assert_eq!(path, "users_images/ana-perez-0a1b2c3d.JPG");
/// ```
pub fn upload_path(
    namespace: UploadNamespace,
    name: &str,
    suffix: &UploadSuffix,
    original_filename: &str,
) -> ValidationResult<String> {
    let ext = file_extension(original_filename)?;
    Ok(format!(
        "{}/{}-{}.{}",
        namespace.dir(),
        slugify(name),
        suffix,
        ext
    ))
}

/// Builds a stored path with a freshly drawn random suffix.
pub fn generate_upload_path(
    namespace: UploadNamespace,
    name: &str,
    original_filename: &str,
) -> ValidationResult<String> {
    upload_path(namespace, name, &UploadSuffix::random(), original_filename)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_dirs() {
        assert_eq!(UploadNamespace::Categories.dir(), "categories_images");
        assert_eq!(UploadNamespace::Products.dir(), "imagenes");
        assert_eq!(UploadNamespace::Users.dir(), "users_images");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Bebidas"), "bebidas");
        assert_eq!(slugify("Niño & Niña"), "nino-nina");
        assert_eq!(slugify("Azúcar   Morena"), "azucar-morena");
        assert_eq!(slugify("-_hola_-"), "hola");
        assert_eq!(slugify("100% Jugo"), "100-jugo");
        assert_eq!(slugify("日本"), "");
    }

    #[test]
    fn test_upload_path_is_pure() {
        let suffix = UploadSuffix::parse("deadbeef").unwrap();
        let a = upload_path(UploadNamespace::Products, "Coca Cola", &suffix, "x.png").unwrap();
        let b = upload_path(UploadNamespace::Products, "Coca Cola", &suffix, "y.png").unwrap();
        assert_eq!(a, "imagenes/coca-cola-deadbeef.png");
        assert_eq!(a, b);
    }

    #[test]
    fn test_extension_from_last_dot() {
        assert_eq!(file_extension("foto.final.webp").unwrap(), "webp");
        assert_eq!(file_extension("dir.v2/foto.png").unwrap(), "png");
        assert!(file_extension("sin_extension").is_err());
        assert!(file_extension("punto.").is_err());
        assert!(file_extension("dir.v2/foto").is_err());
    }

    #[test]
    fn test_suffix_parsing() {
        assert!(UploadSuffix::parse("0123abcd").is_ok());
        assert!(UploadSuffix::parse("0123ABCD").is_err());
        assert!(UploadSuffix::parse("0123abc").is_err());
        assert!(UploadSuffix::parse("0123abcg").is_err());
    }

    #[test]
    fn test_random_suffix_shape() {
        let suffix = UploadSuffix::random();
        assert!(UploadSuffix::parse(suffix.as_str()).is_ok());
    }

    #[test]
    fn test_same_name_uploads_do_not_collide() {
        let a = generate_upload_path(UploadNamespace::Categories, "Lácteos", "a.png").unwrap();
        let b = generate_upload_path(UploadNamespace::Categories, "Lácteos", "a.png").unwrap();

        let suffix_of = |p: &str| {
            p.trim_end_matches(".png")
                .rsplit('-')
                .next()
                .unwrap()
                .to_string()
        };
        assert!(a.starts_with("categories_images/lacteos-"));
        assert_ne!(suffix_of(&a), suffix_of(&b));
        assert_ne!(a, b);
    }
}
