//! # Product Image Normalization
//!
//! Every product save that carries an image rewrites the stored file:
//!
//! - images with an alpha channel (or any non 8-bit RGB/gray layout) become
//!   8-bit RGB; palette images decode to RGB already
//! - if either side exceeds the limit, the image is scaled down to fit inside
//!   a `limit x limit` box, aspect ratio preserved
//! - the result is encoded in the format named by the path's extension
//!
//! Images already inside the limit are never enlarged.

use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::info;

use crate::blob::BlobStore;
use crate::error::{MediaError, MediaResult};

/// Longest allowed side, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 800;

/// A normalized image and what was done to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Color layout was converted to RGB.
    pub converted: bool,
    /// Dimensions were reduced.
    pub resized: bool,
}

/// Output format for a stored path, from its extension.
pub fn format_for_path(path: &str) -> MediaResult<ImageFormat> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension)
        .ok_or_else(|| MediaError::UnsupportedFormat(path.to_string()))
}

/// Normalizes image bytes destined for `path`.
pub fn normalize_image(path: &str, bytes: &[u8], max_dimension: u32) -> MediaResult<Normalized> {
    let format = format_for_path(path)?;

    let img = image::load_from_memory(bytes).map_err(|e| MediaError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    let (img, converted) = match img.color() {
        ColorType::Rgb8 | ColorType::L8 => (img, false),
        _ => (DynamicImage::ImageRgb8(img.to_rgb8()), true),
    };

    let resized = img.width() > max_dimension || img.height() > max_dimension;
    let img = if resized {
        img.resize(max_dimension, max_dimension, FilterType::Lanczos3)
    } else {
        img
    };

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).map_err(|e| MediaError::Encode {
        path: path.to_string(),
        reason: e.to_string(),
    })?;

    Ok(Normalized {
        bytes: out.into_inner(),
        width: img.width(),
        height: img.height(),
        converted,
        resized,
    })
}

/// Reads the blob at `path`, normalizes it and writes it back in place.
pub fn normalize_stored(
    store: &dyn BlobStore,
    path: &str,
    max_dimension: u32,
) -> MediaResult<Normalized> {
    let original = store.get(path)?;
    let normalized = normalize_image(path, &original, max_dimension)?;
    store.put(path, &normalized.bytes)?;

    info!(
        path = %path,
        width = normalized.width,
        height = normalized.height,
        converted = normalized.converted,
        resized = normalized.resized,
        "Normalized product image"
    );

    Ok(normalized)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::MemoryBlobStore;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn rgba_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 128]));
        encode(DynamicImage::ImageRgba8(img), ImageFormat::Png)
    }

    fn decode(bytes: &[u8]) -> DynamicImage {
        image::load_from_memory(bytes).unwrap()
    }

    #[test]
    fn test_large_alpha_image_is_converted_and_downscaled() {
        let result = normalize_image("imagenes/a-0a1b2c3d.png", &rgba_png(1600, 1200), 800).unwrap();

        assert!(result.converted);
        assert!(result.resized);
        assert_eq!((result.width, result.height), (800, 600));

        let stored = decode(&result.bytes);
        assert_eq!(stored.color(), ColorType::Rgb8);
        assert_eq!((stored.width(), stored.height()), (800, 600));
    }

    #[test]
    fn test_aspect_ratio_preserved_on_tall_image() {
        let result = normalize_image("imagenes/t.png", &rgba_png(300, 2000), 800).unwrap();
        assert_eq!((result.width, result.height), (120, 800));
    }

    #[test]
    fn test_small_rgb_image_keeps_size() {
        let img = RgbImage::from_pixel(120, 80, Rgb([10, 200, 10]));
        let bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Png);

        let result = normalize_image("imagenes/s.png", &bytes, 800).unwrap();
        assert!(!result.converted);
        assert!(!result.resized);
        assert_eq!((result.width, result.height), (120, 80));
    }

    #[test]
    fn test_grayscale_is_kept() {
        let img = GrayImage::from_pixel(900, 900, Luma([90]));
        let bytes = encode(DynamicImage::ImageLuma8(img), ImageFormat::Png);

        let result = normalize_image("imagenes/g.png", &bytes, 800).unwrap();
        assert!(!result.converted);
        assert_eq!(decode(&result.bytes).color(), ColorType::L8);
        assert_eq!((result.width, result.height), (800, 800));
    }

    #[test]
    fn test_alpha_source_can_be_stored_as_jpeg() {
        let result = normalize_image("imagenes/foto.JPG", &rgba_png(64, 64), 800).unwrap();
        assert!(result.converted);
        assert_eq!(
            image::guess_format(&result.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_unknown_extension() {
        let err = normalize_image("imagenes/notas.txt", &rgba_png(10, 10), 800).unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_garbage_bytes() {
        let err = normalize_image("imagenes/roto.png", b"not an image", 800).unwrap_err();
        assert!(matches!(err, MediaError::Decode { .. }));
    }

    #[test]
    fn test_normalize_stored_rewrites_in_place() {
        let store = MemoryBlobStore::new();
        let path = "imagenes/cafe-0a1b2c3d.png";
        store.put(path, &rgba_png(2000, 1000)).unwrap();

        let result = normalize_stored(&store, path, DEFAULT_MAX_DIMENSION).unwrap();
        assert_eq!((result.width, result.height), (800, 400));

        let stored = decode(&store.get(path).unwrap());
        assert_eq!((stored.width(), stored.height()), (800, 400));
        assert_eq!(stored.color(), ColorType::Rgb8);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_normalize_stored_missing_blob() {
        let store = MemoryBlobStore::new();
        let err = normalize_stored(&store, "imagenes/nada.png", 800).unwrap_err();
        assert!(matches!(err, MediaError::NotFound(_)));
    }
}
