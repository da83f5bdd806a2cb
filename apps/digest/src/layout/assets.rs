//! Asset resolution: turns a local image reference into an embeddable image.
//!
//! Every failure (missing file, unreadable file, bytes that are not an image)
//! comes back as an `AssetError`. The layout engine matches on the result and
//! leaves the image slot blank; nothing here aborts a page.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("cannot read asset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("asset {path} is not a supported image: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Asset store
// ────────────────────────────────────────────────────────────────────────────

/// Maps an image reference to its raw bytes.
///
/// Implementations are called from the blocking layout task, so the trait is synchronous.
pub trait AssetStore: Send + Sync {
    fn load(&self, path: &Path) -> Result<Bytes, AssetError>;
}

/// Reads assets straight from the local file system.
#[derive(Debug, Clone, Default)]
pub struct FsAssetStore;

impl AssetStore for FsAssetStore {
    fn load(&self, path: &Path) -> Result<Bytes, AssetError> {
        std::fs::read(path)
            .map(Bytes::from)
            .map_err(|source| AssetError::Read {
                path: path.to_path_buf(),
                source,
            })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Embedded image
// ────────────────────────────────────────────────────────────────────────────

/// Pixel data in the form the PDF writer needs.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// Baseline JPEG passed through unchanged (DCT-encoded in the PDF).
    Jpeg { bytes: Bytes, grayscale: bool },
    /// Zlib-compressed 8-bit RGB samples, with an optional compressed alpha channel.
    Deflated { rgb: Vec<u8>, alpha: Option<Vec<u8>> },
}

/// A decoded image ready to be placed on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub source: PathBuf,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub data: ImageData,
}

const DEFLATE_LEVEL: u8 = 6;

/// Resolves image references through an `AssetStore`.
#[derive(Clone)]
pub struct AssetResolver {
    store: Arc<dyn AssetStore>,
}

impl AssetResolver {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self { store }
    }

    /// Loads and decodes the image at `reference`.
    pub fn resolve(&self, reference: &Path) -> Result<EmbeddedImage, AssetError> {
        let bytes = self.store.load(reference)?;
        let decode_err = |source| AssetError::Decode {
            path: reference.to_path_buf(),
            source,
        };

        let format = image::guess_format(&bytes).map_err(decode_err)?;
        let decoded = image::load_from_memory_with_format(&bytes, format).map_err(decode_err)?;
        let data = encode_for_pdf(format, &decoded, bytes.clone());

        debug!(
            path = %reference.display(),
            width = decoded.width(),
            height = decoded.height(),
            "Resolved image asset"
        );

        Ok(EmbeddedImage {
            source: reference.to_path_buf(),
            pixel_width: decoded.width(),
            pixel_height: decoded.height(),
            data,
        })
    }
}

/// JPEGs in RGB or grayscale keep their original bytes; everything else is
/// flattened to RGB plus an alpha mask when any pixel is translucent.
///
/// The decoder converts CMYK and YCCK JPEGs to RGB, so `decoded.color()` alone
/// cannot tell them apart. Their DCT streams have four components and are never
/// passed through.
fn encode_for_pdf(format: ImageFormat, decoded: &DynamicImage, original: Bytes) -> ImageData {
    if format == ImageFormat::Jpeg && !jpeg_has_four_components(&original) {
        match decoded.color() {
            ColorType::Rgb8 => {
                return ImageData::Jpeg {
                    bytes: original,
                    grayscale: false,
                }
            }
            ColorType::L8 => {
                return ImageData::Jpeg {
                    bytes: original,
                    grayscale: true,
                }
            }
            _ => {}
        }
    }

    let rgba = decoded.to_rgba8();
    let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);

    let rgb: Vec<u8> = rgba
        .pixels()
        .flat_map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect();
    let alpha = has_alpha.then(|| {
        let samples: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
        miniz_oxide::deflate::compress_to_vec_zlib(&samples, DEFLATE_LEVEL)
    });

    ImageData::Deflated {
        rgb: miniz_oxide::deflate::compress_to_vec_zlib(&rgb, DEFLATE_LEVEL),
        alpha,
    }
}

/// True when the JPEG source is CMYK/YCCK, or when its header cannot be read again.
fn jpeg_has_four_components(bytes: &[u8]) -> bool {
    match JpegDecoder::new(Cursor::new(bytes)) {
        Ok(decoder) => matches!(decoder.original_color_type(), ExtendedColorType::Cmyk8),
        Err(_) => true,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn resolver() -> AssetResolver {
        AssetResolver::new(Arc::new(FsAssetStore))
    }

    #[test]
    fn test_resolve_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolver().resolve(&dir.path().join("nope.png"));
        assert!(matches!(result, Err(AssetError::Read { .. })));
    }

    #[test]
    fn test_resolve_garbage_bytes_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpeg");
        std::fs::write(&path, b"<html>not an image</html>").unwrap();

        let result = resolver().resolve(&path);
        assert!(matches!(result, Err(AssetError::Decode { .. })));
    }

    #[test]
    fn test_resolve_rgb_jpeg_passes_bytes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.jpeg");
        RgbImage::from_pixel(8, 4, Rgb([200, 10, 10])).save(&path).unwrap();

        let image = resolver().resolve(&path).unwrap();
        assert_eq!((image.pixel_width, image.pixel_height), (8, 4));
        match image.data {
            ImageData::Jpeg { bytes, grayscale } => {
                assert!(!grayscale);
                assert_eq!(&bytes[..], &std::fs::read(&path).unwrap()[..]);
            }
            other => panic!("expected JPEG passthrough, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_grayscale_jpeg_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.jpeg");
        GrayImage::from_pixel(4, 4, Luma([90])).save(&path).unwrap();

        let image = resolver().resolve(&path).unwrap();
        assert!(matches!(image.data, ImageData::Jpeg { grayscale: true, .. }));
    }

    #[test]
    fn test_resolve_cmyk_jpeg_is_reencoded_as_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("print.jpeg");
        let (width, height) = (4u16, 4u16);
        let cmyk = vec![0u8, 200, 200, 0].repeat(usize::from(width) * usize::from(height));
        let mut encoded = Vec::new();
        jpeg_encoder::Encoder::new(&mut encoded, 90)
            .encode(&cmyk, width, height, jpeg_encoder::ColorType::Cmyk)
            .unwrap();
        std::fs::write(&path, &encoded).unwrap();

        let image = resolver().resolve(&path).unwrap();
        assert_eq!((image.pixel_width, image.pixel_height), (4, 4));
        match image.data {
            ImageData::Deflated { rgb, alpha } => {
                let raw = miniz_oxide::inflate::decompress_to_vec_zlib(&rgb).unwrap();
                assert_eq!(raw.len(), 4 * 4 * 3);
                assert!(alpha.is_none());
            }
            other => panic!("four-component JPEG must not pass through, got {other:?}"),
        }
    }

    #[test]
    fn test_jpeg_component_check_on_rgb_and_cmyk() {
        let mut rgb = Vec::new();
        jpeg_encoder::Encoder::new(&mut rgb, 90)
            .encode(&[10u8, 20, 30].repeat(4), 2, 2, jpeg_encoder::ColorType::Rgb)
            .unwrap();
        assert!(!jpeg_has_four_components(&rgb));

        let mut cmyk = Vec::new();
        jpeg_encoder::Encoder::new(&mut cmyk, 90)
            .encode(&[0u8, 0, 0, 255].repeat(4), 2, 2, jpeg_encoder::ColorType::Cmyk)
            .unwrap();
        assert!(jpeg_has_four_components(&cmyk));
    }

    #[test]
    fn test_resolve_opaque_png_has_no_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Jane Doe.png");
        RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255])).save(&path).unwrap();

        let image = resolver().resolve(&path).unwrap();
        match image.data {
            ImageData::Deflated { rgb, alpha } => {
                let raw = miniz_oxide::inflate::decompress_to_vec_zlib(&rgb).unwrap();
                assert_eq!(raw.len(), 3 * 3 * 3);
                assert_eq!(&raw[..3], &[1, 2, 3]);
                assert!(alpha.is_none());
            }
            other => panic!("expected deflated samples, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_translucent_png_keeps_alpha_mask() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar.png");
        RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 128])).save(&path).unwrap();

        let image = resolver().resolve(&path).unwrap();
        match image.data {
            ImageData::Deflated { alpha: Some(alpha), .. } => {
                let raw = miniz_oxide::inflate::decompress_to_vec_zlib(&alpha).unwrap();
                assert_eq!(raw, vec![128; 4]);
            }
            other => panic!("expected an alpha mask, got {other:?}"),
        }
    }
}
