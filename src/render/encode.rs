/// Image encoding for document embedding
///
/// Every raster that ends up in the catalog (generated scales, photos,
/// annotated photos, fixed assets) passes through here once: decoded,
/// bounded in size, flattened to RGB and encoded as baseline JPEG. The
/// document writer can then embed the bytes without touching pixels.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use std::path::Path;
use tracing::debug;

use crate::error::CatalogResult;

/// Tallest raster kept for embedding; a 21.88 cm figure at ~280 dpi
pub const EMBED_MAX_HEIGHT: u32 = 2400;

/// A JPEG-encoded image ready for embedding
#[derive(Clone, PartialEq)]
pub struct EncodedImage {
    /// Baseline JPEG bytes (RGB)
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// Width over height
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

// Implement Debug without dumping the byte payload
impl std::fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Encode an RGB buffer as JPEG
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> CatalogResult<EncodedImage> {
    let mut bytes = Vec::new();
    image.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, quality))?;
    Ok(EncodedImage {
        bytes,
        width: image.width(),
        height: image.height(),
    })
}

/// Shrink (never enlarge) to at most `EMBED_MAX_HEIGHT`, keeping aspect
pub fn fit_for_embedding(image: RgbImage) -> RgbImage {
    if image.height() <= EMBED_MAX_HEIGHT {
        return image;
    }
    let width = ((image.width() as u64 * EMBED_MAX_HEIGHT as u64) / image.height() as u64).max(1) as u32;
    debug!(
        "Resizing {}x{} to {}x{} for embedding",
        image.width(),
        image.height(),
        width,
        EMBED_MAX_HEIGHT
    );
    image::imageops::resize(&image, width, EMBED_MAX_HEIGHT, FilterType::Lanczos3)
}

/// Open any supported raster read-only and flatten it to RGB
pub fn open_rgb(path: &Path) -> CatalogResult<RgbImage> {
    let img: DynamicImage = image::open(path)?;
    Ok(img.to_rgb8())
}

/// Load a file and prepare it for embedding in one step
pub fn load_for_embedding(path: &Path, quality: u8) -> CatalogResult<EncodedImage> {
    encode_jpeg(&fit_for_embedding(open_rgb(path)?), quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_encode_jpeg_keeps_dimensions() {
        let img = RgbImage::from_pixel(50, 1100, Rgb([255, 255, 255]));
        let encoded = encode_jpeg(&img, 90).unwrap();

        assert_eq!((encoded.width, encoded.height), (50, 1100));
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!(decoded.width(), 50);
        assert_eq!(decoded.height(), 1100);
    }

    #[test]
    fn test_fit_for_embedding() {
        let small = RgbImage::new(100, 200);
        assert_eq!(fit_for_embedding(small).dimensions(), (100, 200));

        let tall = RgbImage::new(300, EMBED_MAX_HEIGHT * 2);
        assert_eq!(fit_for_embedding(tall).dimensions(), (150, EMBED_MAX_HEIGHT));
    }

    #[test]
    fn test_load_png_for_embedding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box_1.png");
        RgbImage::from_pixel(40, 80, Rgb([10, 20, 30])).save(&path).unwrap();

        let encoded = load_for_embedding(&path, 85).unwrap();
        assert_eq!((encoded.width, encoded.height), (40, 80));
        assert!((encoded.aspect() - 0.5).abs() < 1e-6);
    }
}
