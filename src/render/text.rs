/// Label fonts and label drawing on raster images
///
/// The configured TrueType font is used when present. Otherwise the bundled
/// DejaVu Sans face takes its place, so rulers and sample markers are always
/// labelled. The raw font file is kept next to the parsed face because the
/// PDF writer embeds it.

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::error::{CatalogError, CatalogResult};

/// File name of the bundled fallback face
pub const BUNDLED_FONT_NAME: &str = "DejaVuSans.ttf";
static BUNDLED_FONT: &[u8] = include_bytes!("../../resources/fonts/DejaVuSans.ttf");

/// A parsed TrueType face with the file bytes it was parsed from
#[derive(Clone)]
pub struct LabelFont {
    face: FontArc,
    data: Arc<[u8]>,
    name: String,
}

// Font bytes stay out of debug output
impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl LabelFont {
    /// Load a TrueType/OpenType font file
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let bytes = fs::read(path).map_err(|e| CatalogError::file_io(path, e))?;
        let face = FontArc::try_from_vec(bytes.clone()).map_err(|_| CatalogError::InvalidFont {
            path: path.to_path_buf(),
        })?;
        let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();

        Ok(Self {
            face,
            data: Arc::from(bytes),
            name: postscript_name(&stem),
        })
    }

    /// The face compiled into the binary
    pub fn bundled() -> CatalogResult<Self> {
        let face = FontArc::try_from_slice(BUNDLED_FONT).map_err(|_| CatalogError::InvalidFont {
            path: BUNDLED_FONT_NAME.into(),
        })?;
        Ok(Self {
            face,
            data: Arc::from(BUNDLED_FONT),
            name: "DejaVuSans".to_string(),
        })
    }

    /// Load `path`, or fall back to the bundled face when the file is absent.
    /// A file that exists but does not parse is still an error.
    pub fn load_or_bundled(path: &Path) -> CatalogResult<Self> {
        if path.is_file() {
            return Self::load(path);
        }
        warn!(
            "⚠️  Font {} not found, using bundled {}",
            path.display(),
            BUNDLED_FONT_NAME
        );
        Self::bundled()
    }

    pub fn face(&self) -> &FontArc {
        &self.face
    }

    /// Raw font file
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// PostScript-safe name for document font dictionaries
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Keep ASCII letters, digits and '-'; PDF font names allow nothing else
fn postscript_name(stem: &str) -> String {
    let name: String = stem.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-').collect();
    if name.is_empty() {
        "CatalogFont".to_string()
    } else {
        name
    }
}

/// Width and height of `text` at `size` px
pub fn label_size(font: &FontArc, size: f32, text: &str) -> (i32, i32) {
    let (w, h) = text_size(PxScale::from(size), font, text);
    (w as i32, h as i32)
}

/// Draw `text` with its top-left corner at (x, y)
pub fn draw_label(canvas: &mut RgbImage, font: &FontArc, color: Rgb<u8>, (x, y): (i32, i32), size: f32, text: &str) {
    draw_text_mut(canvas, color, x, y, PxScale::from(size), font, text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_font_draws_ink() {
        let font = LabelFont::bundled().unwrap();
        let mut img = RgbImage::from_pixel(40, 20, Rgb([255, 255, 255]));
        draw_label(&mut img, font.face(), Rgb([0, 0, 0]), (0, 0), 14.0, "1.0");
        assert!(img.pixels().any(|p| *p != Rgb([255, 255, 255])));
    }

    #[test]
    fn test_label_size_grows_with_text() {
        let font = LabelFont::bundled().unwrap();
        let (short, h) = label_size(font.face(), 14.0, "1.0");
        let (long, _) = label_size(font.face(), 14.0, "1203.46");
        assert!(short > 0 && h > 0);
        assert!(long > short);
    }

    #[test]
    fn test_missing_file_uses_bundled() {
        let font = LabelFont::load_or_bundled(Path::new("/nonexistent/arial.ttf")).unwrap();
        assert_eq!(font.name(), "DejaVuSans");
        assert_eq!(font.data(), BUNDLED_FONT);
    }

    #[test]
    fn test_invalid_font_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        fs::write(&path, b"not a font").unwrap();
        assert!(matches!(LabelFont::load(&path), Err(CatalogError::InvalidFont { .. })));
        assert!(matches!(LabelFont::load_or_bundled(&path), Err(CatalogError::InvalidFont { .. })));
    }

    #[test]
    fn test_loaded_font_keeps_bytes_and_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("My Font (1).ttf");
        fs::write(&path, BUNDLED_FONT).unwrap();

        let font = LabelFont::load(&path).unwrap();
        assert_eq!(font.name(), "MyFont1");
        assert_eq!(font.data().len(), BUNDLED_FONT.len());
    }
}
