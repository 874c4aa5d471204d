/// Fixed auxiliary assets: reference scale, separator graphic and label font

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::encode::{load_for_embedding, EncodedImage};
use super::text::LabelFont;
use crate::error::{CatalogError, CatalogResult};
use crate::state::config::{AssetNames, CatalogConfig};

const APP_DIR: &str = "core-catalog";
const RESOURCES_DIR: &str = "resources";

/// Find the resource directory.
///
/// Order: the configured directory (used as-is), `resources/` next to the
/// executable, then the user data dir (~/.local/share/core-catalog/resources
/// on Linux).
pub fn resolve_resources_dir(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = configured {
        return Some(dir.to_path_buf());
    }

    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(RESOURCES_DIR)));
    let user_data = dirs::data_dir().map(|dir| dir.join(APP_DIR).join(RESOURCES_DIR));

    [beside_exe, user_data].into_iter().flatten().find(|dir| dir.is_dir())
}

/// Fixed graphics shared by every box section
#[derive(Clone)]
pub struct Assets {
    /// Reference scale bar shown in its own column
    pub reference_scale: Arc<EncodedImage>,
    /// Graphic placed between the daylight and UV photos
    pub separator: Arc<EncodedImage>,
    /// Label font, also embedded in the PDF
    pub font: LabelFont,
}

// Implement Debug manually to keep image payloads and font data out of logs
impl std::fmt::Debug for Assets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assets")
            .field("reference_scale", &self.reference_scale)
            .field("separator", &self.separator)
            .field("font", &self.font)
            .finish()
    }
}

impl Assets {
    /// Load all assets from `dir`. The two graphics are required; a missing
    /// font file is replaced by the bundled face.
    pub fn load(dir: &Path, names: &AssetNames, quality: u8) -> CatalogResult<Self> {
        let reference_scale = load_required(&dir.join(&names.reference_scale), quality)?;
        let separator = load_required(&dir.join(&names.separator), quality)?;

        let font = LabelFont::load_or_bundled(&dir.join(&names.font))?;

        info!("📦 Assets loaded from {}", dir.display());
        Ok(Self {
            reference_scale,
            separator,
            font,
        })
    }

    /// Resolve the resource directory for `config` (or `override_dir`) and load
    pub fn from_config(config: &CatalogConfig, override_dir: Option<&Path>) -> CatalogResult<Self> {
        let configured = override_dir.or(config.resources_dir.as_deref());
        let dir = resolve_resources_dir(configured).ok_or_else(|| CatalogError::MissingAsset {
            path: PathBuf::from(RESOURCES_DIR).join(&config.assets.reference_scale),
        })?;
        Self::load(&dir, &config.assets, config.jpeg_quality)
    }
}

fn load_required(path: &Path, quality: u8) -> CatalogResult<Arc<EncodedImage>> {
    if !path.is_file() {
        return Err(CatalogError::MissingAsset {
            path: path.to_path_buf(),
        });
    }
    Ok(Arc::new(load_for_embedding(path, quality)?))
}
