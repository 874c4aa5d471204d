/// Catalog configuration
///
/// This struct stores every tunable the pipeline reads: which columns hold
/// the core log fields, the merge tolerance, box geometry, asset file names
/// and page geometry. It is serialized to JSON so a site can keep its own
/// column naming without rebuilding.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, CatalogResult};

/// Names of the core log columns, matched case-insensitively
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ColumnNames {
    /// Core box number
    pub box_id: String,
    /// Run start depth
    pub start: String,
    /// Run end depth
    pub end: String,
    /// Measured recovered length
    pub measured: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            box_id: "BOX".to_string(),
            start: "от".to_string(),
            end: "до".to_string(),
            measured: "замеры".to_string(),
        }
    }
}

/// File names of the fixed resources, resolved against the resource directory
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AssetNames {
    /// Reference scale strip placed in the right column of every page
    pub reference_scale: String,
    /// Thin separator graphic between the daylight and UV photos
    pub separator: String,
    /// TrueType font for scale and sample labels
    pub font: String,
}

impl Default for AssetNames {
    fn default() -> Self {
        Self {
            reference_scale: "scale.jpg".to_string(),
            separator: "shkala.jpg".to_string(),
            font: "arial.ttf".to_string(),
        }
    }
}

/// Physical page geometry for the document writer (centimetres)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct PageLayout {
    pub page_width_cm: f32,
    pub page_height_cm: f32,
    pub margin_cm: f32,
    /// Height of scales, photos and the reference scale
    pub figure_height_cm: f32,
    /// Height of the separator graphic
    pub separator_height_cm: f32,
    pub font_size_pt: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        // A4 portrait, 1 cm margins, 21.88 cm figure strip
        Self {
            page_width_cm: 21.0,
            page_height_cm: 29.7,
            margin_cm: 1.0,
            figure_height_cm: 21.88,
            separator_height_cm: 2.54,
            font_size_pt: 9.0,
        }
    }
}

/// Colors used when drawing on generated and annotated images
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Palette {
    /// Depth scale tick color
    pub tick: String,
    /// Depth scale label color
    pub label: String,
    /// Sample marker ring and label color
    pub marker: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            tick: "#008000".to_string(),
            label: "#000000".to_string(),
            marker: "#FF0000".to_string(),
        }
    }
}

/// All catalog settings
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    // ========== Input ==========

    /// Core log column names
    pub columns: ColumnNames,

    /// Token stripped from the front of well labels (e.g. "скв.")
    pub well_prefix: String,

    // ========== Derivation ==========

    /// Largest gap (m) still treated as continuous drilling
    pub merge_tolerance: f64,

    /// Physical length of one core box (m)
    pub box_length: f64,

    /// Core segments laid side by side in one box (1 or 2)
    pub segments_per_box: u8,

    // ========== Output ==========

    /// Directory holding the fixed assets; None = auto-detect
    pub resources_dir: Option<PathBuf>,

    pub assets: AssetNames,

    pub page: PageLayout,

    pub palette: Palette,

    /// JPEG quality (1-100) for images embedded in the document
    pub jpeg_quality: u8,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            well_prefix: "скв.".to_string(),
            merge_tolerance: 0.1,
            box_length: 1.0,
            segments_per_box: 1,
            resources_dir: None,
            assets: AssetNames::default(),
            page: PageLayout::default(),
            palette: Palette::default(),
            jpeg_quality: 90,
        }
    }
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert to JSON string for saving
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from JSON string; missing keys fall back to defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load from a JSON file and validate
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let json = fs::read_to_string(path).map_err(|e| CatalogError::file_io(path, e))?;
        let config = Self::from_json(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from the default location if it exists,
    /// else use defaults
    pub fn load_or_default(path: Option<&Path>) -> CatalogResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Default config location:
    /// - Linux: ~/.config/core-catalog/config.json
    /// - macOS: ~/Library/Application Support/core-catalog/config.json
    /// - Windows: %APPDATA%\core-catalog\config.json
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("core-catalog").join("config.json"))
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> CatalogResult<()> {
        if !(self.merge_tolerance.is_finite() && self.merge_tolerance >= 0.0) {
            return Err(CatalogError::configuration("merge_tolerance must be >= 0"));
        }
        if !(self.box_length.is_finite() && self.box_length > 0.0) {
            return Err(CatalogError::configuration("box_length must be > 0"));
        }
        if !(1..=2).contains(&self.segments_per_box) {
            return Err(CatalogError::configuration("segments_per_box must be 1 or 2"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(CatalogError::configuration("jpeg_quality must be within 1..=100"));
        }
        for (name, value) in [
            ("columns.box_id", &self.columns.box_id),
            ("columns.start", &self.columns.start),
            ("columns.end", &self.columns.end),
        ] {
            if value.trim().is_empty() {
                return Err(CatalogError::configuration(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }

    /// Check if this is the stock configuration
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Reset all settings to default
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CatalogConfig::default();
        assert!(config.is_default());
        assert!(config.validate().is_ok());
        assert_eq!(config.merge_tolerance, 0.1);
        assert_eq!(config.box_length, 1.0);
    }

    #[test]
    fn test_serialization() {
        let mut config = CatalogConfig::default();
        config.columns.box_id = "Box".to_string();
        config.segments_per_box = 2;

        let json = config.to_json().unwrap();
        let restored = CatalogConfig::from_json(&json).unwrap();

        assert_eq!(config, restored);
        assert!(!restored.is_default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CatalogConfig::from_json(r#"{"columns": {"start": "From"}}"#).unwrap();
        assert_eq!(config.columns.start, "From");
        assert_eq!(config.columns.end, "до");
        assert_eq!(config.jpeg_quality, 90);
    }

    #[test]
    fn test_validate_rejects_bad_segments() {
        let mut config = CatalogConfig::default();
        config.segments_per_box = 3;
        assert!(config.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_reset() {
        let mut config = CatalogConfig::default();
        config.box_length = 2.0;
        assert!(!config.is_default());
        config.reset();
        assert!(config.is_default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"box_length": 1.5}"#).unwrap();

        let config = CatalogConfig::load(&path).unwrap();
        assert_eq!(config.box_length, 1.5);

        fs::write(&path, r#"{"box_length": 0}"#).unwrap();
        assert!(CatalogConfig::load(&path).is_err());
    }
}
