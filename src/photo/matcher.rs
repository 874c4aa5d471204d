/// Box photo lookup by filename convention
///
/// Photos are named `<well>_<box>.<ext>` for daylight shots and
/// `<well>_<box>_uf.<ext>` for UV shots. There is no real join key between
/// the core log and the photo folder, so this matcher is the heuristic that
/// stands in for one.

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{CatalogError, CatalogResult};
use crate::state::dataset::Dataset;

/// Raster formats accepted from the photo folder
pub const PHOTO_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "tif", "tiff", "bmp"];

/// Which photograph of a box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoRole {
    /// Daylight photo
    Primary,
    /// UV-light photo (`_uf` suffix)
    Uv,
}

/// Matched photos for one box
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoPair {
    pub primary: Option<PathBuf>,
    pub uv: Option<PathBuf>,
}

/// Check if a path has one of the accepted raster extensions
pub fn is_photo(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| PHOTO_EXTENSIONS.contains(&ext.as_str()))
}

/// List photos directly inside `folder`, sorted by file name so matching
/// does not depend on directory enumeration order
pub fn list_photos(folder: &Path) -> CatalogResult<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(CatalogError::file_io(
            folder,
            std::io::Error::new(std::io::ErrorKind::NotFound, "photo folder not found"),
        ));
    }

    let photos: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_photo(p))
        .collect();

    info!("🔍 Found {} photos in {}", photos.len(), folder.display());
    Ok(photos)
}

/// Resolves box photos from a fixed list of candidates
#[derive(Debug, Clone, Default)]
pub struct PhotoMatcher {
    candidates: Vec<PathBuf>,
}

impl PhotoMatcher {
    /// Keep candidates with a supported extension, in the given order
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates: candidates.into_iter().filter(|p| is_photo(p)).collect(),
        }
    }

    pub fn from_folder(folder: &Path) -> CatalogResult<Self> {
        Ok(Self::new(list_photos(folder)?))
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// First candidate matching `box_id` in `role`, if any
    pub fn find(&self, box_id: i64, role: PhotoRole) -> Option<&Path> {
        let pattern = box_pattern(box_id)?;

        self.candidates.iter().map(PathBuf::as_path).find(|path| {
            let Some(name) = path.file_name() else {
                return false;
            };
            let name = name.to_string_lossy().to_lowercase();
            let Some(caps) = pattern.captures(&name) else {
                return false;
            };
            // A `_uf` anywhere in the name marks a UV photo
            let is_uv = caps.get(2).is_some() || name.contains("_uf");
            match role {
                PhotoRole::Uv => is_uv,
                PhotoRole::Primary => !is_uv,
            }
        })
    }

    /// Both photos of a box
    pub fn pair(&self, box_id: i64) -> PhotoPair {
        PhotoPair {
            primary: self.find(box_id, PhotoRole::Primary).map(Path::to_path_buf),
            uv: self.find(box_id, PhotoRole::Uv).map(Path::to_path_buf),
        }
    }
}

/// `<anything>_<box>[_uf].<ext>`, case-insensitive
fn box_pattern(box_id: i64) -> Option<Regex> {
    let pattern = format!(
        r"^(.+?)_{}(_uf)?\.({})$",
        regex::escape(&box_id.to_string()),
        PHOTO_EXTENSIONS.join("|")
    );
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("⚠️  Could not build photo pattern for box {}: {}", box_id, e);
            None
        }
    }
}

fn stem_pattern() -> &'static Regex {
    static STEM: OnceLock<Regex> = OnceLock::new();
    STEM.get_or_init(|| {
        RegexBuilder::new(r"^(.+?)_\d+(_uf)?$")
            .case_insensitive(true)
            .build()
            .expect("static well label pattern")
    })
}

/// Well label from a photo path: the stem without its `_<box>[_uf]` suffix
/// and without the leading well prefix token (e.g. "скв. 12_3.jpg" → "12")
pub fn well_label(photo: &Path, prefix: &str) -> Option<String> {
    let stem = photo.file_stem()?.to_string_lossy();
    let caps = stem_pattern().captures(&stem)?;
    let name = caps.get(1)?.as_str().trim();

    let name = strip_prefix_ci(name, prefix.trim()).unwrap_or(name).trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Case-insensitive `str::strip_prefix`
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }
    let mut rest = text.char_indices();
    for p in prefix.chars() {
        let (_, c) = rest.next()?;
        if !c.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    let offset = rest.next().map_or(text.len(), |(i, _)| i);
    Some(&text[offset..])
}

/// Stamp each record with its box photos and the derived well label
pub fn attach_photos(dataset: Dataset, matcher: &PhotoMatcher, well_prefix: &str) -> Dataset {
    if matcher.is_empty() {
        warn!("⚠️  No photos to match, every box is left without a photo");
    }
    let mut cache: HashMap<i64, PhotoPair> = HashMap::new();
    let mut unmatched = 0usize;

    let dataset = dataset.map_records(|mut record| {
        let Some(box_id) = record.box_id else {
            return record;
        };
        let pair = cache.entry(box_id).or_insert_with(|| {
            let pair = matcher.pair(box_id);
            if pair.primary.is_none() {
                unmatched += 1;
                debug!("No daylight photo for box {}", box_id);
            }
            pair
        });
        record.photo = pair.primary.clone();
        record.uv_photo = pair.uv.clone();
        record.well = record
            .photo
            .as_deref()
            .and_then(|p| well_label(p, well_prefix));
        record
    });

    if unmatched > 0 {
        warn!("⚠️  {} boxes have no matching photo", unmatched);
    }
    dataset
}
