/// Raster generation for the catalog
///
/// This module handles:
/// - Drawing depth scales
/// - Label fonts (configured or bundled) and label text on rasters
/// - JPEG encoding and sizing for embedding
/// - Locating and loading the fixed graphic assets

pub mod assets;
pub mod encode;
pub mod scale;
pub mod text;

pub use assets::{resolve_resources_dir, Assets};
pub use encode::{encode_jpeg, EncodedImage};
pub use scale::{DepthScaleRenderer, ScaleDirection, ScaleParams, Tick, TickKind};
pub use text::LabelFont;
