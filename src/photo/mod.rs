/// Box photograph handling
///
/// This module handles:
/// - Matching photos to boxes by filename
/// - Deriving the well label from a photo name
/// - Drawing sample markers on photo copies

pub mod annotate;
pub mod matcher;

pub use annotate::{place_marker, EdgeClamp, MarkerPlacement, SampleAnnotator};
pub use matcher::{attach_photos, list_photos, well_label, PhotoMatcher, PhotoPair, PhotoRole};
