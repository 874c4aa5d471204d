/// Sample location markers on box photographs
///
/// Markers are drawn on a copy of the photo. The source file is opened
/// read-only and never written.

use ab_glyph::FontArc;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_circle_mut;
use std::path::Path;
use tracing::debug;

use crate::color::{BLACK, MARKER_RED};
use crate::error::CatalogResult;
use crate::render::encode::open_rgb;
use crate::render::text::{draw_label, label_size};
use crate::state::data::{format_number, SampleRecord};

/// Marker radius relative to image width
pub const MARKER_RADIUS_RATIO: f32 = 0.12;
/// Markers are kept inside [EDGE_MARGIN, 1 - EDGE_MARGIN] of the height
pub const EDGE_MARGIN: f32 = 0.05;

/// Which edge a marker was pushed away from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeClamp {
    None,
    Top,
    Bottom,
}

/// Resolved marker geometry in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPlacement {
    pub center: (f32, f32),
    pub radius: f32,
    pub clamp: EdgeClamp,
    /// Label goes above the circle (only when pushed off the bottom edge)
    pub label_above: bool,
}

/// Marker geometry for a sample at normalized `offset` in a `width` x `height`
/// photo holding `segments` core segments.
///
/// The horizontal position uses width / (2 * segments) for every segment
/// count; which segment a sample sits in is not known from its number.
pub fn place_marker(width: u32, height: u32, offset: f64, segments: u8) -> MarkerPlacement {
    let (w, h) = (width as f32, height as f32);
    let radius = MARKER_RADIUS_RATIO * w;
    let x = w / (2.0 * segments.max(1) as f32);
    let mut y = offset as f32 * h;

    let clamp = if y + radius > (1.0 - EDGE_MARGIN) * h {
        y = (1.0 - EDGE_MARGIN) * h - radius;
        EdgeClamp::Bottom
    } else if y - radius < EDGE_MARGIN * h {
        y = EDGE_MARGIN * h + radius;
        EdgeClamp::Top
    } else {
        EdgeClamp::None
    };

    MarkerPlacement {
        center: (x, y),
        radius,
        clamp,
        label_above: clamp == EdgeClamp::Bottom,
    }
}

/// Draws sample markers onto box photos
#[derive(Debug, Clone)]
pub struct SampleAnnotator {
    font: FontArc,
    marker_color: Rgb<u8>,
    label_color: Rgb<u8>,
}

impl SampleAnnotator {
    pub fn new(font: FontArc) -> Self {
        Self {
            font,
            marker_color: MARKER_RED,
            label_color: BLACK,
        }
    }

    pub fn with_colors(mut self, marker: Rgb<u8>, label: Rgb<u8>) -> Self {
        self.marker_color = marker;
        self.label_color = label;
        self
    }

    /// Return an annotated copy of `source`
    pub fn annotate(&self, source: &RgbImage, samples: &[SampleRecord], segments: u8) -> RgbImage {
        let mut canvas = source.clone();
        let (width, height) = canvas.dimensions();

        for sample in samples {
            let marker = place_marker(width, height, sample.offset(), segments);
            self.draw_marker(&mut canvas, &marker, &format_number(sample.number));
        }

        debug!("Annotated {}x{} photo with {} markers", width, height, samples.len());
        canvas
    }

    /// Open a photo read-only and return an annotated copy
    pub fn annotate_file(&self, path: &Path, samples: &[SampleRecord], segments: u8) -> CatalogResult<RgbImage> {
        let source = open_rgb(path)?;
        Ok(self.annotate(&source, samples, segments))
    }

    fn draw_marker(&self, canvas: &mut RgbImage, marker: &MarkerPlacement, label: &str) {
        let (cx, cy) = (marker.center.0.round() as i32, marker.center.1.round() as i32);
        let radius = marker.radius.round().max(1.0) as i32;

        // Ring a few pixels thick
        let thickness = (radius / 10).max(2);
        for r in (radius - thickness / 2).max(1)..=radius + thickness / 2 {
            draw_hollow_circle_mut(canvas, (cx, cy), r, self.marker_color);
        }

        let size = (marker.radius * 0.8).max(12.0);
        let (text_w, text_h) = label_size(&self.font, size, label);
        let gap = thickness + 2;
        let x = cx - text_w / 2;
        let y = if marker.label_above {
            cy - radius - gap - text_h
        } else {
            cy + radius + gap
        };
        draw_label(canvas, &self.font, self.label_color, (x, y), size, label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::text::LabelFont;
    use std::collections::BTreeSet;
    use std::fs;

    fn annotator() -> SampleAnnotator {
        SampleAnnotator::new(LabelFont::bundled().unwrap().face().clone())
    }

    fn sample(number: f64) -> SampleRecord {
        SampleRecord {
            box_id: number.floor() as i64,
            number,
            depth: None,
            studies: BTreeSet::new(),
        }
    }

    #[test]
    fn test_marker_follows_offset() {
        let m = place_marker(100, 1000, sample(4.71).offset(), 1);
        assert_eq!(m.clamp, EdgeClamp::None);
        assert!((m.center.0 - 50.0).abs() < 1e-3);
        assert!((m.center.1 - 710.0).abs() < 1e-2);
        assert!((m.radius - 12.0).abs() < 1e-3);
        assert!(!m.label_above);
    }

    #[test]
    fn test_top_clamp_puts_label_below() {
        let m = place_marker(100, 1000, 0.01, 1);
        assert_eq!(m.clamp, EdgeClamp::Top);
        assert!((m.center.1 - 62.0).abs() < 1e-3);
        assert!(!m.label_above);
    }

    #[test]
    fn test_bottom_clamp_puts_label_above() {
        let m = place_marker(100, 1000, 0.99, 1);
        assert_eq!(m.clamp, EdgeClamp::Bottom);
        assert!((m.center.1 - 938.0).abs() < 1e-3);
        assert!(m.label_above);
    }

    #[test]
    fn test_two_segments_use_quarter_width() {
        let m = place_marker(200, 1000, 0.5, 2);
        assert!((m.center.0 - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_annotate_returns_copy() {
        let source = RgbImage::from_pixel(100, 400, Rgb([200, 200, 200]));
        let annotated = annotator().annotate(&source, &[sample(4.5)], 1);

        assert_eq!(annotated.dimensions(), source.dimensions());
        assert!(source.pixels().all(|p| *p == Rgb([200, 200, 200])));
        // Ring passes through (50 + 12, 200)
        assert_eq!(*annotated.get_pixel(62, 200), MARKER_RED);
        // Center stays untouched
        assert_eq!(*annotated.get_pixel(50, 200), Rgb([200, 200, 200]));
    }

    #[test]
    fn test_top_clamped_label_is_drawn_below() {
        let source = RgbImage::from_pixel(200, 1000, Rgb([255, 255, 255]));
        let annotated = annotator().annotate(&source, &[sample(4.01)], 1);
        let m = place_marker(200, 1000, 0.01, 1);
        let below = (m.center.1 + m.radius) as u32;

        let label_ink = (0..200)
            .flat_map(|x| (below + 4..below + 40).map(move |y| (x, y)))
            .filter(|&(x, y)| {
                let p = *annotated.get_pixel(x, y);
                p != Rgb([255, 255, 255]) && p != MARKER_RED
            })
            .count();
        assert!(label_ink > 0);
    }

    #[test]
    fn test_annotate_file_leaves_source_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("well_4.png");
        RgbImage::from_pixel(80, 300, Rgb([30, 60, 90])).save(&path).unwrap();
        let before = fs::read(&path).unwrap();

        let annotated = annotator()
            .annotate_file(&path, &[sample(4.71), sample(4.02)], 1)
            .unwrap();

        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(annotated.dimensions(), (80, 300));
    }
}
