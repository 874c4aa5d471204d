/// Depth scale (ruler) rendering
///
/// A ruler is a 50x1100 px strip placed next to a box photo. Depth maps
/// linearly to pixel rows: one box length spans the strip between the 20 px
/// top and bottom margins. Ticks are drawn every 0.1 length units: wide and
/// labelled on whole units, medium and labelled on half units, short
/// otherwise. A box holding two core segments gets two strips, the first
/// half of the ticks on the first and the rest on the second.

use ab_glyph::FontArc;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use tracing::{debug, warn};

use super::encode::{encode_jpeg, EncodedImage};
use super::text::draw_label;
use crate::color::{BLACK, TICK_GREEN, WHITE};
use crate::error::CatalogResult;

pub const SCALE_WIDTH: u32 = 50;
pub const SCALE_HEIGHT: u32 = 1100;
/// Top and bottom margin (px)
pub const SCALE_MARGIN: u32 = 20;
/// Tick spacing in length units
pub const TICK_STEP: f64 = 0.1;
/// Vertical shift of the first label so it is not cut by the strip edge
pub const FIRST_LABEL_SHIFT: i32 = 15;
/// Tolerance for whole/half unit classification
pub const TICK_EPSILON: f64 = 1e-5;

const LABEL_SIZE: f32 = 14.0;
const SHORT_TICK_LENGTH: u32 = 25;

/// Direction depth increases along the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleDirection {
    /// Depth grows downwards (the only one used for catalogs)
    #[default]
    Downward,
    Upward,
}

/// Tick weight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// Whole unit: full width, 4 px, labelled
    Whole,
    /// Half unit: full width, 2 px, labelled
    Half,
    /// Everything else: half width, 2 px, no label
    Minor,
}

impl TickKind {
    fn thickness(self) -> u32 {
        match self {
            TickKind::Whole => 4,
            TickKind::Half | TickKind::Minor => 2,
        }
    }

    fn length(self) -> u32 {
        match self {
            TickKind::Whole | TickKind::Half => SCALE_WIDTH,
            TickKind::Minor => SHORT_TICK_LENGTH,
        }
    }

    pub fn is_labelled(self) -> bool {
        !matches!(self, TickKind::Minor)
    }
}

/// Input for one box ruler
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleParams {
    pub top: f64,
    pub bottom: f64,
    /// 1 or 2
    pub segments: u8,
    pub box_length: f64,
    pub direction: ScaleDirection,
}

impl ScaleParams {
    pub fn new(top: f64, bottom: f64, segments: u8, box_length: f64) -> Self {
        Self {
            top,
            bottom,
            segments,
            box_length,
            direction: ScaleDirection::Downward,
        }
    }

    /// Number of strips drawn
    pub fn strip_count(&self) -> usize {
        if self.segments == 2 {
            2
        } else {
            1
        }
    }
}

/// One computed tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub index: usize,
    pub depth: f64,
    /// Pixel row of the tick center
    pub y: f32,
    pub kind: TickKind,
    /// Label shift relative to the tick row
    pub label_dy: i32,
    /// Strip the tick is drawn on (0 or 1)
    pub strip: usize,
}

impl Tick {
    pub fn label(&self) -> String {
        format!("{:.1}", self.depth)
    }
}

/// round((bottom - top) / step) + 1, zero for inverted ranges
pub fn tick_count(top: f64, bottom: f64) -> usize {
    let steps = ((bottom - top) / TICK_STEP).round();
    if steps.is_finite() && steps >= 0.0 {
        steps as usize + 1
    } else {
        0
    }
}

/// `value` is a multiple of `unit` within `TICK_EPSILON`, on either side
fn is_multiple_of(value: f64, unit: f64) -> bool {
    let rem = value.rem_euclid(unit);
    rem < TICK_EPSILON || unit - rem < TICK_EPSILON
}

pub fn classify(depth: f64) -> TickKind {
    if is_multiple_of(depth, 1.0) {
        TickKind::Whole
    } else if is_multiple_of(depth, 0.5) {
        TickKind::Half
    } else {
        TickKind::Minor
    }
}

/// Ticks that fit on the strip: those at most one box length below the top
pub fn visible_tick_count(box_length: f64) -> usize {
    let steps = (box_length / TICK_STEP + TICK_EPSILON).floor();
    if steps.is_finite() && steps >= 0.0 {
        steps as usize + 1
    } else {
        0
    }
}

/// All ticks of a ruler with their pixel rows and strip assignment.
///
/// A range longer than one box length is cut at the box length; the ticks
/// past it would fall below the strip.
pub fn compute_ticks(params: &ScaleParams) -> Vec<Tick> {
    let requested = tick_count(params.top, params.bottom);
    let count = requested.min(visible_tick_count(params.box_length));
    if count < requested {
        warn!(
            "⚠️  Depth range {}-{} exceeds the box length {}, ruler cut to {} ticks",
            params.top, params.bottom, params.box_length, count
        );
    }
    let split = count / 2;
    let usable = (SCALE_HEIGHT - 2 * SCALE_MARGIN) as f64;

    (0..count)
        .map(|index| {
            let depth = params.top + index as f64 * TICK_STEP;
            let position = (depth - params.top) / params.box_length;
            let (y, shift) = match params.direction {
                ScaleDirection::Downward => (SCALE_MARGIN as f64 + position * usable, FIRST_LABEL_SHIFT),
                ScaleDirection::Upward => (
                    (SCALE_HEIGHT - SCALE_MARGIN) as f64 - position * usable,
                    -FIRST_LABEL_SHIFT,
                ),
            };
            let strip = if params.strip_count() == 1 || index < split { 0 } else { 1 };

            Tick {
                index,
                depth,
                y: y as f32,
                kind: classify(depth),
                label_dy: if index == 0 { shift } else { 0 },
                strip,
            }
        })
        .collect()
}

/// Draws depth rulers
#[derive(Debug, Clone)]
pub struct DepthScaleRenderer {
    font: FontArc,
    tick_color: Rgb<u8>,
    label_color: Rgb<u8>,
}

impl DepthScaleRenderer {
    pub fn new(font: FontArc) -> Self {
        Self {
            font,
            tick_color: TICK_GREEN,
            label_color: BLACK,
        }
    }

    pub fn with_colors(mut self, tick: Rgb<u8>, label: Rgb<u8>) -> Self {
        self.tick_color = tick;
        self.label_color = label;
        self
    }

    /// Render the strip(s) for a box
    pub fn render(&self, params: &ScaleParams) -> Vec<RgbImage> {
        let mut strips: Vec<RgbImage> = (0..params.strip_count())
            .map(|_| RgbImage::from_pixel(SCALE_WIDTH, SCALE_HEIGHT, WHITE))
            .collect();

        let ticks = compute_ticks(params);
        for tick in &ticks {
            let canvas = &mut strips[tick.strip];
            let thickness = tick.kind.thickness();
            let top = (tick.y - thickness as f32 / 2.0).round() as i32;
            draw_filled_rect_mut(
                canvas,
                Rect::at(0, top).of_size(tick.kind.length(), thickness),
                self.tick_color,
            );

            if tick.kind.is_labelled() {
                let y = tick.y.round() as i32 + tick.label_dy;
                draw_label(canvas, &self.font, self.label_color, (0, y), LABEL_SIZE, &tick.label());
            }
        }

        debug!(
            "Rendered {} ticks for {:.2}-{:.2} on {} strip(s)",
            ticks.len(),
            params.top,
            params.bottom,
            strips.len()
        );
        strips
    }

    /// Render and encode for embedding
    pub fn render_encoded(&self, params: &ScaleParams, quality: u8) -> CatalogResult<Vec<EncodedImage>> {
        self.render(params)
            .iter()
            .map(|strip| encode_jpeg(strip, quality))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::text::LabelFont;

    fn renderer() -> DepthScaleRenderer {
        DepthScaleRenderer::new(LabelFont::bundled().unwrap().face().clone())
    }

    #[test]
    fn test_one_metre_has_eleven_ticks() {
        let ticks = compute_ticks(&ScaleParams::new(0.0, 1.0, 1, 1.0));
        assert_eq!(ticks.len(), 11);
        assert_eq!(ticks[0].kind, TickKind::Whole);
        assert_eq!(ticks[10].kind, TickKind::Whole);
        assert_eq!(ticks[5].kind, TickKind::Half);
        assert_eq!(ticks[3].kind, TickKind::Minor);
        assert_eq!(ticks.iter().filter(|t| t.kind.is_labelled()).count(), 3);
    }

    #[test]
    fn test_pixel_mapping() {
        let ticks = compute_ticks(&ScaleParams::new(0.0, 1.0, 1, 1.0));
        assert_eq!(ticks[0].y, 20.0);
        assert_eq!(ticks[10].y, 1080.0);
        assert!((ticks[5].y - 550.0).abs() < 1e-3);
    }

    #[test]
    fn test_classification_tolerates_float_drift() {
        // 2.3 + 7 * 0.1 lands just off 3.0
        assert_eq!(classify(2.3 + 7.0 * TICK_STEP), TickKind::Whole);
        assert_eq!(classify(0.1 * 3.0), TickKind::Minor);
        assert_eq!(classify(12.5), TickKind::Half);
        assert_eq!(classify(12.499999), TickKind::Half);
        assert_eq!(classify(-1.0), TickKind::Whole);
    }

    #[test]
    fn test_first_label_shift() {
        let down = compute_ticks(&ScaleParams::new(5.0, 6.0, 1, 1.0));
        assert_eq!(down[0].label_dy, FIRST_LABEL_SHIFT);
        assert!(down[1..].iter().all(|t| t.label_dy == 0));

        let mut params = ScaleParams::new(5.0, 6.0, 1, 1.0);
        params.direction = ScaleDirection::Upward;
        let up = compute_ticks(&params);
        assert_eq!(up[0].label_dy, -FIRST_LABEL_SHIFT);
        assert_eq!(up[0].y, 1080.0);
        assert_eq!(up[10].y, 20.0);
    }

    #[test]
    fn test_two_segments_split_by_index() {
        let ticks = compute_ticks(&ScaleParams::new(0.0, 1.0, 2, 1.0));
        let first: Vec<_> = ticks.iter().filter(|t| t.strip == 0).map(|t| t.index).collect();
        let second: Vec<_> = ticks.iter().filter(|t| t.strip == 1).map(|t| t.index).collect();
        assert_eq!(first, vec![0, 1, 2, 3, 4]);
        assert_eq!(second, vec![5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_inverted_range_has_no_ticks() {
        assert_eq!(tick_count(2.0, 1.0), 0);
        assert!(compute_ticks(&ScaleParams::new(2.0, 1.0, 1, 1.0)).is_empty());
    }

    #[test]
    fn test_render_dimensions_and_ticks() {
        let renderer = renderer();
        let strips = renderer.render(&ScaleParams::new(0.0, 1.0, 1, 1.0));
        assert_eq!(strips.len(), 1);
        assert_eq!(strips[0].dimensions(), (SCALE_WIDTH, SCALE_HEIGHT));

        // Whole tick at row 20 spans the full width
        assert_eq!(*strips[0].get_pixel(49, 20), TICK_GREEN);
        // Minor tick at 0.1 (row 126) only reaches half way
        assert_eq!(*strips[0].get_pixel(10, 126), TICK_GREEN);
        assert_eq!(*strips[0].get_pixel(40, 126), WHITE);
        // Between ticks stays blank
        assert_eq!(*strips[0].get_pixel(10, 70), WHITE);
    }

    #[test]
    fn test_labels_have_ink() {
        let strip = &renderer().render(&ScaleParams::new(0.0, 1.0, 1, 1.0))[0];
        let is_ink = |x: u32, y: u32| {
            let p = *strip.get_pixel(x, y);
            p != WHITE && p != TICK_GREEN
        };
        // "0.0" sits 15 px below its tick at row 20
        let first = (0..SCALE_WIDTH).flat_map(|x| (24..60).map(move |y| (x, y))).filter(|&(x, y)| is_ink(x, y)).count();
        assert!(first > 0);
        // "0.5" hangs below the half tick at row 550
        let half = (0..SCALE_WIDTH).flat_map(|x| (553..575).map(move |y| (x, y))).filter(|&(x, y)| is_ink(x, y)).count();
        assert!(half > 0);
    }

    #[test]
    fn test_range_longer_than_box_is_cut() {
        assert_eq!(visible_tick_count(1.0), 11);
        assert_eq!(visible_tick_count(1.5), 16);

        let ticks = compute_ticks(&ScaleParams::new(0.0, 1e9, 1, 1.0));
        assert_eq!(ticks.len(), 11);
        assert_eq!(ticks.last().unwrap().y, 1080.0);
    }

    #[test]
    fn test_render_two_strips() {
        let renderer = renderer();
        let encoded = renderer
            .render_encoded(&ScaleParams::new(0.0, 1.0, 2, 1.0), 90)
            .unwrap();
        assert_eq!(encoded.len(), 2);
        assert!(encoded.iter().all(|e| e.width == SCALE_WIDTH && e.height == SCALE_HEIGHT));
    }
}
