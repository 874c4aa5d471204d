/// Color utilities for generated and annotated images
///
/// Colors come from the configuration as hex strings ("#RRGGBB" or "RGB");
/// this module turns them into pixel values and supplies the fixed ones.

use image::Rgb;
use tracing::warn;

/// Background of generated depth scales
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Default tick color (PIL's "green")
pub const TICK_GREEN: Rgb<u8> = Rgb([0, 128, 0]);

/// Default label color
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Default sample marker color
pub const MARKER_RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Parse "#RRGGBB", "RRGGBB", "#RGB" or "RGB"
pub fn parse_hex(text: &str) -> Option<Rgb<u8>> {
    let hex = text.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
        }
        3 => {
            // Short form: each digit is doubled (#f80 = #ff8800)
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some(Rgb([channel(0)?, channel(1)?, channel(2)?]))
        }
        _ => None,
    }
}

/// Parse a configured color, falling back (with a warning) when invalid
pub fn color_or(text: &str, fallback: Rgb<u8>) -> Rgb<u8> {
    parse_hex(text).unwrap_or_else(|| {
        warn!("⚠️  Invalid color '{}', using default", text);
        fallback
    })
}
