/// Catalog document structure
///
/// The assembler fills these structs; document writers only read them.
/// Every raster is already encoded, so a writer never decodes or resizes.

use std::sync::Arc;

use crate::render::encode::EncodedImage;
use crate::state::config::PageLayout;

/// Explanation printed under the title
pub const INTRO_TEXT: [&str; 4] = [
    "Depths are given along the core.",
    "Sample numbers are placed next to the points where the samples were drilled.",
    "A sample number consists of two numbers separated by a point.",
    "The first is the box number, the second the position of the sampling point within the box.",
];

/// A raster placed in the figure row of a box section
#[derive(Debug, Clone)]
pub enum Figure {
    /// Generated depth scale strip
    DepthScale(EncodedImage),
    /// Daylight photo, annotated when the box has samples
    Photo(EncodedImage),
    /// Fixed graphic between the two photos
    Separator(Arc<EncodedImage>),
    /// UV photo, annotated when the box has samples
    UvPhoto(EncodedImage),
}

impl Figure {
    pub fn image(&self) -> &EncodedImage {
        match self {
            Figure::DepthScale(img) | Figure::Photo(img) | Figure::UvPhoto(img) => img,
            Figure::Separator(img) => &**img,
        }
    }

    /// Printed height; everything but the separator uses the figure height
    pub fn height_cm(&self, page: &PageLayout) -> f32 {
        match self {
            Figure::Separator(_) => page.separator_height_cm,
            _ => page.figure_height_cm,
        }
    }

    /// Shared assets are embedded once per document
    pub fn shared(&self) -> Option<&Arc<EncodedImage>> {
        match self {
            Figure::Separator(img) => Some(img),
            _ => None,
        }
    }
}

/// Sample lines of one box
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleBlock {
    /// "4.71 (1203.46 m)"
    pub numbers: Vec<String>,
    /// "4.71: XRD, Thin section"
    pub studies: Vec<String>,
}

/// Everything printed for one core box
#[derive(Debug, Clone)]
pub struct BoxSection {
    pub box_id: i64,
    /// "Box 4"
    pub label: String,
    /// Drilling interval and recovery, one pair of lines per record
    pub interval_lines: Vec<String>,
    /// "[12.0]"
    pub top: String,
    /// "[13.0]"
    pub bottom: String,
    pub samples: Option<SampleBlock>,
    /// Left to right: scale(s), photo, separator, UV photo
    pub figures: Vec<Figure>,
    /// Shown in its own column at the right
    pub reference_scale: Arc<EncodedImage>,
}

/// A complete catalog ready for a writer
#[derive(Debug, Clone)]
pub struct Catalog {
    pub title: String,
    pub intro: Vec<String>,
    pub sections: Vec<BoxSection>,
}

impl Catalog {
    pub fn title_for(well: Option<&str>) -> String {
        format!("Core photographs, well {}", well.unwrap_or(crate::state::data::NOT_AVAILABLE))
    }

    pub fn intro_text() -> Vec<String> {
        INTRO_TEXT.iter().map(|line| line.to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32) -> EncodedImage {
        EncodedImage {
            bytes: vec![0xFF, 0xD8],
            width,
            height,
        }
    }

    #[test]
    fn test_figure_heights() {
        let page = PageLayout::default();
        assert_eq!(Figure::Photo(image(10, 40)).height_cm(&page), 21.88);
        assert_eq!(Figure::Separator(Arc::new(image(10, 10))).height_cm(&page), 2.54);
    }

    #[test]
    fn test_title() {
        assert_eq!(Catalog::title_for(Some("12")), "Core photographs, well 12");
        assert_eq!(Catalog::title_for(None), "Core photographs, well N/A");
    }
}
