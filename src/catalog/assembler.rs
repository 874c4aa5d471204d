use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::document::{BoxSection, Catalog, Figure, SampleBlock};
use super::progress::{fraction, ProgressSink};
use crate::color::{color_or, BLACK, MARKER_RED, TICK_GREEN};
use crate::error::{CatalogError, CatalogResult};
use crate::photo::annotate::SampleAnnotator;
use crate::render::assets::Assets;
use crate::render::encode::{encode_jpeg, fit_for_embedding, load_for_embedding, EncodedImage};
use crate::render::scale::{DepthScaleRenderer, ScaleParams};
use crate::samples::SampleSet;
use crate::state::config::CatalogConfig;
use crate::state::data::{format_number, Record, SampleRecord, NOT_AVAILABLE};
use crate::state::dataset::Dataset;

/// Builds the per-box catalog structure from a processed dataset
pub struct CatalogAssembler<'a> {
    config: &'a CatalogConfig,
    assets: &'a Assets,
    scale: DepthScaleRenderer,
    annotator: SampleAnnotator,
}

impl<'a> CatalogAssembler<'a> {
    pub fn new(config: &'a CatalogConfig, assets: &'a Assets) -> Self {
        let palette = &config.palette;
        let label = color_or(&palette.label, BLACK);

        Self {
            config,
            assets,
            scale: DepthScaleRenderer::new(assets.font.face().clone())
                .with_colors(color_or(&palette.tick, TICK_GREEN), label),
            annotator: SampleAnnotator::new(assets.font.face().clone())
                .with_colors(color_or(&palette.marker, MARKER_RED), label),
        }
    }

    /// One section per box in ascending box order. Progress is reported
    /// after every box.
    pub fn assemble(
        &self,
        dataset: &Dataset,
        samples: Option<&SampleSet>,
        progress: &mut dyn ProgressSink,
    ) -> CatalogResult<Catalog> {
        let groups = dataset.group_by_box();
        if groups.is_empty() {
            return Err(CatalogError::NoData);
        }

        let samples_by_box = samples.map(SampleSet::by_box).unwrap_or_default();
        let total = groups.len();
        info!("📚 Assembling catalog for {} boxes", total);

        let mut sections = Vec::with_capacity(total);
        for (done, (box_id, records)) in groups.iter().enumerate() {
            let box_samples = samples_by_box.get(box_id).map(Vec::as_slice).unwrap_or(&[]);
            sections.push(self.build_section(*box_id, records, box_samples)?);
            progress.report(fraction(done + 1, total));
        }

        Ok(Catalog {
            title: Catalog::title_for(dataset.well_label()),
            intro: Catalog::intro_text(),
            sections,
        })
    }

    /// Section for one box. `records` are the box's rows in source order;
    /// the first one supplies the top/bottom depths and the photos.
    pub fn build_section(
        &self,
        box_id: i64,
        records: &[&Record],
        samples: &[SampleRecord],
    ) -> CatalogResult<BoxSection> {
        let first = records.first().ok_or(CatalogError::NoData)?;
        let quality = self.config.jpeg_quality;
        let segments = self.config.segments_per_box;

        let mut figures = Vec::new();
        match (first.start, first.end) {
            (Some(top), Some(bottom)) => {
                let params = ScaleParams::new(top, bottom, segments, self.config.box_length);
                figures.extend(
                    self.scale
                        .render_encoded(&params, quality)?
                        .into_iter()
                        .map(Figure::DepthScale),
                );
            }
            _ => warn!("⚠️  Box {}: no start/end depth, depth scale skipped", box_id),
        }

        if let Some(photo) = self.photo(first.photo.as_deref(), samples) {
            figures.push(Figure::Photo(photo));
        }
        figures.push(Figure::Separator(Arc::clone(&self.assets.separator)));
        if let Some(photo) = self.photo(first.uv_photo.as_deref(), samples) {
            figures.push(Figure::UvPhoto(photo));
        }

        debug!("Box {}: {} records, {} samples, {} figures", box_id, records.len(), samples.len(), figures.len());

        Ok(BoxSection {
            box_id,
            label: format!("Box {}", box_id),
            interval_lines: interval_lines(records),
            top: bracketed(first.start),
            bottom: bracketed(first.end),
            samples: (!samples.is_empty()).then(|| sample_block(samples)),
            figures,
            reference_scale: Arc::clone(&self.assets.reference_scale),
        })
    }

    /// Load a box photo for embedding, annotated when there are samples.
    /// An unreadable photo is left out of the section.
    fn photo(&self, path: Option<&Path>, samples: &[SampleRecord]) -> Option<EncodedImage> {
        let path = path?;
        let quality = self.config.jpeg_quality;

        let result = if samples.is_empty() {
            load_for_embedding(path, quality)
        } else {
            self.annotator
                .annotate_file(path, samples, self.config.segments_per_box)
                .and_then(|annotated| encode_jpeg(&fit_for_embedding(annotated), quality))
        };

        match result {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("⚠️  Could not load photo {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// "Drilling interval: a-b" / "recovery: ..." for the first record, then
/// bare interval and recovery lines for the rest
fn interval_lines(records: &[&Record]) -> Vec<String> {
    let mut lines = Vec::with_capacity(records.len() * 2);
    for (i, record) in records.iter().enumerate() {
        if i == 0 {
            lines.push(format!("Drilling interval: {}", record.interval_text()));
        } else {
            lines.push(record.interval_text());
        }
        lines.push(format!("recovery: {}", record.recovery));
    }
    lines
}

fn bracketed(depth: Option<f64>) -> String {
    format!("[{}]", depth.map(format_number).unwrap_or_else(|| NOT_AVAILABLE.to_string()))
}

fn sample_block(samples: &[SampleRecord]) -> SampleBlock {
    SampleBlock {
        numbers: samples
            .iter()
            .map(|s| match s.depth {
                Some(depth) => format!("{} ({} m)", format_number(s.number), format_number(depth)),
                None => format_number(s.number),
            })
            .collect(),
        studies: samples
            .iter()
            .map(|s| format!("{}: {}", format_number(s.number), s.studies_text()))
            .collect(),
    }
}
