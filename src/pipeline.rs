/// Processing pipeline: core log + photo folder (+ samples) → processed data
///
/// Each stage takes the dataset by value and returns the next one:
/// load → photos → intervals → recovery. Samples are loaded alongside.

use std::path::Path;
use tracing::{info, warn};

use crate::depth::{apply_intervals, apply_recovery, IntervalIndex};
use crate::error::CatalogResult;
use crate::photo::matcher::{attach_photos, PhotoMatcher};
use crate::samples::{SampleIssue, SampleSet};
use crate::state::config::CatalogConfig;
use crate::state::dataset::Dataset;
use crate::state::table::Table;

/// Output of one processing run
#[derive(Debug, Clone, Default)]
pub struct ProcessedData {
    pub dataset: Dataset,
    pub intervals: IntervalIndex,
    pub samples: Option<SampleSet>,
}

impl ProcessedData {
    /// Data-quality issues of the samples sheet, if one was loaded
    pub fn sample_issues(&self) -> &[SampleIssue] {
        self.samples.as_ref().map(|s| s.issues.as_slice()).unwrap_or(&[])
    }

    /// Records with a daylight photo
    pub fn matched_records(&self) -> usize {
        self.dataset.records().iter().filter(|r| r.photo.is_some()).count()
    }
}

/// Run every stage on an already loaded table and photo list
pub fn process_table(
    config: &CatalogConfig,
    table: &Table,
    matcher: &PhotoMatcher,
    samples: Option<SampleSet>,
) -> CatalogResult<ProcessedData> {
    let dataset = Dataset::from_table(table, &config.columns)?;
    let dataset = attach_photos(dataset, matcher, &config.well_prefix);
    let (dataset, intervals) = apply_intervals(dataset, config.merge_tolerance);
    let dataset = apply_recovery(dataset);
    if intervals.is_empty() {
        warn!("⚠️  No valid start/end pairs, no intervals resolved");
    }

    info!(
        "✅ Processed {} records: {} intervals, {} boxes",
        dataset.len(),
        intervals.intervals().len(),
        dataset.box_ids().len()
    );

    Ok(ProcessedData {
        dataset,
        intervals,
        samples,
    })
}

/// Load the inputs from disk and run every stage
pub fn process(
    config: &CatalogConfig,
    data: &Path,
    photos: &Path,
    samples: Option<&Path>,
) -> CatalogResult<ProcessedData> {
    info!("📂 Loading core log {}", data.display());
    let table = Table::load(data)?;
    let matcher = PhotoMatcher::from_folder(photos)?;
    let samples = samples.map(SampleSet::load).transpose()?;

    process_table(config, &table, &matcher, samples)
}
