/// Laboratory sample sheet loading
///
/// The samples sheet is positional: the 2nd column holds the sample number
/// (integer part = box, fraction = position in the box), the 3rd the
/// absolute depth, and every column after that is one study, marked "+"
/// when it was performed. Rows with the same sample number are merged.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::state::data::{format_number, SampleRecord};
use crate::state::table::{Cell, Table};

const NUMBER_COLUMN: usize = 1;
const DEPTH_COLUMN: usize = 2;
const FIRST_STUDY_COLUMN: usize = 3;
const PERFORMED: &str = "+";

/// A data-quality problem found in the raw sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleIssue {
    /// No study column of the row is marked
    NoStudies { number: String },
    /// The sample number appears on more than one row
    Duplicate { number: String },
}

impl fmt::Display for SampleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleIssue::NoStudies { number } => write!(f, "Sample {}: no study data found", number),
            SampleIssue::Duplicate { number } => write!(f, "Duplicate sample number: {}", number),
        }
    }
}

/// Merged samples sorted by number, plus the issues found while reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    pub samples: Vec<SampleRecord>,
    pub issues: Vec<SampleIssue>,
}

impl SampleSet {
    /// Load and parse a samples sheet
    pub fn load(path: &Path) -> CatalogResult<Self> {
        Self::from_table(&Table::load(path)?)
    }

    /// Parse an already loaded samples sheet
    pub fn from_table(table: &Table) -> CatalogResult<Self> {
        if table.width() <= DEPTH_COLUMN {
            return Err(CatalogError::SamplesShape {
                required: DEPTH_COLUMN + 1,
                found: table.width(),
            });
        }

        let study_names: Vec<(usize, &str)> = table
            .headers
            .iter()
            .enumerate()
            .skip(FIRST_STUDY_COLUMN)
            .map(|(i, h)| (i, h.trim()))
            .collect();

        let mut merged: Vec<SampleRecord> = Vec::new();
        let mut skipped = 0usize;

        for row in 0..table.len() {
            let Some(number) = table.cell(row, NUMBER_COLUMN).as_f64() else {
                skipped += 1;
                continue;
            };

            let studies: BTreeSet<String> = study_names
                .iter()
                .filter(|(col, _)| is_performed(table.cell(row, *col)))
                .map(|(_, name)| name.to_string())
                .collect();

            match merged.iter_mut().find(|s| s.number == number) {
                // First box and depth win, studies accumulate
                Some(existing) => existing.studies.extend(studies),
                None => merged.push(SampleRecord {
                    box_id: number.floor() as i64,
                    number,
                    depth: table.cell(row, DEPTH_COLUMN).as_f64().map(round_cm),
                    studies,
                }),
            }
        }

        merged.sort_by(|a, b| a.number.total_cmp(&b.number));

        if skipped > 0 {
            warn!("⚠️  Skipped {} sample rows without a numeric sample number", skipped);
        }
        let issues = find_issues(table, &study_names);
        if !issues.is_empty() {
            warn!("⚠️  {} sample sheet issues found", issues.len());
        }
        info!("🧪 Loaded {} samples", merged.len());

        Ok(Self {
            samples: merged,
            issues,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Samples grouped by box, each group sorted by number
    pub fn by_box(&self) -> BTreeMap<i64, Vec<SampleRecord>> {
        let mut groups: BTreeMap<i64, Vec<SampleRecord>> = BTreeMap::new();
        for sample in &self.samples {
            groups.entry(sample.box_id).or_default().push(sample.clone());
        }
        groups
    }
}

fn is_performed(cell: &Cell) -> bool {
    matches!(cell, Cell::Text(text) if text.trim() == PERFORMED)
}

fn round_cm(depth: f64) -> f64 {
    (depth * 100.0).round() / 100.0
}

/// Rows without any "+" and sample numbers that occur more than once.
/// Runs over the raw rows, so unparseable numbers are reported too.
fn find_issues(table: &Table, study_names: &[(usize, &str)]) -> Vec<SampleIssue> {
    let mut issues = Vec::new();
    let mut seen: Vec<(String, usize)> = Vec::new();

    for row in 0..table.len() {
        let number = raw_number(table.cell(row, NUMBER_COLUMN));

        if !study_names.iter().any(|(col, _)| is_performed(table.cell(row, *col))) {
            issues.push(SampleIssue::NoStudies {
                number: number.clone(),
            });
        }

        match seen.iter_mut().find(|(n, _)| *n == number) {
            Some((_, count)) => *count += 1,
            None => seen.push((number, 1)),
        }
    }

    issues.extend(
        seen.into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(number, _)| SampleIssue::Duplicate { number }),
    );
    issues
}

/// Sample number as shown to the user
fn raw_number(cell: &Cell) -> String {
    match cell.as_f64() {
        Some(v) => format_number(v),
        None => cell.as_text(),
    }
}
