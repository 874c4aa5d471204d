/// Shared data structures for the catalog pipeline
///
/// These structs represent the data model that flows between
/// the table loader, the derivation stages and the catalog assembler.

use std::collections::BTreeSet;
use std::path::PathBuf;

/// Sentinel for values that could not be derived
pub const NOT_AVAILABLE: &str = "N/A";

/// Study string for a sample without any performed analysis
pub const NO_STUDIES: &str = "No studies";

/// A continuous drilled depth range reconstructed from one or more records
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Top of the interval (m)
    pub start: f64,
    /// Bottom of the interval (m)
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Closed-range containment
    pub fn contains(&self, depth: f64) -> bool {
        depth >= self.start && depth <= self.end
    }
}

/// One row of the core log
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Zero-based data row in the source sheet (header excluded)
    pub row: usize,
    /// Core box number; rows without one are kept but never catalogued
    pub box_id: Option<i64>,
    /// Logged run start (m)
    pub start: Option<f64>,
    /// Logged run end (m)
    pub end: Option<f64>,
    /// Measured recovered core length (m)
    pub measured: Option<f64>,
    /// Merged interval this run belongs to (None = unresolved)
    pub interval: Option<Interval>,
    /// Recovery text, `NOT_AVAILABLE` until computed
    pub recovery: String,
    /// Box photograph under daylight
    pub photo: Option<PathBuf>,
    /// Box photograph under UV light
    pub uv_photo: Option<PathBuf>,
    /// Well label derived from the photo filename
    pub well: Option<String>,
}

impl Record {
    pub fn new(row: usize, box_id: Option<i64>, start: Option<f64>, end: Option<f64>) -> Self {
        Self {
            row,
            box_id,
            start,
            end,
            recovery: NOT_AVAILABLE.to_string(),
            ..Default::default()
        }
    }

    pub fn with_measured(mut self, measured: Option<f64>) -> Self {
        self.measured = measured;
        self
    }

    /// "start-end" of the resolved interval, or N/A
    pub fn interval_text(&self) -> String {
        match self.interval {
            Some(iv) => format!("{}-{}", format_number(iv.start), format_number(iv.end)),
            None => NOT_AVAILABLE.to_string(),
        }
    }
}

/// A laboratory sample taken from a core box
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    /// Box the sample was taken from (integer part of the number)
    pub box_id: i64,
    /// Sample number, e.g. 4.71 = box 4, offset 0.71
    pub number: f64,
    /// Absolute depth (m), rounded to centimetres
    pub depth: Option<f64>,
    /// Names of the analyses performed
    pub studies: BTreeSet<String>,
}

impl SampleRecord {
    /// Normalized position inside the box, in [0, 1)
    pub fn offset(&self) -> f64 {
        self.number - self.number.floor()
    }

    /// Comma-joined study list, or the "no studies" marker
    pub fn studies_text(&self) -> String {
        if self.studies.is_empty() {
            NO_STUDIES.to_string()
        } else {
            self.studies.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

/// Format a float the way spreadsheet users expect to read it back:
/// whole numbers keep one decimal ("12.0"), others use the shortest
/// representation that round-trips ("0.85").
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1.0");
        assert_eq!(format_number(0.85), "0.85");
        assert_eq!(format_number(-3.0), "-3.0");
        assert_eq!(format_number(123.45), "123.45");
    }

    #[test]
    fn test_interval_text_unresolved() {
        let record = Record::new(0, Some(1), None, None);
        assert_eq!(record.interval_text(), NOT_AVAILABLE);
        assert_eq!(record.recovery, NOT_AVAILABLE);
    }

    #[test]
    fn test_interval_text_resolved() {
        let mut record = Record::new(0, Some(1), Some(10.0), Some(10.5));
        record.interval = Some(Interval::new(10.0, 12.5));
        assert_eq!(record.interval_text(), "10.0-12.5");
    }

    #[test]
    fn test_sample_offset() {
        let sample = SampleRecord {
            box_id: 4,
            number: 4.71,
            depth: None,
            studies: BTreeSet::new(),
        };
        assert!((sample.offset() - 0.71).abs() < 1e-9);
        assert_eq!(sample.studies_text(), NO_STUDIES);
    }
}
