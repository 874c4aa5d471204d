/// Core recovery: measured core length against drilled run length

use crate::state::data::{format_number, Record, NOT_AVAILABLE};
use crate::state::dataset::Dataset;

/// Recovery text for one run, e.g. "0.85 m (85.0 %)".
///
/// Any missing or non-finite input, or a zero-length run, gives "N/A".
pub fn recovery_text(measured: Option<f64>, start: Option<f64>, end: Option<f64>) -> String {
    let (Some(measured), Some(start), Some(end)) = (measured, start, end) else {
        return NOT_AVAILABLE.to_string();
    };
    let length = end - start;
    if !measured.is_finite() || !length.is_finite() || length == 0.0 {
        return NOT_AVAILABLE.to_string();
    }

    let percentage = measured / length * 100.0;
    format!("{} m ({:.1} %)", format_number(measured), percentage)
}

/// Recovery for a record, from its logged run bounds
pub fn record_recovery(record: &Record) -> String {
    recovery_text(record.measured, record.start, record.end)
}

/// Stamp every record with its recovery text
pub fn apply_recovery(dataset: Dataset) -> Dataset {
    dataset.map_records(|mut record| {
        record.recovery = record_recovery(&record);
        record
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_format() {
        assert_eq!(recovery_text(Some(0.85), Some(0.0), Some(1.0)), "0.85 m (85.0 %)");
        assert_eq!(recovery_text(Some(1.0), Some(10.0), Some(11.5)), "1.0 m (66.7 %)");
    }

    #[test]
    fn test_zero_length_is_na() {
        assert_eq!(recovery_text(Some(0.5), Some(2.0), Some(2.0)), NOT_AVAILABLE);
    }

    #[test]
    fn test_missing_values_are_na() {
        assert_eq!(recovery_text(None, Some(0.0), Some(1.0)), NOT_AVAILABLE);
        assert_eq!(recovery_text(Some(0.5), None, Some(1.0)), NOT_AVAILABLE);
        assert_eq!(recovery_text(Some(0.5), Some(0.0), None), NOT_AVAILABLE);
        assert_eq!(recovery_text(Some(f64::NAN), Some(0.0), Some(1.0)), NOT_AVAILABLE);
    }

    #[test]
    fn test_over_recovery_is_reported() {
        // Swelling core can exceed the run length; report it as measured
        assert_eq!(recovery_text(Some(1.1), Some(0.0), Some(1.0)), "1.1 m (110.0 %)");
    }

    #[test]
    fn test_apply_recovery() {
        let dataset = Dataset::new(vec![
            Record::new(0, Some(1), Some(0.0), Some(1.0)).with_measured(Some(0.85)),
            Record::new(1, Some(1), Some(1.0), Some(2.0)),
        ]);
        let dataset = apply_recovery(dataset);
        assert_eq!(dataset.records()[0].recovery, "0.85 m (85.0 %)");
        assert_eq!(dataset.records()[1].recovery, NOT_AVAILABLE);
    }
}
