/// CSV export of processed tables
///
/// Writes the processed core log (with derived intervals, recovery and
/// photo paths) and the merged sample table, so results can be checked or
/// edited in a spreadsheet.

use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::error::{CatalogError, CatalogResult};
use crate::samples::SampleSet;
use crate::state::data::format_number;
use crate::state::dataset::Dataset;

pub const RECORD_HEADERS: [&str; 10] = [
    "Well",
    "Box",
    "Start",
    "End",
    "Interval start",
    "Interval end",
    "Measured",
    "Recovery",
    "Photo",
    "UV photo",
];

pub const SAMPLE_HEADERS: [&str; 4] = ["Box", "Sample number", "Depth", "Studies"];

fn number(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

fn path_text(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}

/// Write the processed records as CSV
pub fn write_records<W: Write>(dataset: &Dataset, out: W) -> CatalogResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(RECORD_HEADERS)?;

    for record in dataset.records() {
        writer.write_record([
            record.well.clone().unwrap_or_default(),
            record.box_id.map(|b| b.to_string()).unwrap_or_default(),
            number(record.start),
            number(record.end),
            number(record.interval.map(|iv| iv.start)),
            number(record.interval.map(|iv| iv.end)),
            number(record.measured),
            record.recovery.clone(),
            path_text(record.photo.as_deref()),
            path_text(record.uv_photo.as_deref()),
        ])?;
    }

    writer.flush().map_err(CatalogError::DocumentWrite)?;
    Ok(())
}

/// Write the merged samples as CSV
pub fn write_samples<W: Write>(samples: &SampleSet, out: W) -> CatalogResult<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(SAMPLE_HEADERS)?;

    for sample in &samples.samples {
        writer.write_record([
            sample.box_id.to_string(),
            format_number(sample.number),
            number(sample.depth),
            sample.studies_text(),
        ])?;
    }

    writer.flush().map_err(CatalogError::DocumentWrite)?;
    Ok(())
}

fn create(path: &Path) -> CatalogResult<std::fs::File> {
    std::fs::File::create(path).map_err(|e| CatalogError::file_io(path, e))
}

/// Export processed records to a CSV file
pub fn export_records(dataset: &Dataset, path: &Path) -> CatalogResult<()> {
    write_records(dataset, create(path)?)?;
    info!("💾 Exported {} records to {}", dataset.len(), path.display());
    Ok(())
}

/// Export merged samples to a CSV file
pub fn export_samples(samples: &SampleSet, path: &Path) -> CatalogResult<()> {
    write_samples(samples, create(path)?)?;
    info!("💾 Exported {} samples to {}", samples.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{Interval, Record, SampleRecord};
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    #[test]
    fn test_write_records() {
        let mut record = Record::new(0, Some(3), Some(10.0), Some(10.5)).with_measured(Some(0.4));
        record.interval = Some(Interval::new(10.0, 12.0));
        record.recovery = "0.4 m (80.0 %)".into();
        record.photo = Some(PathBuf::from("/p/w_3.jpg"));
        record.well = Some("w".into());
        let dataset = Dataset::new(vec![record, Record::new(1, None, None, None)]);

        let mut out = Vec::new();
        write_records(&dataset, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Well,Box,Start,End,Interval start,Interval end,Measured,Recovery,Photo,UV photo");
        assert_eq!(lines[1], "w,3,10.0,10.5,10.0,12.0,0.4,0.4 m (80.0 %),/p/w_3.jpg,");
        assert_eq!(lines[2], ",,,,,,,N/A,,");
    }

    #[test]
    fn test_write_samples() {
        let samples = SampleSet {
            samples: vec![SampleRecord {
                box_id: 4,
                number: 4.71,
                depth: Some(1203.46),
                studies: BTreeSet::from(["Thin section".to_string(), "XRD".to_string()]),
            }],
            issues: vec![],
        };
        let mut out = Vec::new();
        write_samples(&samples, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(text.lines().nth(1), Some("4,4.71,1203.46,\"Thin section, XRD\""));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.csv");
        export_records(&Dataset::default(), &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }
}
