use std::collections::BTreeMap;
use tracing::{info, warn};

use super::config::ColumnNames;
use super::data::Record;
use super::table::Table;
use crate::error::{CatalogError, CatalogResult};

/// Column positions of the core log fields, resolved once per load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub box_id: usize,
    pub start: usize,
    pub end: usize,
    /// Optional: without it every recovery value is N/A
    pub measured: Option<usize>,
}

impl ColumnMap {
    /// Resolve configured names against the table headers.
    /// Box, start and end are required.
    pub fn resolve(table: &Table, names: &ColumnNames) -> CatalogResult<Self> {
        let require = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| CatalogError::missing_column(name, table.name.clone()))
        };

        let map = Self {
            box_id: require(&names.box_id)?,
            start: require(&names.start)?,
            end: require(&names.end)?,
            measured: table.column_index(&names.measured),
        };

        if map.measured.is_none() {
            warn!(
                "⚠️  Column '{}' not found in {}, recovery will be N/A",
                names.measured, table.name
            );
        }
        Ok(map)
    }
}

/// The per-run record set. Stages take it by value and hand back a new one;
/// nothing here is shared or global.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Build the record set from a loaded core log.
    /// Unparseable cells become missing values; they never fail the load.
    pub fn from_table(table: &Table, names: &ColumnNames) -> CatalogResult<Self> {
        let columns = ColumnMap::resolve(table, names)?;
        if table.is_empty() {
            warn!("⚠️  {} has a header but no data rows", table.name);
        }

        let records: Vec<Record> = (0..table.len())
            .map(|row| {
                Record::new(
                    row,
                    table.cell(row, columns.box_id).as_i64(),
                    table.cell(row, columns.start).as_f64(),
                    table.cell(row, columns.end).as_f64(),
                )
                .with_measured(columns.measured.and_then(|col| table.cell(row, col).as_f64()))
            })
            .collect();

        let without_box = records.iter().filter(|r| r.box_id.is_none()).count();
        if without_box > 0 {
            warn!("⚠️  {} rows have no box number and will not be catalogued", without_box);
        }

        info!("✅ Dataset loaded: {} records", records.len());
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Apply a per-record transformation, producing the next dataset
    pub fn map_records(self, f: impl FnMut(Record) -> Record) -> Self {
        Self {
            records: self.records.into_iter().map(f).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct box numbers in ascending order
    pub fn box_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.records.iter().filter_map(|r| r.box_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Records grouped by box in ascending box order, source order kept
    /// within each group. Rows without a box are left out.
    pub fn group_by_box(&self) -> BTreeMap<i64, Vec<&Record>> {
        let mut groups: BTreeMap<i64, Vec<&Record>> = BTreeMap::new();
        for record in &self.records {
            if let Some(box_id) = record.box_id {
                groups.entry(box_id).or_default().push(record);
            }
        }
        groups
    }

    /// Well label of the first record that has one
    pub fn well_label(&self) -> Option<&str> {
        self.records.iter().find_map(|r| r.well.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::table::Cell;

    fn log_table() -> Table {
        Table::from_rows(
            "log.xlsx",
            vec!["Box".into(), "ОТ".into(), "До".into(), "Замеры".into()],
            vec![
                vec![Cell::Number(2.0), Cell::Number(1.0), Cell::Number(2.0), Cell::Number(0.9)],
                vec![Cell::Number(1.0), Cell::Number(0.0), Cell::Number(1.0), Cell::Text("x".into())],
                vec![Cell::Empty, Cell::Number(2.0), Cell::Number(3.0), Cell::Empty],
                vec![Cell::Number(2.0), Cell::Text("1.5".into()), Cell::Empty, Cell::Empty],
            ],
        )
    }

    #[test]
    fn test_from_table_resolves_case_insensitively() {
        let dataset = Dataset::from_table(&log_table(), &ColumnNames::default()).unwrap();
        assert_eq!(dataset.len(), 4);

        let first = &dataset.records()[0];
        assert_eq!(first.box_id, Some(2));
        assert_eq!(first.start, Some(1.0));
        assert_eq!(first.measured, Some(0.9));

        // Bad measured text is coerced to missing, not an error
        assert_eq!(dataset.records()[1].measured, None);
        assert_eq!(dataset.records()[3].start, Some(1.5));
        assert_eq!(dataset.records()[3].end, None);
    }

    #[test]
    fn test_missing_required_column() {
        let table = Table::from_rows("log.xlsx", vec!["BOX".into(), "от".into()], vec![]);
        let err = Dataset::from_table(&table, &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, CatalogError::MissingColumn { ref column, .. } if column == "до"));
    }

    #[test]
    fn test_measured_column_optional() {
        let table = Table::from_rows(
            "log.xlsx",
            vec!["BOX".into(), "от".into(), "до".into()],
            vec![vec![Cell::Number(1.0), Cell::Number(0.0), Cell::Number(1.0)]],
        );
        let dataset = Dataset::from_table(&table, &ColumnNames::default()).unwrap();
        assert_eq!(dataset.records()[0].measured, None);
    }

    #[test]
    fn test_group_by_box() {
        let dataset = Dataset::from_table(&log_table(), &ColumnNames::default()).unwrap();
        let groups = dataset.group_by_box();

        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(groups[&2].len(), 2);
        assert_eq!(groups[&2][0].row, 0);
        assert_eq!(groups[&2][1].row, 3);
        assert_eq!(dataset.box_ids(), vec![1, 2]);
    }
}
