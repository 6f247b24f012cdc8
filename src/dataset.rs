//! Dataset assembly and column schema derivation.
//!
//! Collects completed records into a sparse table whose columns are the
//! union of all field names, infers one polars dtype per column, and
//! converts rows into a `DataFrame` for display and export.

use crate::constants::SOURCE_FILE_COLUMN;
use crate::models::{Record, ScalarValue};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Storage type inferred for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    String,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ColumnKind::String)
    }

    /// Widen to a kind that can hold both. Integers promote to floats, and
    /// anything mixed with text becomes text.
    fn widen(self, other: ColumnKind) -> ColumnKind {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnKind::String, _) | (_, ColumnKind::String) => ColumnKind::String,
            _ => ColumnKind::Float,
        }
    }

    fn of(value: &ScalarValue) -> ColumnKind {
        match value {
            ScalarValue::Integer(_) => ColumnKind::Integer,
            ScalarValue::Float(_) => ColumnKind::Float,
            ScalarValue::String(_) => ColumnKind::String,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::String => "string",
        }
    }
}

/// One column of the derived schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// Records for one algorithm plus their derived column schema.
///
/// `source_file` is always the first column; field columns follow in
/// name order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    columns: Vec<ColumnSpec>,
}

impl Dataset {
    /// Assemble records, dropping any field listed in `excluded`
    pub fn from_records(mut records: Vec<Record>, excluded: &[String]) -> Self {
        if !excluded.is_empty() {
            for record in &mut records {
                record.fields.retain(|name, _| !excluded.contains(name));
            }
            debug!("Excluded {} configured feature columns", excluded.len());
        }

        let columns = derive_columns(&records);
        Self { records, columns }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// All columns, `source_file` first
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Unique source files, sorted
    pub fn unique_files(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .map(|r| r.source_file.as_str())
            .collect()
    }

    /// Rows per source file, sorted by file name
    pub fn rows_per_file(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.source_file.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Keep only records for which `keep` returns true, re-deriving the schema
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&Record) -> bool,
    {
        self.records.retain(keep);
        self.columns = derive_columns(&self.records);
    }

    /// Convert the whole dataset into a `DataFrame`
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let names: Vec<&str> = self.column_names();
        build_frame(self.records.iter(), &self.columns, &names)
    }

    /// Build a frame of selected rows and columns, for diagnostics.
    ///
    /// Columns keep the dtype they have in the full dataset. Unknown column
    /// names are ignored.
    pub fn frame_for_rows(&self, rows: &[usize], columns: &[&str]) -> PolarsResult<DataFrame> {
        let records = rows.iter().filter_map(|&i| self.records.get(i));
        build_frame(records, &self.columns, columns)
    }
}

fn derive_columns(records: &[Record]) -> Vec<ColumnSpec> {
    let mut kinds: BTreeMap<&str, ColumnKind> = BTreeMap::new();
    for record in records {
        for (name, value) in &record.fields {
            let kind = ColumnKind::of(value);
            kinds
                .entry(name.as_str())
                .and_modify(|existing| *existing = existing.widen(kind))
                .or_insert(kind);
        }
    }

    let mut columns = Vec::with_capacity(kinds.len() + 1);
    columns.push(ColumnSpec {
        name: SOURCE_FILE_COLUMN.to_string(),
        kind: ColumnKind::String,
    });
    columns.extend(kinds.into_iter().map(|(name, kind)| ColumnSpec {
        name: name.to_string(),
        kind,
    }));
    columns
}

fn build_frame<'a, I>(records: I, schema: &[ColumnSpec], names: &[&str]) -> PolarsResult<DataFrame>
where
    I: Iterator<Item = &'a Record> + Clone,
{
    let mut frame_columns = Vec::with_capacity(names.len());

    for name in names {
        let Some(spec) = schema.iter().find(|c| c.name == *name) else {
            continue;
        };
        let series = if spec.name == SOURCE_FILE_COLUMN {
            let values: Vec<&str> = records.clone().map(|r| r.source_file.as_str()).collect();
            Series::new(spec.name.as_str().into(), values)
        } else {
            column_series(records.clone(), spec)
        };
        frame_columns.push(Column::from(series));
    }

    DataFrame::new(frame_columns)
}

fn column_series<'a, I>(records: I, spec: &ColumnSpec) -> Series
where
    I: Iterator<Item = &'a Record>,
{
    let name: PlSmallStr = spec.name.as_str().into();
    let values = records.map(|r| r.get(&spec.name));

    match spec.kind {
        ColumnKind::Integer => {
            let data: Vec<Option<i64>> = values
                .map(|v| match v {
                    Some(ScalarValue::Integer(i)) => Some(*i),
                    _ => None,
                })
                .collect();
            Series::new(name, data)
        }
        ColumnKind::Float => {
            let data: Vec<Option<f64>> = values.map(|v| v.and_then(ScalarValue::as_f64)).collect();
            Series::new(name, data)
        }
        ColumnKind::String => {
            let data: Vec<Option<String>> = values.map(|v| v.map(|v| v.to_string())).collect();
            Series::new(name, data)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldMap;

    fn record(file: &str, fields: &[(&str, ScalarValue)]) -> Record {
        let map: FieldMap = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Record::new(file, map)
    }

    #[test]
    fn test_schema_is_union_with_source_first() {
        let dataset = Dataset::from_records(
            vec![
                record("a.log", &[("b", ScalarValue::Integer(1))]),
                record("b.log", &[("a", ScalarValue::Integer(2))]),
            ],
            &[],
        );
        assert_eq!(dataset.column_names(), vec!["source_file", "a", "b"]);
    }

    #[test]
    fn test_column_kind_widening() {
        let dataset = Dataset::from_records(
            vec![
                record(
                    "a.log",
                    &[
                        ("ints", ScalarValue::Integer(1)),
                        ("mixed", ScalarValue::Integer(1)),
                        ("text", ScalarValue::Float(0.5)),
                    ],
                ),
                record(
                    "a.log",
                    &[
                        ("ints", ScalarValue::Integer(2)),
                        ("mixed", ScalarValue::Float(2.5)),
                        ("text", ScalarValue::String("x".into())),
                    ],
                ),
            ],
            &[],
        );
        assert_eq!(dataset.column("ints").unwrap().kind, ColumnKind::Integer);
        assert_eq!(dataset.column("mixed").unwrap().kind, ColumnKind::Float);
        assert_eq!(dataset.column("text").unwrap().kind, ColumnKind::String);
        assert_eq!(dataset.column("source_file").unwrap().kind, ColumnKind::String);
    }

    #[test]
    fn test_excluded_columns_are_dropped() {
        let dataset = Dataset::from_records(
            vec![record(
                "a.log",
                &[
                    ("keep", ScalarValue::Integer(1)),
                    ("drop_me", ScalarValue::Integer(2)),
                ],
            )],
            &["drop_me".to_string()],
        );
        assert!(dataset.has_column("keep"));
        assert!(!dataset.has_column("drop_me"));
    }

    #[test]
    fn test_to_dataframe_fills_missing_with_nulls() {
        let dataset = Dataset::from_records(
            vec![
                record("a.log", &[("x", ScalarValue::Integer(1))]),
                record("b.log", &[("y", ScalarValue::Float(2.0))]),
            ],
            &[],
        );
        let df = dataset.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        assert_eq!(df.column("x").unwrap().null_count(), 1);
        assert_eq!(df.column("y").unwrap().null_count(), 1);
        assert_eq!(df.column("x").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("y").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_frame_for_rows_selects_subset() {
        let dataset = Dataset::from_records(
            vec![
                record("a.log", &[("x", ScalarValue::Integer(1))]),
                record("b.log", &[("x", ScalarValue::Integer(2))]),
                record("c.log", &[("x", ScalarValue::Integer(3))]),
            ],
            &[],
        );
        let df = dataset
            .frame_for_rows(&[0, 2], &["source_file", "x", "unknown"])
            .unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_retain_rederives_schema() {
        let mut dataset = Dataset::from_records(
            vec![
                record("a.log", &[("x", ScalarValue::Integer(1))]),
                record("b.log", &[("y", ScalarValue::String("s".into()))]),
            ],
            &[],
        );
        dataset.retain(|r| r.source_file == "a.log");
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.column_names(), vec!["source_file", "x"]);
    }

    #[test]
    fn test_rows_per_file() {
        let dataset = Dataset::from_records(
            vec![
                record("b.log", &[("x", ScalarValue::Integer(1))]),
                record("a.log", &[("x", ScalarValue::Integer(2))]),
                record("b.log", &[("x", ScalarValue::Integer(3))]),
            ],
            &[],
        );
        let counts = dataset.rows_per_file();
        assert_eq!(counts.get("a.log"), Some(&1));
        assert_eq!(counts.get("b.log"), Some(&2));
        assert_eq!(dataset.unique_files().len(), 2);
    }
}
