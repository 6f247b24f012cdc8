//! Pairing of FEATURES and RESULT lines into training records
//!
//! Solvers may print several FEATURES lines (one per constraint block, say)
//! before one or more RESULT lines. Each file is merged independently: runs
//! of same-tag lines accumulate into one group, and a record is committed
//! when a FEATURES line follows a RESULT line, or when the file ends.
//!
//! Two kinds of incomplete groups are dropped on purpose: RESULT lines with
//! no preceding FEATURES, and trailing FEATURES that never got a RESULT.
//! Both come from runs that crashed or were cut off.

use crate::models::{Algorithm, FieldMap, Record, Tag, TaggedLine, source_name};
use crate::parser::parse_key_value_line;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Tag of the last line merged into a file's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum LastTag {
    #[default]
    None,
    Features,
    Result,
}

/// Merge state for one source file
#[derive(Debug, Default)]
pub struct FileMerger {
    source_file: String,
    current_features: FieldMap,
    current_results: FieldMap,
    last_tag: LastTag,
    records: Vec<Record>,
}

impl FileMerger {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            ..Default::default()
        }
    }

    /// Feed one parsed line. Empty field maps are ignored entirely and do
    /// not count as a tag change.
    pub fn push(&mut self, tag: Tag, fields: FieldMap) {
        if fields.is_empty() {
            return;
        }

        match tag {
            Tag::Features => {
                if self.last_tag == LastTag::Result {
                    self.commit();
                }
                self.current_features.extend(fields);
                self.last_tag = LastTag::Features;
            }
            Tag::Result => {
                self.current_results.extend(fields);
                self.last_tag = LastTag::Result;
            }
            Tag::Legacy => {}
        }
    }

    /// Close the file, committing the final group if it is complete
    pub fn finish(mut self) -> Vec<Record> {
        self.commit();
        self.records
    }

    /// Emit a record when both groups are populated. Otherwise nothing is
    /// reset, and a dangling group keeps accumulating.
    fn commit(&mut self) {
        if self.current_features.is_empty() || self.current_results.is_empty() {
            return;
        }

        let mut fields = std::mem::take(&mut self.current_features);
        fields.extend(std::mem::take(&mut self.current_results));
        let record = Record::new(self.source_file.clone(), fields);
        if !record.fields.is_empty() {
            self.records.push(record);
        }
    }
}

/// Pairs tagged lines into records for a FEATURES/RESULT algorithm
#[derive(Debug, Clone, Copy)]
pub struct PairingEngine {
    algorithm: Algorithm,
}

impl PairingEngine {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Pair lines from any number of files.
    ///
    /// Lines are bucketed by file and sorted by line number within each
    /// bucket before merging, so input order across or within files does
    /// not matter. Files are emitted in path order.
    pub fn pair(&self, lines: Vec<TaggedLine>) -> Vec<Record> {
        let mut buckets: BTreeMap<PathBuf, Vec<TaggedLine>> = BTreeMap::new();
        for line in lines {
            buckets.entry(line.source_file.clone()).or_default().push(line);
        }

        let file_count = buckets.len();
        let records: Vec<Record> = buckets
            .into_values()
            .flat_map(|bucket| self.pair_file(bucket))
            .collect();

        debug!(
            "Paired {} {} records from {} files",
            records.len(),
            self.algorithm,
            file_count
        );
        records
    }

    /// Run the merge state machine over one file's lines
    pub fn pair_file(&self, mut lines: Vec<TaggedLine>) -> Vec<Record> {
        let Some(first) = lines.first() else {
            return Vec::new();
        };

        let mut merger = FileMerger::new(source_name(&first.source_file));
        lines.sort_by_key(|line| line.line_number);

        for line in &lines {
            let Some(prefix) = self.algorithm.prefix(line.tag) else {
                continue;
            };
            merger.push(line.tag, parse_key_value_line(&line.payload, prefix));
        }

        merger.finish()
    }
}
