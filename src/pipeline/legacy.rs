//! Legacy single-line record parsing
//!
//! The Feasibility Jump heuristic predates the FEATURES/RESULT split and
//! prints each record on one `FJ:` line. No state is carried across lines.

use crate::constants::tags::FJ_LEGACY;
use crate::models::{Record, Tag, TaggedLine, source_name};
use crate::parser::parse_key_value_line;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct LegacyRecordParser {
    prefix: &'static str,
}

impl Default for LegacyRecordParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LegacyRecordParser {
    pub fn new() -> Self {
        Self { prefix: FJ_LEGACY }
    }

    /// Parse one line; `None` if it carries no fields
    pub fn parse_line(&self, line: &TaggedLine) -> Option<Record> {
        if line.tag != Tag::Legacy {
            return None;
        }

        let fields = parse_key_value_line(&line.payload, self.prefix);
        let record = Record::new(source_name(&line.source_file), fields);
        // a line whose only key was the reserved source column is empty now
        (!record.fields.is_empty()).then_some(record)
    }

    /// Parse all lines in input order
    pub fn parse(&self, lines: &[TaggedLine]) -> Vec<Record> {
        let records: Vec<Record> = lines.iter().filter_map(|l| self.parse_line(l)).collect();
        debug!(
            "Parsed {} legacy records from {} lines",
            records.len(),
            lines.len()
        );
        records
    }
}
