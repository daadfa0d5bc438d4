//! Content-provider row parsing
//!
//! `content query` prints one record per line as `key=value, key=value, ...`.
//! Values are opaque strings at this stage; typing happens in the normalizer.

use crate::types::RawFieldMap;
use log::{debug, warn};

/// Lines starting with this token are provider headers, not records
pub const HEADER_TOKEN: &str = "Row:";

/// Separator between `key=value` segments
pub const FIELD_SEPARATOR: &str = ", ";

/// Parser for line-oriented content-provider output
pub struct RowParser;

impl RowParser {
    /// Parse one output line into a field map.
    ///
    /// Returns `None` for blank lines, header lines, and lines without any
    /// `key=value` segment.
    pub fn parse_line(line: &str) -> Option<RawFieldMap> {
        if line.trim().is_empty() || line.starts_with(HEADER_TOKEN) {
            return None;
        }

        let mut fields = RawFieldMap::new();
        for segment in line.split(FIELD_SEPARATOR) {
            if let Some((key, value)) = segment.split_once('=') {
                fields.insert(key.trim().to_string(), value.trim().to_string());
            }
        }

        if fields.is_empty() {
            None
        } else {
            Some(fields)
        }
    }

    /// Parse every record line of a query's stdout, logging each dropped line
    pub fn parse_output(output: &str) -> Vec<RawFieldMap> {
        let mut rows = Vec::new();
        for (line_num, line) in output.lines().enumerate() {
            match Self::parse_line(line) {
                Some(fields) => rows.push(fields),
                None if line.trim().is_empty() => {}
                None if line.starts_with(HEADER_TOKEN) => {
                    debug!("Skipping header line {}", line_num + 1);
                }
                None => warn!(
                    "Skipping line {}: no key=value fields in {:?}",
                    line_num + 1,
                    line
                ),
            }
        }
        rows
    }
}
