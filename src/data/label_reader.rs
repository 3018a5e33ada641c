// ============================================================
// Layer 4 — Label Column Reader
// ============================================================
// Reads a column-oriented text dataset (one record per line,
// fields separated by spaces or tabs) and collects the distinct
// values of one label column in first-seen order.
//
// Example, label column 2:
//   0.1 0.7 cat
//   0.3 0.2 dog
//   0.9 0.4 cat
// → labels ["cat", "dog"], 3 records
//
// Blank lines are skipped. A record that is too short to have
// the label column is a data error.
//
// Reference: Rust Book §8 (HashSet), §13 (Iterators)

use anyhow::Result;
use std::collections::HashSet;

use crate::data::corpus::tokenize;
use crate::domain::errors::ActionError;
use crate::domain::traits::LineSource;

/// Distinct labels of one stream plus the number of records seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelScan {
    pub labels:  Vec<String>,
    pub records: usize,
}

pub fn scan_labels(source: &dyn LineSource, column: usize) -> Result<LabelScan> {
    let mut seen = HashSet::new();
    let mut scan = LabelScan::default();

    for (i, line) in source.lines()?.enumerate() {
        let line = line?;
        let mut fields = tokenize(&line).peekable();
        if fields.peek().is_none() {
            continue;
        }

        let label = fields.nth(column).ok_or_else(|| {
            ActionError::data(format!(
                "line {}: no label in column {column}",
                i + 1
            ))
        })?;

        scan.records += 1;
        if seen.insert(label.to_string()) {
            scan.labels.push(label.to_string());
        }
    }

    Ok(scan)
}
