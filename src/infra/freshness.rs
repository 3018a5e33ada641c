// ============================================================
// Layer 6 — File Freshness (make mode)
// ============================================================
// `make`-style staleness check on modification times:
//
//   output missing                  → stale
//   input missing                   → up to date (input not required)
//   output older than input         → stale
//   otherwise                       → up to date
//
// Reference: std::fs::Metadata::modified

use std::{fs, path::Path, time::SystemTime};

use crate::domain::traits::FreshnessOracle;

#[derive(Debug, Clone, Copy, Default)]
pub struct FileFreshness;

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

impl FreshnessOracle for FileFreshness {
    fn is_up_to_date(&self, output: &Path, input: &Path) -> bool {
        let Some(output_time) = modified(output) else {
            return false;
        };
        match modified(input) {
            Some(input_time) => output_time >= input_time,
            None => true,
        }
    }
}
