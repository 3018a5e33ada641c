// ============================================================
// Layer 2 — LabelMapUseCase (create-label-map)
// ============================================================
// Scans a labelled text dataset and writes, for every label
// stream, the list of distinct labels it contains:
//
//   dataset line:   0.1 0.7 cat        stream "y", column 2
//   mapping file:   cat
//                   dog
//                   ...
//
// Labels keep the order in which they are first seen, so the
// line number of a label in the mapping file is its class id.
//
// If a stream's mapping file already exists the whole action
// has nothing to do and stops there.
//
// Reference: Rust Book §8 (Collections)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr, time::Instant};

use crate::data::{corpus::TextCorpus, label_reader::scan_labels};
use crate::domain::errors::ActionError;
use crate::infra::table_writer::write_label_mapping;

// ─── Configuration ───────────────────────────────────────────────────────────
/// One label column of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStream {
    pub name:         String,
    pub column:       usize,
    /// Falls back to the action-wide mapping file when absent
    pub mapping_file: Option<PathBuf>,
}

/// Parses `NAME:COLUMN` or `NAME:COLUMN:MAPPING_FILE`.
impl FromStr for LabelStream {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let name = parts.next().unwrap_or_default();
        if name.is_empty() {
            return Err(format!("'{s}': missing stream name (expected NAME:COLUMN[:FILE])"));
        }
        let column = parts
            .next()
            .ok_or_else(|| format!("'{s}': missing column (expected NAME:COLUMN[:FILE])"))?
            .parse::<usize>()
            .map_err(|e| format!("'{s}': bad column: {e}"))?;
        let mapping_file = parts.next().filter(|p| !p.is_empty()).map(PathBuf::from);

        Ok(Self { name: name.to_string(), column, mapping_file })
    }
}

/// Settings of one `create-label-map` run.
///
/// `label_mapping_file` is the fallback for streams that do not
/// name their own mapping file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelMapConfig {
    pub input_file:         PathBuf,
    pub label_streams:      Vec<LabelStream>,
    pub label_mapping_file: Option<PathBuf>,
}

/// What was written for one stream.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMapSummary {
    pub stream:       String,
    pub mapping_file: PathBuf,
    pub labels:       usize,
    pub records:      usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LabelMapOutcome {
    /// The mapping file exists; it is never overwritten
    AlreadyExists { mapping_file: PathBuf },
    Written(Vec<LabelMapSummary>),
}

// ─── LabelMapUseCase ─────────────────────────────────────────────────────────
/// Collects the distinct labels of each stream, one per line, in
/// the order they first appear in the dataset.
pub struct LabelMapUseCase {
    config: LabelMapConfig,
}

impl LabelMapUseCase {
    pub fn new(config: LabelMapConfig) -> Self {
        Self { config }
    }

    /// Scan the dataset once per stream and write its mapping file.
    ///
    /// Stops at the first stream whose mapping file already
    /// exists and reports `AlreadyExists` for it.
    pub fn execute(&self) -> Result<LabelMapOutcome> {
        let cfg = &self.config;
        if cfg.label_streams.is_empty() {
            bail!(ActionError::data("no labels found to process"));
        }

        let started = Instant::now();
        let corpus = TextCorpus::new(&cfg.input_file);
        let mut written = Vec::with_capacity(cfg.label_streams.len());

        for stream in &cfg.label_streams {
            let mapping_file = stream
                .mapping_file
                .as_ref()
                .or(cfg.label_mapping_file.as_ref())
                .ok_or_else(|| {
                    ActionError::config(format!(
                        "label stream '{}' has no mapping file and no labelMappingFile is set",
                        stream.name
                    ))
                })?;

            if mapping_file.exists() {
                tracing::info!(
                    "Label mapping file '{}' already exists, no work to do",
                    mapping_file.display()
                );
                return Ok(LabelMapOutcome::AlreadyExists { mapping_file: mapping_file.clone() });
            }

            let scan = scan_labels(&corpus, stream.column)?;
            if scan.labels.is_empty() {
                bail!(ActionError::data(format!(
                    "no labels found for stream '{}' in '{}'",
                    stream.name,
                    cfg.input_file.display()
                )));
            }

            write_label_mapping(mapping_file, &scan.labels)?;
            tracing::info!(
                "Stream '{}': {} records, {} labels written to '{}'",
                stream.name,
                scan.records,
                scan.labels.len(),
                mapping_file.display()
            );

            written.push(LabelMapSummary {
                stream:       stream.name.clone(),
                mapping_file: mapping_file.clone(),
                labels:       scan.labels.len(),
                records:      scan.records,
            });
        }

        tracing::info!("Label mapping done in {:.2?}", started.elapsed());
        Ok(LabelMapOutcome::Written(written))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::category;
    use std::fs;

    const DATASET: &str = "0.1 0.7 cat\n0.3 0.2 dog\n\n0.9 0.4 cat\n0.5 0.5 bird\n";

    #[test]
    fn test_parse_label_stream() {
        let s: LabelStream = "labels:2".parse().unwrap();
        assert_eq!(s, LabelStream { name: "labels".into(), column: 2, mapping_file: None });

        let s: LabelStream = "labels:0:out/map.txt".parse().unwrap();
        assert_eq!(s.mapping_file, Some(PathBuf::from("out/map.txt")));

        assert!("labels".parse::<LabelStream>().is_err());
        assert!("labels:x".parse::<LabelStream>().is_err());
        assert!(":1".parse::<LabelStream>().is_err());
    }

    #[test]
    fn test_writes_labels_in_first_seen_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.txt");
        fs::write(&input, DATASET).unwrap();
        let mapping = dir.path().join("labels.map");

        let config = LabelMapConfig {
            input_file:         input,
            label_streams:      vec!["labels:2".parse().unwrap()],
            label_mapping_file: Some(mapping.clone()),
        };
        let outcome = LabelMapUseCase::new(config).execute().unwrap();

        assert_eq!(
            outcome,
            LabelMapOutcome::Written(vec![LabelMapSummary {
                stream:       "labels".into(),
                mapping_file: mapping.clone(),
                labels:       3,
                records:      4,
            }])
        );
        assert_eq!(fs::read_to_string(&mapping).unwrap(), "cat\ndog\nbird\n");
    }

    #[test]
    fn test_existing_mapping_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.txt");
        fs::write(&input, DATASET).unwrap();
        let mapping = dir.path().join("labels.map");
        fs::write(&mapping, "keep\n").unwrap();

        let config = LabelMapConfig {
            input_file:         input,
            label_streams:      vec!["labels:2".parse().unwrap()],
            label_mapping_file: Some(mapping.clone()),
        };
        let outcome = LabelMapUseCase::new(config).execute().unwrap();

        assert_eq!(outcome, LabelMapOutcome::AlreadyExists { mapping_file: mapping.clone() });
        assert_eq!(fs::read_to_string(&mapping).unwrap(), "keep\n");
    }

    #[test]
    fn test_no_streams_is_data_error() {
        let err = LabelMapUseCase::new(LabelMapConfig::default()).execute().unwrap_err();
        assert!(matches!(category(&err), Some(ActionError::Data(_))));
    }

    #[test]
    fn test_no_mapping_file_is_config_error() {
        let config = LabelMapConfig {
            input_file:    "data.txt".into(),
            label_streams: vec!["labels:2".parse().unwrap()],
            ..Default::default()
        };
        let err = LabelMapUseCase::new(config).execute().unwrap_err();
        assert!(matches!(category(&err), Some(ActionError::Config(_))));
    }

    #[test]
    fn test_short_line_is_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.txt");
        fs::write(&input, "0.1 0.7 cat\n0.3\n").unwrap();
        let mapping = dir.path().join("labels.map");

        let config = LabelMapConfig {
            input_file:         input,
            label_streams:      vec!["labels:2".parse().unwrap()],
            label_mapping_file: Some(mapping.clone()),
        };
        let err = LabelMapUseCase::new(config).execute().unwrap_err();
        assert!(matches!(category(&err), Some(ActionError::Data(_))));
        assert!(!mapping.exists());
    }
}
