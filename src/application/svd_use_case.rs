// ============================================================
// Layer 2 — SvdUseCase (svd)
// ============================================================
// Compresses a trained model by replacing selected learnable
// matrices with low-rank products:
//
//   Step 1: Acquire the rules (inline regex or rule file)
//   Step 2: Check the model path
//   Step 3: Load the network                (Layer 6 - infra)
//   Step 4: Factor and rewire parameters    (Layer 5 - ml)
//   Step 5: Save the result, if asked to    (Layer 6 - infra)
//
// A rejected rule file or an empty model path is not fatal:
// the problem is logged and the action ends as Skipped
// without touching any file.
//
// Reference: Rust Book §9 (Error Handling)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::domain::errors::ActionError;
use crate::domain::svd_rule::{parse_rule_file, SvdRule, SvdRuleSet, RULE_FILE_USAGE};
use crate::infra::model_store::ModelStore;
use crate::ml::compressor::{CompressionReport, ModelSvdCompressor};

// ─── Configuration ───────────────────────────────────────────────────────────
/// Settings of one `svd` run.
///
/// Exactly one rule source is used: `node_name_regex` with
/// `keep_ratio` when the regex is set, otherwise the rule file
/// at `svd_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvdConfig {
    pub model_path:        PathBuf,
    pub output_model_path: Option<PathBuf>,
    /// Used together with `node_name_regex`
    pub keep_ratio:        f64,
    pub aligned_size:      usize,
    pub node_name_regex:   Option<String>,
    /// Rule file, consulted only when no regex is given
    pub svd_config:        Option<PathBuf>,
}

impl Default for SvdConfig {
    fn default() -> Self {
        Self {
            model_path:        PathBuf::new(),
            output_model_path: None,
            keep_ratio:        0.4,
            aligned_size:      8,
            node_name_regex:   None,
            svd_config:        None,
        }
    }
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq)]
pub enum SvdOutcome {
    /// Nothing was loaded or written
    Skipped { reason: String },

    /// `saved_to` is `None` when no output path was configured
    Compressed {
        report:   CompressionReport,
        saved_to: Option<PathBuf>,
    },
}

// ─── SvdUseCase ──────────────────────────────────────────────────────────────
/// Load a model, compress the parameters the rules select, save it.
///
/// Why is a broken rule file a skip and not an error?
///   The rule file is usually written by hand next to a long
///   pipeline. A typo logs the expected format and leaves the
///   model alone; the run reports `Skipped` with the reason.
///   An invalid inline regex is still a configuration error.
pub struct SvdUseCase {
    config: SvdConfig,
}

impl SvdUseCase {
    pub fn new(config: SvdConfig) -> Self {
        Self { config }
    }

    /// Acquire the rules, then load, compress and save the model.
    ///
    /// Nothing is loaded when the rules cannot be read or no model
    /// path is given; both come back as `Skipped`.
    pub fn execute(&self) -> Result<SvdOutcome> {
        let cfg = &self.config;

        // ── Step 1: Rules ─────────────────────────────────────────────────────
        let rules = match self.acquire_rules()? {
            Ok(rules) => rules,
            Err(reason) => return Ok(SvdOutcome::Skipped { reason }),
        };
        let rules = SvdRuleSet::compile(rules)?;
        tracing::info!("Using {} SVD rule(s)", rules.len());

        // ── Step 2: Model path ────────────────────────────────────────────────
        if cfg.model_path.as_os_str().is_empty() {
            tracing::error!("modelPath is empty; there is no model to compress");
            return Ok(SvdOutcome::Skipped { reason: "empty model path".to_string() });
        }

        // ── Step 3: Load ──────────────────────────────────────────────────────
        let mut net = ModelStore::load(&cfg.model_path)?;

        // ── Step 4: Compress ──────────────────────────────────────────────────
        let compressor = ModelSvdCompressor::new(rules, cfg.aligned_size);
        let report = compressor.compress(&mut net)?;
        tracing::info!(
            "Compressed {} parameter(s): {} → {} learnable values",
            report.compressed.len(),
            report.parameters_before,
            report.parameters_after
        );

        // ── Step 5: Save ──────────────────────────────────────────────────────
        let saved_to = match &cfg.output_model_path {
            Some(path) => {
                ModelStore::save(&net, path)?;
                Some(path.clone())
            }
            None => {
                tracing::info!("No outputModelPath given; the compressed model was not saved");
                None
            }
        };

        Ok(SvdOutcome::Compressed { report, saved_to })
    }

    /// `Ok(Err(reason))` means the rule file was rejected and the
    /// action should be skipped.
    fn acquire_rules(&self) -> Result<std::result::Result<Vec<SvdRule>, String>> {
        let cfg = &self.config;

        if let Some(regex) = &cfg.node_name_regex {
            if !(cfg.keep_ratio.is_finite() && cfg.keep_ratio > 0.0) {
                bail!(ActionError::config(format!(
                    "keepRatio must be a positive number, got {}",
                    cfg.keep_ratio
                )));
            }
            return Ok(Ok(vec![SvdRule::new(regex.clone(), cfg.keep_ratio)]));
        }

        let Some(path) = &cfg.svd_config else {
            bail!(ActionError::config("either nodeNameRegex or svdConfig must be given"));
        };

        let text = fs::read_to_string(path).map_err(|e| ActionError::io(path, e))?;
        match parse_rule_file(&text) {
            Ok(rules) => Ok(Ok(rules)),
            Err(e) => {
                tracing::error!("Rejected SVD rule file '{}': {e}", path.display());
                tracing::info!("{RULE_FILE_USAGE}");
                Ok(Err(format!("invalid rule file: {e}")))
            }
        }
    }
}
