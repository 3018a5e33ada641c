// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every fatal condition an action can hit falls into one of
// three buckets:
//
//   Config — the user asked for something inconsistent or left
//            out a required setting
//   Data   — the inputs exist but cannot produce a result
//            (no words after cutoff, no labels, bad lines)
//   Io     — an output or model file cannot be read or written
//
// "Outputs already up to date" is NOT an error — use cases
// report it through their outcome enums instead.
//
// Use cases return anyhow::Result and wrap these values, so
// callers can still recover the category with downcast_ref.
//
// Reference: Rust Book §9 (Error Handling)
//            thiserror crate documentation

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ActionError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// Recover the action error category from an anyhow chain, if any.
pub fn category(err: &anyhow::Error) -> Option<&ActionError> {
    err.chain().find_map(|e| e.downcast_ref::<ActionError>())
}
