// ============================================================
// Layer 6 — Model Store
// ============================================================
// Loads and saves computation networks as JSON.
//
// File layout (pretty-printed):
//   {
//     "nodes": [
//       { "name": "features", "op": { "kind": "Input", "rows": 3 } },
//       { "name": "W0", "op": { "kind": "LearnableParameter",
//                               "value": { "rows": 4, "cols": 3, "data": [...] } } },
//       { "name": "h0", "op": { "kind": "Times" }, "inputs": ["W0", "features"] }
//     ],
//     "outputs": ["h0"]
//   }
//
// A loaded model is validated before it is handed out, and a
// model is validated again before it is written, so a broken
// graph never reaches disk.
//
// Reference: serde_json crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, io::Write, path::Path};

use crate::domain::errors::ActionError;
use crate::infra::atomic_file::write_atomically;
use crate::ml::network::Network;

pub struct ModelStore;

impl ModelStore {
    /// Read and validate a network from `path`.
    pub fn load(path: &Path) -> Result<Network> {
        let json = fs::read_to_string(path).map_err(|e| ActionError::io(path, e))?;

        let net: Network = serde_json::from_str(&json).map_err(|e| {
            ActionError::data(format!("'{}' is not a valid model file: {e}", path.display()))
        })?;
        net.validate()
            .with_context(|| format!("model '{}' failed validation", path.display()))?;

        tracing::info!(
            "Loaded model '{}' ({} nodes, {} learnable values)",
            path.display(),
            net.nodes().len(),
            net.parameter_count()
        );
        Ok(net)
    }

    /// Validate and atomically write `net` to `path`.
    pub fn save(net: &Network, path: &Path) -> Result<()> {
        net.validate().context("refusing to save an invalid model")?;

        let json = serde_json::to_string_pretty(net).context("failed to serialise model")?;
        write_atomically(path, |w| w.write_all(json.as_bytes()))?;

        tracing::info!("Saved model to '{}'", path.display());
        Ok(())
    }
}
