// ============================================================
// Layer 2 — PlotUseCase (plot)
// ============================================================
// Dumps a model's topology as a DOT file and, when an output
// file is requested, renders it with an external command:
//
//   Step 1: Validate the render settings
//   Step 2: Load the network           (Layer 6 - infra)
//   Step 3: Write the DOT file         (Layer 6 - infra)
//   Step 4: Run the render command     (Layer 6 - infra)
//
// Reference: Rust Book §10 (Generic Types and Traits)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::errors::ActionError;
use crate::domain::traits::DiagramRenderer;
use crate::infra::{
    model_store::ModelStore,
    renderer::{write_dot, DotRenderer, ShellCommandRunner},
};

// ─── Configuration ───────────────────────────────────────────────────────────
/// Settings of one `plot` run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlotConfig {
    pub model_path:      PathBuf,
    /// Defaults to `{model_path}.dot`
    pub output_dot_file: Option<PathBuf>,
    pub output_file:     Option<PathBuf>,
    /// Must contain `<IN>` and `<OUT>`; required with `output_file`
    pub render_cmd:      Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotOutcome {
    pub dot_file: PathBuf,
    pub rendered: Option<PathBuf>,
}

// ─── PlotUseCase ─────────────────────────────────────────────────────────────
/// Writes the DOT topology of a model and optionally renders it.
///
/// The renderer is a type parameter so tests can record the
/// command line instead of spawning a shell.
pub struct PlotUseCase<D: DiagramRenderer = DotRenderer<ShellCommandRunner>> {
    config:   PlotConfig,
    renderer: D,
}

impl PlotUseCase {
    pub fn new(config: PlotConfig) -> Self {
        Self::with_renderer(config, DotRenderer::new(ShellCommandRunner))
    }
}

impl<D: DiagramRenderer> PlotUseCase<D> {
    pub fn with_renderer(config: PlotConfig, renderer: D) -> Self {
        Self { config, renderer }
    }

    /// Validate, load the model, write DOT, then render if asked.
    ///
    /// A render command that exits non-zero is logged, not fatal:
    /// the DOT file is still reported.
    pub fn execute(&self) -> Result<PlotOutcome> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        let render = match (&cfg.output_file, &cfg.render_cmd) {
            (None, _) => None,
            (Some(out), Some(cmd)) if !cmd.trim().is_empty() => Some((out, cmd)),
            (Some(_), _) => bail!(ActionError::config(
                "renderCmd is required when outputFile is given"
            )),
        };

        // ── Step 2: Load ──────────────────────────────────────────────────────
        let net = ModelStore::load(&cfg.model_path)?;

        // ── Step 3: DOT ───────────────────────────────────────────────────────
        let dot_file = cfg
            .output_dot_file
            .clone()
            .unwrap_or_else(|| default_dot_path(&cfg.model_path));
        write_dot(&dot_file, &net)?;

        // ── Step 4: Render ────────────────────────────────────────────────────
        let rendered = match render {
            Some((out, cmd)) => {
                self.renderer.render(&dot_file, out, cmd)?;
                Some(out.clone())
            }
            None => None,
        };

        Ok(PlotOutcome { dot_file, rendered })
    }
}

fn default_dot_path(model_path: &Path) -> PathBuf {
    let mut s = model_path.as_os_str().to_owned();
    s.push(".dot");
    PathBuf::from(s)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::category;
    use crate::infra::renderer::tests::RecordingRunner;
    use crate::ml::network::tests::two_layer_network;
    use std::fs;

    fn saved_model(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("model.json");
        ModelStore::save(&two_layer_network(), &path).unwrap();
        path
    }

    #[test]
    fn test_dot_file_defaults_next_to_model() {
        let dir = tempfile::tempdir().unwrap();
        let model = saved_model(&dir);
        let runner = RecordingRunner::new(0);

        let config = PlotConfig { model_path: model, ..Default::default() };
        let outcome = PlotUseCase::with_renderer(config, DotRenderer::new(&runner))
            .execute()
            .unwrap();

        let expected = dir.path().join("model.json.dot");
        assert_eq!(outcome, PlotOutcome { dot_file: expected.clone(), rendered: None });
        assert!(fs::read_to_string(expected).unwrap().starts_with("digraph"));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_render_command_is_substituted() {
        let dir = tempfile::tempdir().unwrap();
        let dot = dir.path().join("net.dot");
        let svg = dir.path().join("net.svg");
        let runner = RecordingRunner::new(0);

        let config = PlotConfig {
            model_path:      saved_model(&dir),
            output_dot_file: Some(dot.clone()),
            output_file:     Some(svg.clone()),
            render_cmd:      Some("dot -Tsvg <IN> -o <OUT>".into()),
        };
        let outcome = PlotUseCase::with_renderer(config, DotRenderer::new(&runner))
            .execute()
            .unwrap();

        assert_eq!(outcome.rendered, Some(svg.clone()));
        assert_eq!(
            *runner.calls.borrow(),
            vec![format!("dot -Tsvg {} -o {}", dot.display(), svg.display())]
        );
    }

    #[test]
    fn test_output_without_command_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new(0);
        let config = PlotConfig {
            model_path:  saved_model(&dir),
            output_file: Some(dir.path().join("net.svg")),
            ..Default::default()
        };
        let err = PlotUseCase::with_renderer(config, DotRenderer::new(&runner))
            .execute()
            .unwrap_err();
        assert!(matches!(category(&err), Some(ActionError::Config(_))));
        assert!(!dir.path().join("model.json.dot").exists());
    }
}
