// ============================================================
// Layer 6 — Topology Rendering
// ============================================================
// Writes a network as a Graphviz DOT file and hands it to an
// external renderer through a command template:
//
//   template:  dot -Tsvg <IN> -o <OUT>
//   dot file:  model.json.dot
//   output:    model.svg
//   command:   dot -Tsvg model.json.dot -o model.svg
//
// Only the LAST occurrence of each placeholder is replaced, and
// a placeholder at the very start of the template does not
// count (the program name must come first).
//
// The process itself is started by a CommandRunner, so tests
// can record the command line instead of spawning anything.
//
// Reference: std::process::Command
//            regex crate documentation (Captures)

use anyhow::{Context, Result};
use regex::Regex;
use std::{io::Write, path::Path, process::Command};

use crate::domain::errors::ActionError;
use crate::domain::traits::{CommandRunner, DiagramRenderer};
use crate::infra::atomic_file::write_atomically;
use crate::ml::network::Network;

// ─── Placeholder substitution ────────────────────────────────────────────────

fn replace_last(template: &str, placeholder: &str, value: &str) -> Result<String> {
    let pattern = format!("(.+)({})(.*)", regex::escape(placeholder));
    let re = Regex::new(&pattern).context("invalid placeholder pattern")?;

    let caps = re.captures(template).ok_or_else(|| {
        ActionError::config(format!(
            "render command '{template}' has no {placeholder} placeholder after the program name"
        ))
    })?;
    Ok(format!("{}{}{}", &caps[1], value, &caps[3]))
}

/// Replace the last `<IN>` with `dot_path` and the last `<OUT>` with `output_path`.
pub fn substitute_placeholders(template: &str, dot_path: &Path, output_path: &Path) -> Result<String> {
    let with_in = replace_last(template, "<IN>", &dot_path.display().to_string())?;
    replace_last(&with_in, "<OUT>", &output_path.display().to_string())
}

// ─── DOT output ──────────────────────────────────────────────────────────────

pub fn write_dot(path: &Path, net: &Network) -> Result<()> {
    let dot = net.to_dot();
    write_atomically(path, |w| w.write_all(dot.as_bytes()))?;
    tracing::info!("Wrote network topology to '{}'", path.display());
    Ok(())
}

// ─── ShellCommandRunner ──────────────────────────────────────────────────────
/// Runs a command line through the platform shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

impl CommandRunner for ShellCommandRunner {
    fn run(&self, command_line: &str) -> Result<i32> {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C");
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c");
            c
        };

        let status = cmd
            .arg(command_line)
            .status()
            .with_context(|| format!("failed to start '{command_line}'"))?;

        // killed by a signal → no exit code
        Ok(status.code().unwrap_or(-1))
    }
}

// ─── DotRenderer ─────────────────────────────────────────────────────────────
pub struct DotRenderer<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> DotRenderer<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> DiagramRenderer for DotRenderer<R> {
    fn render(&self, dot_path: &Path, output_path: &Path, command_template: &str) -> Result<()> {
        let command_line = substitute_placeholders(command_template, dot_path, output_path)?;
        tracing::info!("Running: {command_line}");

        let code = self.runner.run(&command_line)?;
        if code != 0 {
            tracing::warn!(
                "Render command exited with status {code}; '{}' may be missing or stale",
                output_path.display()
            );
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::errors::category;
    use crate::ml::network::tests::two_layer_network;
    use std::cell::RefCell;
    use std::fs;

    /// Records every command line and answers with a fixed exit code.
    pub(crate) struct RecordingRunner {
        pub(crate) calls: RefCell<Vec<String>>,
        pub(crate) exit_code: i32,
    }

    impl RecordingRunner {
        pub(crate) fn new(exit_code: i32) -> Self {
            Self { calls: RefCell::new(Vec::new()), exit_code }
        }
    }

    impl CommandRunner for &RecordingRunner {
        fn run(&self, command_line: &str) -> Result<i32> {
            self.calls.borrow_mut().push(command_line.to_string());
            Ok(self.exit_code)
        }
    }

    #[test]
    fn test_substitutes_both_placeholders() {
        let cmd = substitute_placeholders(
            "dot -Tsvg <IN> -o <OUT>",
            Path::new("net.dot"),
            Path::new("net.svg"),
        )
        .unwrap();
        assert_eq!(cmd, "dot -Tsvg net.dot -o net.svg");
    }

    #[test]
    fn test_only_last_occurrence_replaced() {
        let cmd = substitute_placeholders(
            "echo <IN> <IN> > <OUT>",
            Path::new("a.dot"),
            Path::new("b.png"),
        )
        .unwrap();
        assert_eq!(cmd, "echo <IN> a.dot > b.png");
    }

    #[test]
    fn test_missing_placeholder_is_config_error() {
        let err = substitute_placeholders("dot -Tsvg <IN>", Path::new("a"), Path::new("b"))
            .unwrap_err();
        assert!(matches!(category(&err), Some(ActionError::Config(_))));

        // a leading placeholder has nothing before it
        assert!(substitute_placeholders("<IN> <OUT>", Path::new("a"), Path::new("b")).is_err());
    }

    #[test]
    fn test_renderer_passes_command_to_runner() {
        let runner = RecordingRunner::new(0);
        let renderer = DotRenderer::new(&runner);
        renderer
            .render(Path::new("m.dot"), Path::new("m.pdf"), "dot -Tpdf <IN> -o <OUT>")
            .unwrap();
        assert_eq!(*runner.calls.borrow(), vec!["dot -Tpdf m.dot -o m.pdf".to_string()]);
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let runner = RecordingRunner::new(3);
        let renderer = DotRenderer::new(&runner);
        assert!(renderer
            .render(Path::new("m.dot"), Path::new("m.pdf"), "dot <IN> <OUT>")
            .is_ok());
    }

    #[test]
    fn test_write_dot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.dot");
        write_dot(&path, &two_layer_network()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("digraph"));
        assert!(text.contains("W0"));
    }
}
