// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the use cases and the outside world.
// Each trait has one production implementation in Layer 4/6
// and is replaced by a small fake in the unit tests:
//
//   LineSource       — data::corpus::TextCorpus
//   FreshnessOracle  — infra::freshness::FileFreshness
//   CommandRunner    — infra::renderer::ShellCommandRunner
//   DiagramRenderer  — infra::renderer::DotRenderer
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use std::path::Path;

// ─── LineSource ───────────────────────────────────────────────────────────────
/// Anything that yields the lines of a plain-text corpus.
pub trait LineSource {
    /// Stream every line, without the trailing newline.
    fn lines(&self) -> Result<Box<dyn Iterator<Item = Result<String>> + '_>>;
}

// ─── FreshnessOracle ──────────────────────────────────────────────────────────
/// Decides whether a generated file still reflects its input.
pub trait FreshnessOracle {
    /// True when `output` exists and is not older than `input`.
    /// A missing input never forces a rebuild.
    fn is_up_to_date(&self, output: &Path, input: &Path) -> bool;
}

// ─── CommandRunner ────────────────────────────────────────────────────────────
/// Runs a fully substituted command line and reports its exit code.
pub trait CommandRunner {
    fn run(&self, command_line: &str) -> Result<i32>;
}

// ─── DiagramRenderer ──────────────────────────────────────────────────────────
/// Turns a DOT file into a rendered diagram via a command template
/// containing `<IN>` and `<OUT>` placeholders.
pub trait DiagramRenderer {
    fn render(&self, dot_path: &Path, output_path: &Path, command_template: &str) -> Result<()>;
}
