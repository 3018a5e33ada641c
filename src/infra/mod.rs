// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the file system or other processes:
//
//   atomic_file.rs  — temp-file-then-rename writes; every
//                     output of every action goes through it
//
//   freshness.rs    — make-mode staleness check based on
//                     modification times
//
//   table_writer.rs — vocabulary, word-to-class, class-to-index
//                     and label mapping text tables
//
//   model_store.rs  — JSON load/save of computation networks
//
//   renderer.rs     — DOT export and the external render
//                     command (behind CommandRunner)
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Atomic output files
pub mod atomic_file;

/// Make-mode freshness oracle
pub mod freshness;

/// Plain-text vocabulary and label tables
pub mod table_writer;

/// Network persistence
pub mod model_store;

/// Topology DOT output and rendering
pub mod renderer;
