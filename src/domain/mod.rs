// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums and traits that define the core
// concepts shared by the actions.
//
// Rules for this layer:
//   - NO file I/O or process spawning
//   - NO linear algebra or graph code
//   - Only plain data, the error taxonomy, and seam traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Error categories shared by every action
pub mod errors;

// Word counts, vocabulary entries and class assignments
pub mod vocabulary;

// (regex, keep ratio) rules that drive SVD compression
pub mod svd_rule;

// Abstractions implemented by the data and infra layers
pub mod traits;
