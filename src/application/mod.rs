// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// One use case per action. Each owns a serialisable *Config,
// validates it, drives the lower layers and reports an outcome.
//
// Rules for this layer:
//   - No linear algebra or graph surgery here (that's Layer 5)
//   - No argument parsing or printing (that's Layer 1)
//   - File access only through Layer 4 and Layer 6
//   - Skips (up to date, bad rule file) are outcomes, not errors
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// write-word-and-class: vocabulary and class tables
pub mod word_class_use_case;

// svd: low-rank compression of a saved model
pub mod svd_use_case;

// create-label-map: label mapping files from a dataset
pub mod label_map_use_case;

// plot: DOT topology and optional rendering
pub mod plot_use_case;
