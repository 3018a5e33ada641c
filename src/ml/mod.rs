// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// Everything that touches matrices or the model graph lives
// here. No other layer does linear algebra.
//
//   matrix.rs     — dense row-major f64 matrix
//
//   svd.rs        — one-sided Jacobi SVD, the energy-based
//                   rank policy and the two-factor split
//
//   network.rs    — the computation network: named nodes,
//                   validation, evaluation, graph rewiring,
//                   DOT export
//
//   compressor.rs — rule-driven SVD compression of a network
//
// Reference: Golub & Van Loan, Matrix Computations §8.6

/// Dense matrix type shared by the model and the SVD code
pub mod matrix;

/// Singular value decomposition and rank selection
pub mod svd;

/// Computation network graph
pub mod network;

/// Replaces matching parameters by low-rank products
pub mod compressor;
