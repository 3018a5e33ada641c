// ============================================================
// Layer 5 — SVD Model Compressor
// ============================================================
// For every learnable parameter A whose name matches a rule:
//
//   1. A ≈ B · C with B: rows×r and C: r×cols, where r keeps
//      `keep_ratio` of the singular-value energy, rounded up
//      to a multiple of `aligned_size`
//   2. the node A is replaced by A-SVD = Times(A-U, A-V) so the
//      low-rank structure survives further training
//
// Parameters are visited in network order; each one uses the
// first rule that matches its full name. A keep ratio of 1 or
// more means "leave this parameter as it is".
//
// Reference: Xue, Li & Gong (2013) Restructuring of deep neural
//            network acoustic models with SVD

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::svd_rule::{SvdRule, SvdRuleSet};
use crate::ml::network::{Network, ParameterRef};
use crate::ml::svd::{self, Factorization};

// ─── NamedMutableParameter ────────────────────────────────────────────────────
/// A parameter the compressor can select by name and split in two.
pub trait NamedMutableParameter {
    fn name(&self) -> &str;

    fn factorize(&self, keep_ratio: f64, aligned_size: usize) -> Factorization;
}

impl NamedMutableParameter for ParameterRef<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn factorize(&self, keep_ratio: f64, aligned_size: usize) -> Factorization {
        svd::factorize(self.value, keep_ratio, aligned_size)
    }
}

/// What happened to one compressed parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedParameter {
    pub name:            String,
    pub rows:            usize,
    pub cols:            usize,
    pub natural_rank:    usize,
    pub kept_rank:       usize,
    pub keep_ratio:      f64,
    pub retained_energy: f64,
}

impl CompressedParameter {
    pub fn params_before(&self) -> usize {
        self.rows * self.cols
    }

    pub fn params_after(&self) -> usize {
        self.kept_rank * (self.rows + self.cols)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressionReport {
    pub compressed:        Vec<CompressedParameter>,
    /// Matched a rule whose keep ratio leaves them untouched
    pub skipped:           Vec<String>,
    pub parameters_before: usize,
    pub parameters_after:  usize,
}

// ─── ModelSvdCompressor ──────────────────────────────────────────────────────
/// Applies a rule set to a whole network.
///
/// Why plan before mutating?
///   `replace_with_product` renames nodes and rewires their
///   consumers. Factoring every selected parameter against the
///   untouched network first means a failure in the middle of
///   the rewrite cannot leave some parameters factored against
///   an already-modified graph.
pub struct ModelSvdCompressor {
    rules:        SvdRuleSet,
    aligned_size: usize,
}

impl ModelSvdCompressor {
    /// An `aligned_size` of 0 is treated as 1 (no rounding).
    pub fn new(rules: SvdRuleSet, aligned_size: usize) -> Self {
        Self { rules, aligned_size: aligned_size.max(1) }
    }

    /// Every parameter matched by some rule, in network order,
    /// paired with the first rule that matches it.
    pub fn select<'n>(&self, net: &'n Network) -> Vec<(ParameterRef<'n>, &SvdRule)> {
        let mut first_rule: HashMap<&str, &SvdRule> = HashMap::new();
        for (pattern, rule) in self.rules.iter() {
            for param in net.find_parameters(pattern) {
                first_rule.entry(param.name).or_insert(rule);
            }
        }

        net.parameters()
            .filter_map(|param| first_rule.get(param.name).map(|&rule| (param, rule)))
            .collect()
    }

    /// Mutate `net` in place and describe every change.
    ///
    /// Matching nothing is not an error: the report comes back
    /// empty and a warning is logged.
    pub fn compress(&self, net: &mut Network) -> Result<CompressionReport> {
        let mut report = CompressionReport {
            parameters_before: net.parameter_count(),
            ..Default::default()
        };

        // Factor everything first, mutate afterwards
        let mut plan: Vec<(CompressedParameter, Factorization)> = Vec::new();
        for (param, rule) in self.select(net) {
            if rule.keep_ratio >= 1.0 {
                tracing::info!("Keeping '{}' intact (keep ratio {})", param.name(), rule.keep_ratio);
                report.skipped.push(param.name().to_string());
                continue;
            }

            let (rows, cols) = param.value.shape();
            let f = param.factorize(rule.keep_ratio, self.aligned_size);
            tracing::info!(
                "SVD '{}' [{}x{}]: rank {} of {} (keep ratio {}, {:.1}% energy)",
                param.name(),
                rows,
                cols,
                f.rank,
                f.natural_rank,
                rule.keep_ratio,
                f.retained_energy * 100.0
            );

            plan.push((
                CompressedParameter {
                    name:            param.name().to_string(),
                    rows,
                    cols,
                    natural_rank:    f.natural_rank,
                    kept_rank:       f.rank,
                    keep_ratio:      rule.keep_ratio,
                    retained_energy: f.retained_energy,
                },
                f,
            ));
        }

        for (entry, f) in plan {
            net.replace_with_product(&entry.name, f.left, f.right)?;
            report.compressed.push(entry);
        }

        report.parameters_after = net.parameter_count();
        if report.compressed.is_empty() && report.skipped.is_empty() {
            tracing::warn!("No learnable parameter matched any SVD rule");
        }
        Ok(report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::svd_rule::SvdRule;
    use crate::ml::matrix::Matrix;
    use crate::ml::network::tests::two_layer_network;
    use crate::ml::network::{Node, NodeOp};
    use std::collections::HashMap;

    fn rules(list: &[(&str, f64)]) -> SvdRuleSet {
        SvdRuleSet::compile(list.iter().map(|(p, r)| SvdRule::new(*p, *r)).collect()).unwrap()
    }

    #[test]
    fn test_matching_parameters_are_replaced() {
        let mut net = two_layer_network();
        let report = ModelSvdCompressor::new(rules(&[("W.*", 0.5)]), 1)
            .compress(&mut net)
            .unwrap();

        let names: Vec<&str> = report.compressed.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["W0", "W1"]);
        assert!(net.node("W0").is_none());
        assert!(net.node("W0-U").is_some());
        assert!(net.node("B0").is_some());
        assert_eq!(net.node("h1").unwrap().inputs[0], "W1-SVD");
        net.validate().unwrap();
    }

    #[test]
    fn test_full_rank_compression_preserves_outputs() {
        let original = two_layer_network();
        let mut net = original.clone();
        // ratio just under 1 with alignment 8 rounds back up to full rank
        ModelSvdCompressor::new(rules(&[("W0", 0.999)]), 8)
            .compress(&mut net)
            .unwrap();

        let x = Matrix::from_vec(3, 1, vec![0.3, -0.6, 0.9]).unwrap();
        let inputs = HashMap::from([("features".to_string(), x)]);
        let before = original.evaluate("posterior", &inputs).unwrap();
        let after = net.evaluate("posterior", &inputs).unwrap();
        assert!(before.max_abs_diff(&after) < 1e-9);
    }

    #[test]
    fn test_ratio_of_one_leaves_parameter_alone() {
        let mut net = two_layer_network();
        let report = ModelSvdCompressor::new(rules(&[("W0", 1.0), ("W.*", 0.4)]), 1)
            .compress(&mut net)
            .unwrap();
        assert_eq!(report.skipped, vec!["W0".to_string()]);
        assert_eq!(report.compressed.len(), 1);
        assert!(net.node("W0").is_some());
        assert!(net.node("W1").is_none());
    }

    #[test]
    fn test_aligned_rank_and_parameter_counts() {
        // natural rank 20, first ten singular values hold 52% of the energy
        let mut a = Matrix::zeros(24, 20);
        for i in 0..20 {
            a.set(i, i, if i < 10 { 5.2 } else { 4.8 });
        }
        let mut net = Network::new();
        net.add_node(Node::new("x", NodeOp::Input { rows: 20 }, &[])).unwrap();
        net.add_node(Node::parameter("W7", a)).unwrap();
        net.add_node(Node::new("y", NodeOp::Times, &["W7", "x"])).unwrap();

        let report = ModelSvdCompressor::new(rules(&[("W.*", 0.5)]), 8)
            .compress(&mut net)
            .unwrap();
        let c = &report.compressed[0];
        assert_eq!((c.natural_rank, c.kept_rank), (20, 16));
        assert_eq!(report.parameters_before, 24 * 20);
        assert_eq!(report.parameters_after, 16 * (24 + 20));
        assert_eq!(c.params_after(), report.parameters_after);

        match &net.node("W7-U").unwrap().op {
            NodeOp::LearnableParameter { value } => assert_eq!(value.shape(), (24, 16)),
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn test_select_uses_first_matching_rule_in_network_order() {
        let net = two_layer_network();
        let compressor = ModelSvdCompressor::new(rules(&[("W1", 0.9), ("W.*", 0.5), ("B0", 0.3)]), 8);

        let picked: Vec<(&str, f64)> = compressor
            .select(&net)
            .into_iter()
            .map(|(param, rule)| (param.name, rule.keep_ratio))
            .collect();
        assert_eq!(picked, vec![("W0", 0.5), ("B0", 0.3), ("W1", 0.9)]);
    }

    #[test]
    fn test_no_match_is_not_an_error() {
        let mut net = two_layer_network();
        let report = ModelSvdCompressor::new(rules(&[("Q.*", 0.5)]), 8)
            .compress(&mut net)
            .unwrap();
        assert!(report.compressed.is_empty());
        assert_eq!(net, two_layer_network());
    }
}
