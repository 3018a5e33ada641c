// ============================================================
// Layer 5 — Computation Network
// ============================================================
// A trained model is a directed acyclic graph of named nodes:
//
//   features (Input) ──┐
//                      ├─► h = Times(W0, features) ─► z = Plus(h, b0) ─► Sigmoid
//   W0 (Parameter) ────┘                                   ▲
//   b0 (Parameter) ────────────────────────────────────────┘
//
// Node kinds:
//   Input              — a value supplied at evaluation time
//   LearnableParameter — a trained matrix stored in the model
//   Times, Plus        — binary operations
//   Sigmoid, Tanh, RectifiedLinear, Softmax — element/column-wise
//
// Graph mutation for SVD compression replaces a parameter node
// `W` by `W-SVD = Times(W-U, W-V)` and points every consumer
// of `W` (and every network output named `W`) at `W-SVD`.
//
// Serialised as JSON by infra::model_store.
//
// Reference: Rust Book §8 (Collections), §17 (Trait Objects)

use anyhow::{bail, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::domain::errors::ActionError;
use crate::ml::matrix::Matrix;

/// Operation computed by a node. Serialized with a `kind` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NodeOp {
    Input { rows: usize },
    LearnableParameter { value: Matrix },
    Times,
    Plus,
    Sigmoid,
    Tanh,
    RectifiedLinear,
    Softmax,
}

impl NodeOp {
    pub fn name(&self) -> &'static str {
        match self {
            NodeOp::Input { .. }              => "Input",
            NodeOp::LearnableParameter { .. } => "LearnableParameter",
            NodeOp::Times                     => "Times",
            NodeOp::Plus                      => "Plus",
            NodeOp::Sigmoid                   => "Sigmoid",
            NodeOp::Tanh                      => "Tanh",
            NodeOp::RectifiedLinear           => "RectifiedLinear",
            NodeOp::Softmax                   => "Softmax",
        }
    }

    /// Number of inputs the operation consumes.
    pub fn arity(&self) -> usize {
        match self {
            NodeOp::Input { .. } | NodeOp::LearnableParameter { .. } => 0,
            NodeOp::Times | NodeOp::Plus => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name:   String,
    pub op:     NodeOp,
    #[serde(default)]
    pub inputs: Vec<String>,
}

impl Node {
    pub fn new(name: impl Into<String>, op: NodeOp, inputs: &[&str]) -> Self {
        Self {
            name:   name.into(),
            op,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn parameter(name: impl Into<String>, value: Matrix) -> Self {
        Self::new(name, NodeOp::LearnableParameter { value }, &[])
    }

    pub fn is_parameter(&self) -> bool {
        matches!(self.op, NodeOp::LearnableParameter { .. })
    }
}

/// Borrowed view of one learnable parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParameterRef<'a> {
    pub name:  &'a str,
    pub value: &'a Matrix,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    nodes:   Vec<Node>,
    #[serde(default)]
    outputs: Vec<String>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.node(&node.name).is_some() {
            bail!(ActionError::data(format!("duplicate node name '{}'", node.name)));
        }
        self.nodes.push(node);
        Ok(())
    }

    pub fn add_output(&mut self, name: impl Into<String>) {
        self.outputs.push(name.into());
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn parameters(&self) -> impl Iterator<Item = ParameterRef<'_>> {
        self.nodes.iter().filter_map(|n| match &n.op {
            NodeOp::LearnableParameter { value } => Some(ParameterRef { name: &n.name, value }),
            _ => None,
        })
    }

    /// Learnable parameters whose name matches `pattern`, in node
    /// order. Anchor the pattern for whole-name matching.
    pub fn find_parameters(&self, pattern: &Regex) -> Vec<ParameterRef<'_>> {
        self.parameters()
            .filter(|p| pattern.is_match(p.name))
            .collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters().map(|p| p.value.len()).sum()
    }

    /// Structural checks: unique names, known inputs, arity,
    /// consistent matrices, known outputs, no cycles.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.name.as_str()) {
                bail!(ActionError::data(format!("duplicate node name '{}'", node.name)));
            }
        }
        for node in &self.nodes {
            if node.inputs.len() != node.op.arity() {
                bail!(ActionError::data(format!(
                    "node '{}' ({}) expects {} inputs, has {}",
                    node.name,
                    node.op.name(),
                    node.op.arity(),
                    node.inputs.len()
                )));
            }
            for input in &node.inputs {
                if !seen.contains(input.as_str()) {
                    bail!(ActionError::data(format!(
                        "node '{}' refers to unknown input '{input}'",
                        node.name
                    )));
                }
            }
            if let NodeOp::LearnableParameter { value } = &node.op {
                if !value.is_consistent() {
                    bail!(ActionError::data(format!(
                        "parameter '{}' has a malformed matrix",
                        node.name
                    )));
                }
            }
        }
        for out in &self.outputs {
            if !seen.contains(out.as_str()) {
                bail!(ActionError::data(format!("unknown output node '{out}'")));
            }
        }
        self.topological_order().map(|_| ())
    }

    /// Node names ordered so that every node follows its inputs.
    pub fn topological_order(&self) -> Result<Vec<&str>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            net:   &'a Network,
            name:  &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            order: &mut Vec<&'a str>,
        ) -> Result<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    bail!(ActionError::data(format!("cycle through node '{name}'")))
                }
                None => {}
            }
            let node = net
                .node(name)
                .ok_or_else(|| ActionError::data(format!("unknown node '{name}'")))?;
            marks.insert(name, Mark::Visiting);
            for input in &node.inputs {
                visit(net, input, marks, order)?;
            }
            marks.insert(name, Mark::Done);
            order.push(&node.name);
            Ok(())
        }

        let mut marks = HashMap::new();
        let mut order = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            visit(self, &node.name, &mut marks, &mut order)?;
        }
        Ok(order)
    }

    /// Replace parameter `name` by the product `left · right`.
    ///
    /// Adds `name-U`, `name-V` and `name-SVD`, rewires consumers and
    /// outputs, and removes the original node. Returns the name of
    /// the new product node.
    pub fn replace_with_product(&mut self, name: &str, left: Matrix, right: Matrix) -> Result<String> {
        let pos = self
            .nodes
            .iter()
            .position(|n| n.name == name)
            .ok_or_else(|| ActionError::data(format!("no node named '{name}'")))?;
        let original = match &self.nodes[pos].op {
            NodeOp::LearnableParameter { value } => value.shape(),
            other => bail!(ActionError::data(format!(
                "node '{name}' is a {} node, not a learnable parameter",
                other.name()
            ))),
        };
        if left.cols() != right.rows() || (left.rows(), right.cols()) != original {
            bail!(ActionError::data(format!(
                "factors {}x{} · {}x{} do not reproduce the {}x{} shape of '{name}'",
                left.rows(),
                left.cols(),
                right.rows(),
                right.cols(),
                original.0,
                original.1
            )));
        }

        let u_name = format!("{name}-U");
        let v_name = format!("{name}-V");
        let product_name = format!("{name}-SVD");
        for new_name in [&u_name, &v_name, &product_name] {
            if self.node(new_name).is_some() {
                bail!(ActionError::data(format!("node name '{new_name}' is already taken")));
            }
        }

        for node in &mut self.nodes {
            for input in &mut node.inputs {
                if input == name {
                    *input = product_name.clone();
                }
            }
        }
        for out in &mut self.outputs {
            if out == name {
                *out = product_name.clone();
            }
        }

        let replacement = [
            Node::parameter(u_name.clone(), left),
            Node::parameter(v_name.clone(), right),
            Node::new(product_name.clone(), NodeOp::Times, &[&u_name, &v_name]),
        ];
        let _removed: Vec<Node> = self.nodes.splice(pos..=pos, replacement).collect();

        Ok(product_name)
    }

    /// Evaluate node `target` for the given input values.
    pub fn evaluate(&self, target: &str, inputs: &HashMap<String, Matrix>) -> Result<Matrix> {
        let mut values: HashMap<&str, Matrix> = HashMap::new();

        for name in self.topological_order()? {
            let node = self
                .node(name)
                .ok_or_else(|| ActionError::data(format!("unknown node '{name}'")))?;
            let value = match &node.op {
                NodeOp::Input { rows } => {
                    let v = inputs.get(name).ok_or_else(|| {
                        ActionError::data(format!("no value supplied for input '{name}'"))
                    })?;
                    if v.rows() != *rows {
                        bail!(ActionError::data(format!(
                            "input '{name}' expects {rows} rows, got {}",
                            v.rows()
                        )));
                    }
                    v.clone()
                }
                NodeOp::LearnableParameter { value } => value.clone(),
                NodeOp::Times => operand(&values, node, 0)?.matmul(operand(&values, node, 1)?)?,
                NodeOp::Plus => add_broadcast(operand(&values, node, 0)?, operand(&values, node, 1)?)?,
                NodeOp::Sigmoid => operand(&values, node, 0)?.map(|x| 1.0 / (1.0 + (-x).exp())),
                NodeOp::Tanh => operand(&values, node, 0)?.map(f64::tanh),
                NodeOp::RectifiedLinear => operand(&values, node, 0)?.map(|x| x.max(0.0)),
                NodeOp::Softmax => softmax_columns(operand(&values, node, 0)?),
            };

            let done = name == target;
            values.insert(name, value);
            if done {
                break;
            }
        }

        values
            .remove(target)
            .ok_or_else(|| ActionError::data(format!("unknown node '{target}'")).into())
    }

    /// Graphviz description of the topology.
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph G {\n");
        for node in &self.nodes {
            let attrs = match &node.op {
                NodeOp::Input { rows } => format!(
                    "label=\"{} : Input [{}]\", shape=ellipse, style=filled, fillcolor=lightgrey",
                    node.name, rows
                ),
                NodeOp::LearnableParameter { value } => format!(
                    "label=\"{} : LearnableParameter [{}x{}]\", shape=box",
                    node.name,
                    value.rows(),
                    value.cols()
                ),
                op => format!("label=\"{} : {}\", shape=ellipse", node.name, op.name()),
            };
            dot.push_str(&format!("    \"{}\" [{}];\n", node.name, attrs));
        }
        for node in &self.nodes {
            for input in &node.inputs {
                dot.push_str(&format!("    \"{}\" -> \"{}\";\n", input, node.name));
            }
        }
        for out in &self.outputs {
            dot.push_str(&format!("    \"{}\" [peripheries=2];\n", out));
        }
        dot.push_str("}\n");
        dot
    }
}

fn operand<'v>(values: &'v HashMap<&str, Matrix>, node: &Node, i: usize) -> Result<&'v Matrix> {
    let name = node.inputs[i].as_str();
    values
        .get(name)
        .ok_or_else(|| ActionError::data(format!("input '{name}' of '{}' not computed", node.name)).into())
}

/// Element-wise sum; a single-column right operand is broadcast
/// across every column (bias vectors).
fn add_broadcast(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.shape() == b.shape() {
        let mut out = a.clone();
        for (o, v) in out.as_mut_slice().iter_mut().zip(b.as_slice()) {
            *o += v;
        }
        return Ok(out);
    }
    if b.cols() == 1 && b.rows() == a.rows() {
        let mut out = a.clone();
        for r in 0..a.rows() {
            for c in 0..a.cols() {
                out.set(r, c, a.get(r, c) + b.get(r, 0));
            }
        }
        return Ok(out);
    }
    bail!(ActionError::data(format!(
        "cannot add {}x{} and {}x{}",
        a.rows(),
        a.cols(),
        b.rows(),
        b.cols()
    )))
}

fn softmax_columns(a: &Matrix) -> Matrix {
    let mut out = a.clone();
    for c in 0..a.cols() {
        let max = (0..a.rows()).map(|r| a.get(r, c)).fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = (0..a.rows()).map(|r| (a.get(r, c) - max).exp()).sum();
        for r in 0..a.rows() {
            out.set(r, c, (a.get(r, c) - max).exp() / sum);
        }
    }
    out
}
