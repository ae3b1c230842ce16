//! Literal-level marginals and posteriors.
//!
//! Aggregates the per-node accessors of a [`Calculator`] over LITERAL nodes.
//! After a sum-mode differentiation, the marginal of a positive indicator
//! literal is the joint probability of that state with the evidence, and its
//! posterior is the conditional probability given the evidence.

use crate::engine::calculator::Calculator;
use crate::engine::circuit::{Circuit, NodeKind};

/// Per-literal quantities indexed by AC-variable (slot 0 unused).
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralTable {
    /// Values for negative literals.
    pub negative: Vec<f64>,
    /// Values for positive literals.
    pub positive: Vec<f64>,
}

impl LiteralTable {
    fn zeroed(num_vars: usize) -> Self {
        Self {
            negative: vec![0.0; num_vars + 1],
            positive: vec![0.0; num_vars + 1],
        }
    }

    /// Value for a signed literal.
    pub fn get(&self, literal: i32) -> f64 {
        let var = literal.unsigned_abs() as usize;
        if literal < 0 {
            self.negative[var]
        } else {
            self.positive[var]
        }
    }

    fn add(&mut self, literal: i32, value: f64) {
        let var = literal.unsigned_abs() as usize;
        if literal < 0 {
            self.negative[var] += value;
        } else {
            self.positive[var] += value;
        }
    }
}

/// Sums `node_marginal` over every literal node, per literal.
///
/// Returns `None` if the calculator holds no current derivatives.
pub fn literal_marginals<C: Calculator + ?Sized>(calc: &C, circuit: &Circuit) -> Option<LiteralTable> {
    collect(circuit, |n| calc.node_marginal(n))
}

/// Sums `node_posterior` over every literal node, per literal.
///
/// Returns `None` if the calculator holds no current derivatives.
pub fn literal_posteriors<C: Calculator + ?Sized>(calc: &C, circuit: &Circuit) -> Option<LiteralTable> {
    collect(circuit, |n| calc.node_posterior(n))
}

fn collect(circuit: &Circuit, per_node: impl Fn(usize) -> Option<f64>) -> Option<LiteralTable> {
    let mut table = LiteralTable::zeroed(circuit.num_vars());
    for n in (0..circuit.len()).filter(|&n| circuit.kind(n) == NodeKind::Literal) {
        table.add(circuit.literal(n), per_node(n)?);
    }
    Some(table)
}
