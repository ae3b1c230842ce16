//! Bound relaxation ("bubble-up") for interventional queries.
//!
//! Computes an upper bound on the circuit output when a set of source
//! variables is intervened on (their generating mechanism is cut). Two
//! transient relaxations are applied to working copies of the weights and
//! node kinds before a plain bottom-up recomputation:
//!
//! 1. Parameters owned by a free source variable are neutralized: both of
//!    their literal weights become 1.
//! 2. Sum nodes splitting on a free source variable become max nodes. A max
//!    never falls below any single branch, so the result is non-decreasing
//!    with respect to every concrete setting of the variable.
//!
//! The circuit and evidence are never modified.

use crate::engine::circuit::{Circuit, NodeKind};
use crate::engine::errors::CalcError;
use crate::engine::evidence::Evidence;
use crate::engine::normal::{NormalCalculator, ValueSnapshot};

/// Lookups tying circuit nodes and AC-variables to source variables.
///
/// All AC-variable indexed tables use the same 1-based layout as
/// [`Evidence`], slot 0 unused.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterventionMaps {
    /// AC-variable each node splits on; `None` for nodes without one.
    pub node_split_var: Vec<Option<usize>>,
    /// Source variable of an AC-variable used as a split variable; `None` for
    /// compiler-introduced variables with no model counterpart.
    pub ac_var_source: Vec<Option<usize>>,
    /// Whether each AC-variable is an indicator (otherwise a parameter).
    pub ac_var_is_indicator: Vec<bool>,
    /// Source variable owning each parameter AC-variable.
    pub parameter_source: Vec<Option<usize>>,
}

impl InterventionMaps {
    /// Checks table sizes against a circuit and the number of source variables.
    pub fn validate(&self, circuit: &Circuit, num_source_vars: usize) -> Result<(), CalcError> {
        if self.node_split_var.len() != circuit.len() {
            return Err(CalcError::ValidationError(format!(
                "node_split_var has {} entries, circuit has {} nodes",
                self.node_split_var.len(),
                circuit.len()
            )));
        }
        let var_slots = circuit.num_vars() + 1;
        for (name, len) in [
            ("ac_var_source", self.ac_var_source.len()),
            ("ac_var_is_indicator", self.ac_var_is_indicator.len()),
            ("parameter_source", self.parameter_source.len()),
        ] {
            if len < var_slots {
                return Err(CalcError::ValidationError(format!(
                    "{} has {} entries, circuit needs {}",
                    name, len, var_slots
                )));
            }
        }
        if let Some((n, var)) = self
            .node_split_var
            .iter()
            .enumerate()
            .find_map(|(n, v)| v.filter(|&var| var >= self.ac_var_source.len()).map(|var| (n, var)))
        {
            return Err(CalcError::ValidationError(format!(
                "node {} splits on unknown AC-variable {}",
                n, var
            )));
        }
        let bad_source = self
            .ac_var_source
            .iter()
            .chain(self.parameter_source.iter())
            .flatten()
            .find(|&&src| src >= num_source_vars);
        if let Some(src) = bad_source {
            return Err(CalcError::ValidationError(format!(
                "source variable {} outside 0..{}",
                src, num_source_vars
            )));
        }
        Ok(())
    }

    fn split_source(&self, n: usize) -> Option<usize> {
        self.node_split_var[n].and_then(|var| self.ac_var_source[var])
    }
}

/// Outcome of a bound relaxation pass.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelaxationSummary {
    /// Relaxed root value: an upper bound on the interventional query.
    pub bound: f64,
    /// Number of sum nodes retagged as max nodes.
    pub relaxed_sum_nodes: usize,
    /// Number of literal nodes whose parameter weights were set to 1.
    pub neutralized_parameters: usize,
}

impl NormalCalculator {
    /// Computes the relaxed upper bound for the given free source variables.
    ///
    /// Overwrites the value buffer with relaxed values and invalidates any
    /// derivatives; call [`evaluate`](crate::engine::calculator::Calculator::evaluate)
    /// again before differentiating.
    pub fn bubble_up(
        &mut self,
        circuit: &Circuit,
        evidence: &Evidence,
        maps: &InterventionMaps,
        free: &[bool],
    ) -> Result<RelaxationSummary, CalcError> {
        self.check_circuit(circuit)?;
        Self::check_evidence(circuit, evidence)?;
        maps.validate(circuit, free.len())?;
        self.snapshot = ValueSnapshot::Empty;
        self.derivatives_current = false;

        let mut neg = evidence.negative_weights().to_vec();
        let mut pos = evidence.positive_weights().to_vec();
        let mut kinds = circuit.kinds().to_vec();
        let mut summary = RelaxationSummary {
            bound: 0.0,
            relaxed_sum_nodes: 0,
            neutralized_parameters: 0,
        };

        for n in 0..circuit.len() {
            match kinds[n] {
                NodeKind::Literal => {
                    let var = circuit.literal(n).unsigned_abs() as usize;
                    let owner_free = maps.parameter_source[var].map_or(false, |src| free[src]);
                    if !maps.ac_var_is_indicator[var] && owner_free {
                        neg[var] = 1.0;
                        pos[var] = 1.0;
                        summary.neutralized_parameters += 1;
                    }
                }
                NodeKind::Add => {
                    if maps.split_source(n).map_or(false, |src| free[src]) {
                        kinds[n] = NodeKind::Max;
                        summary.relaxed_sum_nodes += 1;
                    }
                }
                _ => {}
            }
        }

        self.force_zero.fill(false);
        for n in 0..circuit.len() {
            self.values[n] = relaxed_node_value(circuit, n, kinds[n], &self.values, &neg, &pos)?;
        }
        summary.bound = self.values[circuit.root()];
        self.snapshot = ValueSnapshot::Relaxed;

        #[cfg(feature = "tracing")]
        tracing::info!(
            "bubble_up: bound {:.6e} ({} sum nodes relaxed, {} parameters neutralized)",
            summary.bound,
            summary.relaxed_sum_nodes,
            summary.neutralized_parameters
        );
        Ok(summary)
    }
}

/// Value of node `n` from raw child values, without zero bookkeeping.
fn relaxed_node_value(
    circuit: &Circuit,
    n: usize,
    kind: NodeKind,
    values: &[f64],
    neg: &[f64],
    pos: &[f64],
) -> Result<f64, CalcError> {
    let children = circuit.children(n).iter().map(|&ch| values[ch]);
    match kind {
        NodeKind::Mult => Ok(children.product()),
        NodeKind::Add => Ok(children.sum()),
        NodeKind::Max => Ok(children.fold(0.0, |best, v| if v > best { v } else { best })),
        NodeKind::Literal => {
            let lit = circuit.literal(n);
            let var = lit.unsigned_abs() as usize;
            Ok(if lit < 0 { neg[var] } else { pos[var] })
        }
        NodeKind::Constant => Err(CalcError::ConstantInRelaxation { node: n }),
    }
}
