//! Term counting diagnostic.
//!
//! Counts, for every node, how many additive terms its sub-circuit would
//! produce if fully expanded into a sum of products. MAX and CONSTANT nodes
//! have no count, and neither does any node above them.

use crate::engine::circuit::{Circuit, NodeKind};
use crate::engine::errors::CalcError;

/// Per-node term counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCounts {
    counts: Vec<Option<u128>>,
}

impl TermCounts {
    /// Count for node `n`, or `None` if untracked.
    pub fn node(&self, n: usize) -> Option<u128> {
        self.counts[n]
    }

    /// Count for the root.
    pub fn root(&self) -> Option<u128> {
        self.counts.last().copied().flatten()
    }

    /// All counts in node order.
    pub fn as_slice(&self) -> &[Option<u128>] {
        &self.counts
    }
}

/// Counts additive terms for every node of the circuit.
pub fn count_terms(circuit: &Circuit) -> Result<TermCounts, CalcError> {
    let mut counts: Vec<Option<u128>> = vec![None; circuit.len()];
    for n in 0..circuit.len() {
        counts[n] = match circuit.kind(n) {
            NodeKind::Mult => fold_children(circuit, n, &counts, 1, u128::checked_mul)?,
            NodeKind::Add => fold_children(circuit, n, &counts, 0, u128::checked_add)?,
            NodeKind::Literal => Some(1),
            NodeKind::Max | NodeKind::Constant => None,
        };
    }

    #[cfg(feature = "tracing")]
    tracing::info!("count_terms: root has {:?} terms", counts.last().copied().flatten());
    Ok(TermCounts { counts })
}

fn fold_children(
    circuit: &Circuit,
    n: usize,
    counts: &[Option<u128>],
    init: u128,
    op: fn(u128, u128) -> Option<u128>,
) -> Result<Option<u128>, CalcError> {
    let mut acc = init;
    for &ch in circuit.children(n) {
        let Some(c) = counts[ch] else {
            return Ok(None);
        };
        acc = op(acc, c).ok_or(CalcError::TermCountOverflow { node: n })?;
    }
    Ok(Some(acc))
}
