//! Batch bound relaxation over many intervention sets.
//!
//! Each intervention set is relaxed on its own calculator while the circuit,
//! evidence and lookups are shared read-only.
//!
//! ## Feature gating
//!
//! Parallel execution is behind the `parallel` feature flag. When disabled,
//! the sets are processed sequentially on a single reused calculator.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::engine::bubble_up::{InterventionMaps, RelaxationSummary};
use crate::engine::circuit::Circuit;
use crate::engine::errors::CalcError;
use crate::engine::evidence::Evidence;
use crate::engine::normal::NormalCalculator;

/// Relaxes the circuit once per set of free flags, in input order.
///
/// The first failing set aborts the batch.
pub fn bound_interventions(
    circuit: &Circuit,
    evidence: &Evidence,
    maps: &InterventionMaps,
    free_sets: &[Vec<bool>],
) -> Result<Vec<RelaxationSummary>, CalcError> {
    #[cfg(feature = "tracing")]
    tracing::debug!(
        "bound_interventions: {} sets over {} nodes",
        free_sets.len(),
        circuit.len()
    );

    #[cfg(feature = "parallel")]
    {
        free_sets
            .par_iter()
            .map_init(
                || NormalCalculator::new(circuit.len(), false),
                |calc, free| calc.bubble_up(circuit, evidence, maps, free),
            )
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut calc = NormalCalculator::new(circuit.len(), false);
        free_sets
            .iter()
            .map(|free| calc.bubble_up(circuit, evidence, maps, free))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::circuit::CircuitBuilder;

    /// Two independent binary source variables, each a sum over its indicators.
    fn two_variables() -> (Circuit, Evidence, InterventionMaps) {
        let mut b = CircuitBuilder::new();
        let lits: Vec<usize> = (1..=8).map(|v| b.literal(v)).collect();
        let a0 = b.mult(&[lits[0], lits[4]]);
        let a1 = b.mult(&[lits[1], lits[5]]);
        let b0 = b.mult(&[lits[2], lits[6]]);
        let b1 = b.mult(&[lits[3], lits[7]]);
        let sa = b.add(&[a0, a1]);
        let sb = b.add(&[b0, b1]);
        b.mult(&[sa, sb]);
        let circuit = b.build().unwrap();

        let mut ev = Evidence::new(8);
        for (var, w) in [(5, 0.2), (6, 0.8), (7, 0.5), (8, 0.5)] {
            ev.set_weight(var, w).unwrap();
        }
        let mut node_split_var = vec![None; circuit.len()];
        node_split_var[sa] = Some(1);
        node_split_var[sb] = Some(3);
        let maps = InterventionMaps {
            node_split_var,
            ac_var_source: vec![None, Some(0), Some(0), Some(1), Some(1), None, None, None, None],
            ac_var_is_indicator: (0..=8).map(|v| (1..=4).contains(&v)).collect(),
            parameter_source: vec![None; 9],
        };
        (circuit, ev, maps)
    }

    #[test]
    fn one_summary_per_set_in_order() {
        let (circuit, ev, maps) = two_variables();
        let sets = vec![
            vec![false, false],
            vec![true, false],
            vec![false, true],
            vec![true, true],
        ];
        let summaries = bound_interventions(&circuit, &ev, &maps, &sets).unwrap();
        let bounds: Vec<f64> = summaries.iter().map(|s| s.bound).collect();
        assert!((bounds[0] - 1.0).abs() < 1e-12);
        assert!((bounds[1] - 0.8).abs() < 1e-12);
        assert!((bounds[2] - 0.5).abs() < 1e-12);
        assert!((bounds[3] - 0.4).abs() < 1e-12);
        assert_eq!(summaries[3].relaxed_sum_nodes, 2);
    }

    #[test]
    fn first_error_aborts_the_batch() {
        let (circuit, ev, maps) = two_variables();
        let sets = vec![vec![true, true], vec![true]];
        assert!(matches!(
            bound_interventions(&circuit, &ev, &maps, &sets),
            Err(CalcError::ValidationError(_))
        ));
    }
}
