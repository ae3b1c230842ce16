//! Shared circuit fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use acbound_core::{Circuit, CircuitBuilder, Evidence, InterventionMaps, NodeKind};

/// Parameters of a two-node network A -> B over binary variables.
#[derive(Debug, Clone, Copy)]
pub struct ChainParams {
    pub p_a: [f64; 2],
    pub p_b_given_a: [[f64; 2]; 2],
}

/// Compiled circuit for A -> B plus its intervention lookups.
///
/// AC-variables: indicators a0=1 a1=2 b0=3 b1=4, parameters pA0=5 pA1=6,
/// pB0|a0=7 pB1|a0=8 pB0|a1=9 pB1|a1=10. Source variables: A=0, B=1.
pub struct Chain {
    pub circuit: Circuit,
    pub evidence: Evidence,
    pub maps: InterventionMaps,
}

pub fn chain(params: ChainParams) -> Chain {
    let mut b = CircuitBuilder::new();
    let lit: Vec<usize> = (1..=10).map(|v| b.literal(v)).collect();
    let mut a_branches = Vec::new();
    let mut b_sums = Vec::new();
    for a in 0..2 {
        let b0 = b.mult(&[lit[2], lit[6 + 2 * a]]);
        let b1 = b.mult(&[lit[3], lit[7 + 2 * a]]);
        let sum_b = b.add(&[b0, b1]);
        b_sums.push(sum_b);
        a_branches.push(b.mult(&[lit[a], lit[4 + a], sum_b]));
    }
    let root = b.add(&a_branches);
    let circuit = b.build().expect("chain circuit is well formed");

    let mut evidence = Evidence::new(10);
    let weights = [
        (5, params.p_a[0]),
        (6, params.p_a[1]),
        (7, params.p_b_given_a[0][0]),
        (8, params.p_b_given_a[0][1]),
        (9, params.p_b_given_a[1][0]),
        (10, params.p_b_given_a[1][1]),
    ];
    for (var, w) in weights {
        evidence.set_weight(var, w).expect("parameter variable exists");
    }

    let mut node_split_var = vec![None; circuit.len()];
    node_split_var[root] = Some(1);
    for &s in &b_sums {
        node_split_var[s] = Some(3);
    }
    let maps = InterventionMaps {
        node_split_var,
        ac_var_source: vec![None, Some(0), Some(0), Some(1), Some(1), None, None, None, None, None, None],
        ac_var_is_indicator: (0..=10).map(|v| (1..=4).contains(&v)).collect(),
        parameter_source: vec![
            None,
            None,
            None,
            None,
            None,
            Some(0),
            Some(0),
            Some(1),
            Some(1),
            Some(1),
            Some(1),
        ],
    };

    Chain {
        circuit,
        evidence,
        maps,
    }
}

/// Builds a DAG over literals `±1..=±num_vars` followed by internal nodes.
///
/// `internal[i] = (kind, picks)`: kind 0 = MULT, 1 = ADD, 2 = MAX; each pick
/// selects a child among all earlier nodes. `weights` holds, per variable,
/// the negative then the positive weight.
pub fn build_dag(num_vars: usize, weights: &[f64], internal: &[(u8, Vec<usize>)]) -> (Circuit, Evidence) {
    let mut b = CircuitBuilder::new();
    for var in 1..=num_vars as i32 {
        b.literal(var);
        b.literal(-var);
    }
    for (kind, picks) in internal {
        let existing = b.len();
        let children: Vec<usize> = picks.iter().map(|p| p % existing).collect();
        match kind % 3 {
            0 => b.mult(&children),
            1 => b.add(&children),
            _ => b.max(&children),
        };
    }
    let circuit = b.build().expect("generated DAG is topologically ordered");

    let mut evidence = Evidence::new(num_vars);
    for var in 1..=num_vars {
        evidence
            .set_var_weights(var, weights[2 * (var - 1)], weights[2 * (var - 1) + 1])
            .expect("variable in range");
    }
    (circuit, evidence)
}

/// Independent recursive evaluation with plain sum/product/max semantics.
pub fn reference_value(circuit: &Circuit, evidence: &Evidence, n: usize, memo: &mut HashMap<usize, f64>) -> f64 {
    if let Some(&v) = memo.get(&n) {
        return v;
    }
    let children: Vec<f64> = circuit
        .children(n)
        .to_vec()
        .into_iter()
        .map(|ch| reference_value(circuit, evidence, ch, memo))
        .collect();
    let v = match circuit.kind(n) {
        NodeKind::Mult => children.iter().product(),
        NodeKind::Add => children.iter().sum(),
        NodeKind::Max => children.iter().cloned().fold(0.0, f64::max),
        NodeKind::Literal => evidence.weight(circuit.literal(n)).expect("literal in range"),
        NodeKind::Constant => 0.0,
    };
    memo.insert(n, v);
    v
}

pub fn reference_root(circuit: &Circuit, evidence: &Evidence) -> f64 {
    reference_value(circuit, evidence, circuit.root(), &mut HashMap::new())
}

pub fn assert_close(actual: f64, expected: f64, what: &str) {
    let scale = actual.abs().max(expected.abs()).max(1.0);
    assert!(
        (actual - expected).abs() <= 1e-12 * scale,
        "{}: expected {}, got {}",
        what,
        expected,
        actual
    );
}
