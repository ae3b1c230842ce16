//! Benchmarks for the evaluate, differentiate and bubble-up passes.
//!
//! Run with:
//! - `cargo bench --bench evaluation`
//! - `cargo bench --bench evaluation --features parallel`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use acbound_core::{
    bound_interventions, Calculator, Circuit, CircuitBuilder, DiffMode, Evidence,
    InterventionMaps, NormalCalculator,
};

/// Naive-Bayes style circuit: one class variable with `width` features, each
/// a binary sum of indicator-times-parameter products.
fn make_circuit(width: usize, seed: u64) -> (Circuit, Evidence, InterventionMaps) {
    let mut state = seed;
    let mut next_unit = || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        0.05 + 0.9 * ((state >> 11) as f64) / ((u64::MAX >> 11) as f64)
    };

    let mut b = CircuitBuilder::new();
    let mut evidence_weights = Vec::new();
    let mut node_split_var = Vec::new();
    let mut next_var = 1i32;
    let mut branches = Vec::new();
    let class_vars = [next_var, next_var + 1];
    next_var += 2;

    for class in 0..2 {
        let mut factors = vec![b.literal(class_vars[class])];
        for _ in 0..width {
            let ind = [next_var, next_var + 1];
            let par = [next_var + 2, next_var + 3];
            next_var += 4;
            let p = next_unit();
            evidence_weights.push((par[0], p));
            evidence_weights.push((par[1], 1.0 - p));
            let terms: Vec<usize> = (0..2)
                .map(|k| {
                    let i = b.literal(ind[k]);
                    let t = b.literal(par[k]);
                    b.mult(&[i, t])
                })
                .collect();
            let sum = b.add(&terms);
            node_split_var.push((sum, ind[0] as usize));
            factors.push(sum);
        }
        branches.push(b.mult(&factors));
    }
    let root = b.add(&branches);
    let circuit = b.build().expect("benchmark circuit is well formed");

    let num_vars = (next_var - 1) as usize;
    let mut evidence = Evidence::new(num_vars);
    for (lit, w) in evidence_weights {
        evidence.set_weight(lit, w).expect("parameter exists");
    }

    let mut split = vec![None; circuit.len()];
    split[root] = Some(1);
    let mut ac_var_source = vec![None; num_vars + 1];
    ac_var_source[1] = Some(0);
    for (i, (node, var)) in node_split_var.into_iter().enumerate() {
        split[node] = Some(var);
        ac_var_source[var] = Some(1 + i % width);
    }
    let maps = InterventionMaps {
        node_split_var: split,
        ac_var_source,
        ac_var_is_indicator: vec![false; num_vars + 1],
        parameter_source: vec![None; num_vars + 1],
    };
    (circuit, evidence, maps)
}

fn bench_passes(c: &mut Criterion) {
    let mut group = c.benchmark_group("passes");
    for width in [16_usize, 256, 4096] {
        let (circuit, evidence, maps) = make_circuit(width, width as u64);
        let free = vec![true; width + 1];
        let mut calc = NormalCalculator::new(circuit.len(), true);

        group.bench_with_input(BenchmarkId::new("evaluate", width), &circuit, |b, circuit| {
            b.iter(|| calc.evaluate(black_box(circuit), black_box(&evidence)).unwrap());
        });

        calc.evaluate(&circuit, &evidence).unwrap();
        group.bench_with_input(BenchmarkId::new("differentiate", width), &circuit, |b, circuit| {
            b.iter(|| calc.differentiate(black_box(circuit), DiffMode::Sum).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("bubble_up", width), &circuit, |b, circuit| {
            b.iter(|| {
                black_box(
                    calc.bubble_up(black_box(circuit), &evidence, &maps, &free)
                        .unwrap(),
                )
            });
        });
    }
    group.finish();
}

fn bench_batch_bounds(c: &mut Criterion) {
    let width = 256;
    let (circuit, evidence, maps) = make_circuit(width, 7);
    let sets: Vec<Vec<bool>> = (0..64)
        .map(|i| (0..=width).map(|v| (v + i) % 3 == 0).collect())
        .collect();
    c.bench_function("bound_interventions/64x256", |b| {
        b.iter(|| black_box(bound_interventions(&circuit, &evidence, &maps, black_box(&sets)).unwrap()));
    });
}

criterion_group!(benches, bench_passes, bench_batch_bounds);
criterion_main!(benches);
