//! # Normal-space calculator
//!
//! Evaluates and differentiates a circuit with plain `f64` arithmetic.
//!
//! ## Zero handling
//!
//! Differentiating a product by dividing it by one factor fails when that
//! factor is zero. The forward pass therefore keeps, for every MULT node, the
//! product of its *nonzero* children together with a force-zero flag that is
//! set when exactly one child is zero:
//!
//! - no zero child: stored value = product, visible value = product
//! - one zero child: stored value = product of the others, visible value = 0
//! - two or more zero children: stored value = visible value = 0
//!
//! The reverse pass hands the whole contribution of a force-zero node to its
//! unique zero child, which is the exact partial derivative.
//!
//! ## Underflow
//!
//! A nonzero running product that rounds to zero is reported as
//! [`CalcError::Underflow`] rather than mistaken for a genuine zero.

use crate::engine::calculator::{Calculator, CalculatorConfig, DiffMode};
use crate::engine::circuit::{Circuit, NodeKind};
use crate::engine::errors::CalcError;
use crate::engine::evidence::Evidence;

const ZERO: f64 = 0.0;
const ONE: f64 = 1.0;

/// Which pass last wrote the value buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSnapshot {
    /// No pass has completed since construction or since a failed pass.
    Empty,
    /// Values come from [`Calculator::evaluate`].
    Evaluated,
    /// Values come from [`NormalCalculator::bubble_up`].
    Relaxed,
}

/// Calculator working in normal (non-log) space.
#[derive(Debug, Clone)]
pub struct NormalCalculator {
    /// Raw node values; for force-zero nodes, the product of nonzero children.
    pub(super) values: Vec<f64>,
    /// Set on MULT nodes with exactly one zero child.
    pub(super) force_zero: Vec<bool>,
    /// Allocated only when differentiation is enabled.
    pub(super) derivatives: Option<Vec<f64>>,
    pub(super) snapshot: ValueSnapshot,
    pub(super) derivatives_current: bool,
    close_tolerance: f64,
}

impl NormalCalculator {
    /// Creates a calculator for a circuit of `num_nodes` nodes.
    pub fn new(num_nodes: usize, enable_differentiation: bool) -> Self {
        Self::build(
            num_nodes,
            CalculatorConfig {
                enable_differentiation,
                ..CalculatorConfig::default()
            },
        )
    }

    /// Creates a calculator with explicit configuration.
    pub fn with_config(num_nodes: usize, config: CalculatorConfig) -> Result<Self, CalcError> {
        let config = config.validate()?;
        Ok(Self::build(num_nodes, config))
    }

    fn build(num_nodes: usize, config: CalculatorConfig) -> Self {
        Self {
            values: vec![ZERO; num_nodes],
            force_zero: vec![false; num_nodes],
            derivatives: config
                .enable_differentiation
                .then(|| vec![ZERO; num_nodes]),
            snapshot: ValueSnapshot::Empty,
            derivatives_current: false,
            close_tolerance: config.close_tolerance,
        }
    }

    /// Number of nodes this calculator was sized for.
    pub fn num_nodes(&self) -> usize {
        self.values.len()
    }

    /// Whether derivative storage was allocated.
    pub fn differentiation_enabled(&self) -> bool {
        self.derivatives.is_some()
    }

    /// Which pass last wrote the values.
    pub fn snapshot(&self) -> ValueSnapshot {
        self.snapshot
    }

    /// Raw stored value of node `n`, ignoring the force-zero flag.
    pub fn stored_value(&self, n: usize) -> f64 {
        self.values[n]
    }

    /// Whether node `n` is a product with exactly one zero child.
    pub fn is_forced_zero(&self, n: usize) -> bool {
        self.force_zero[n]
    }

    /// Visible value of the root; zero for a calculator sized for no nodes.
    pub fn root_value(&self) -> f64 {
        match self.values.len() {
            0 => ZERO,
            len => self.node_value(len - 1),
        }
    }

    pub(super) fn check_circuit(&self, circuit: &Circuit) -> Result<(), CalcError> {
        if circuit.len() != self.values.len() {
            return Err(CalcError::ValidationError(format!(
                "calculator sized for {} nodes, circuit has {}",
                self.values.len(),
                circuit.len()
            )));
        }
        Ok(())
    }

    pub(super) fn check_evidence(circuit: &Circuit, evidence: &Evidence) -> Result<(), CalcError> {
        if evidence.num_vars() < circuit.num_vars() {
            return Err(CalcError::ValidationError(format!(
                "evidence covers {} AC-variables, circuit uses {}",
                evidence.num_vars(),
                circuit.num_vars()
            )));
        }
        Ok(())
    }

    #[inline]
    fn effective(&self, n: usize) -> f64 {
        if self.force_zero[n] {
            ZERO
        } else {
            self.values[n]
        }
    }

    fn evaluate_nodes(&mut self, circuit: &Circuit, evidence: &Evidence) -> Result<(), CalcError> {
        let neg = evidence.negative_weights();
        let pos = evidence.positive_weights();
        self.force_zero.fill(false);

        for n in 0..circuit.len() {
            match circuit.kind(n) {
                NodeKind::Mult => {
                    let mut product = ONE;
                    let mut num_zeros = 0usize;
                    for &ch in circuit.children(n) {
                        let value = self.effective(ch);
                        if value == ZERO {
                            num_zeros += 1;
                            if num_zeros > 1 {
                                product = ZERO;
                                break;
                            }
                        } else {
                            product *= value;
                            if product == ZERO {
                                #[cfg(feature = "tracing")]
                                tracing::warn!("evaluate: product underflow at node {}", n);
                                return Err(CalcError::Underflow { node: n });
                            }
                        }
                    }
                    self.force_zero[n] = num_zeros == 1;
                    self.values[n] = product;
                }
                NodeKind::Add => {
                    self.values[n] = circuit
                        .children(n)
                        .iter()
                        .map(|&ch| self.effective(ch))
                        .sum();
                }
                NodeKind::Max => {
                    let mut best = ZERO;
                    for &ch in circuit.children(n) {
                        let value = self.effective(ch);
                        if value > best {
                            best = value;
                        }
                    }
                    self.values[n] = best;
                }
                NodeKind::Literal => {
                    let lit = circuit.literal(n);
                    let var = lit.unsigned_abs() as usize;
                    self.values[n] = if lit < 0 { neg[var] } else { pos[var] };
                }
                NodeKind::Constant => {}
            }
        }
        Ok(())
    }

    fn differentiate_nodes(&mut self, circuit: &Circuit, mode: DiffMode) -> Result<(), CalcError> {
        let Self {
            values,
            force_zero,
            derivatives,
            ..
        } = self;
        let derivatives = derivatives
            .as_mut()
            .ok_or(CalcError::DifferentiationDisabled)?;
        let effective = |n: usize| if force_zero[n] { ZERO } else { values[n] };

        derivatives.fill(ZERO);
        derivatives[circuit.root()] = ONE;

        for n in (0..circuit.len()).rev() {
            match circuit.kind(n) {
                NodeKind::Mult => {
                    let d = derivatives[n];
                    if d == ZERO {
                        continue;
                    }
                    let v = values[n];
                    if v == ZERO {
                        continue;
                    }
                    let contribution = d * v;
                    if contribution == ZERO {
                        #[cfg(feature = "tracing")]
                        tracing::warn!("differentiate: product underflow at node {}", n);
                        return Err(CalcError::Underflow { node: n });
                    }
                    if force_zero[n] {
                        // Only the unique zero factor is sensitive to first order.
                        if let Some(&ch) = circuit.children(n).iter().find(|&&ch| effective(ch) == ZERO) {
                            accumulate(&mut derivatives[ch], contribution, mode);
                        }
                    } else {
                        for &ch in circuit.children(n) {
                            accumulate(&mut derivatives[ch], contribution / effective(ch), mode);
                        }
                    }
                }
                NodeKind::Add => {
                    if mode == DiffMode::Max {
                        return Err(CalcError::ModeMismatch {
                            node: n,
                            kind: NodeKind::Add,
                            mode,
                        });
                    }
                    let d = derivatives[n];
                    for &ch in circuit.children(n) {
                        derivatives[ch] += d;
                    }
                }
                NodeKind::Max => {
                    if mode == DiffMode::Sum {
                        return Err(CalcError::ModeMismatch {
                            node: n,
                            kind: NodeKind::Max,
                            mode,
                        });
                    }
                    let d = derivatives[n];
                    for &ch in circuit.children(n) {
                        if d > derivatives[ch] {
                            derivatives[ch] = d;
                        }
                    }
                }
                NodeKind::Literal | NodeKind::Constant => {}
            }
        }
        Ok(())
    }

    fn current_derivative(&self, n: usize) -> Option<f64> {
        if !self.derivatives_current {
            return None;
        }
        self.derivatives.as_ref().map(|d| d[n])
    }
}

#[inline]
fn accumulate(slot: &mut f64, contribution: f64, mode: DiffMode) {
    match mode {
        DiffMode::Sum => *slot += contribution,
        DiffMode::Max => {
            if contribution > *slot {
                *slot = contribution;
            }
        }
    }
}

impl Calculator for NormalCalculator {
    fn evaluate(&mut self, circuit: &Circuit, evidence: &Evidence) -> Result<(), CalcError> {
        self.check_circuit(circuit)?;
        Self::check_evidence(circuit, evidence)?;
        self.snapshot = ValueSnapshot::Empty;
        self.derivatives_current = false;

        self.evaluate_nodes(circuit, evidence)?;
        self.snapshot = ValueSnapshot::Evaluated;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "evaluate: {} nodes, root value {:.6e}",
            circuit.len(),
            self.root_value()
        );
        Ok(())
    }

    fn differentiate(&mut self, circuit: &Circuit, mode: DiffMode) -> Result<(), CalcError> {
        if self.derivatives.is_none() {
            return Err(CalcError::DifferentiationDisabled);
        }
        self.check_circuit(circuit)?;
        match self.snapshot {
            ValueSnapshot::Evaluated => {}
            ValueSnapshot::Empty => {
                return Err(CalcError::StaleValues(
                    "differentiate requires a completed evaluate".into(),
                ))
            }
            ValueSnapshot::Relaxed => {
                return Err(CalcError::StaleValues(
                    "values hold a relaxed bound; evaluate again before differentiating".into(),
                ))
            }
        }
        self.derivatives_current = false;

        self.differentiate_nodes(circuit, mode)?;
        self.derivatives_current = true;

        #[cfg(feature = "tracing")]
        tracing::debug!("differentiate: {} over {} nodes", mode, circuit.len());
        Ok(())
    }

    fn node_value(&self, n: usize) -> f64 {
        self.effective(n)
    }

    fn node_partial(&self, n: usize) -> Option<f64> {
        self.current_derivative(n)
    }

    fn node_marginal(&self, n: usize) -> Option<f64> {
        self.current_derivative(n).map(|d| d * self.node_value(n))
    }

    fn node_posterior(&self, n: usize) -> Option<f64> {
        let d = self.current_derivative(n)?;
        let overall = self.root_value();
        Some(if overall == ZERO {
            ZERO
        } else {
            self.node_value(n) * d / overall
        })
    }

    fn values_are_close(&self, n1: usize, n2: usize) -> bool {
        let a = self.node_value(n1);
        let b = self.node_value(n2);
        a == b || (a - b).abs() <= self.close_tolerance * a.abs().max(b.abs())
    }

    fn values_are_equal(&self, n1: usize, n2: usize) -> bool {
        self.node_value(n1) == self.node_value(n2)
    }

    fn zero(&self) -> f64 {
        ZERO
    }
}
