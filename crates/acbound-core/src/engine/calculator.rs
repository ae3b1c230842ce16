//! Calculator capability interface and configuration.
//!
//! A calculator owns the per-node buffers of one circuit (values, force-zero
//! flags and, optionally, derivatives) and exposes the passes that fill them.
//! Passes take `&mut self`; concurrent users each hold their own calculator
//! while sharing the circuit by reference.

use std::fmt;

use crate::engine::circuit::Circuit;
use crate::engine::errors::CalcError;
use crate::engine::evidence::Evidence;

/// Default relative tolerance for [`Calculator::values_are_close`].
pub const DEFAULT_CLOSE_TOLERANCE: f64 = 1e-9;

/// Semiring used by the differentiation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DiffMode {
    /// Sum-product: contributions from several parents add up.
    Sum,
    /// Max-product: contributions from several parents combine by maximum.
    Max,
}

impl fmt::Display for DiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffMode::Sum => f.write_str("sum-mode"),
            DiffMode::Max => f.write_str("max-mode"),
        }
    }
}

/// Configuration for a calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculatorConfig {
    /// Whether to allocate derivative storage.
    pub enable_differentiation: bool,
    /// Relative tolerance used by `values_are_close`.
    pub close_tolerance: f64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            enable_differentiation: true,
            close_tolerance: DEFAULT_CLOSE_TOLERANCE,
        }
    }
}

impl CalculatorConfig {
    pub(crate) fn validate(self) -> Result<Self, CalcError> {
        if !self.close_tolerance.is_finite() || self.close_tolerance < 0.0 {
            return Err(CalcError::ValidationError(
                "calculator: close_tolerance must be finite and >= 0".into(),
            ));
        }
        Ok(self)
    }
}

/// Evaluation and differentiation over a circuit in some numeric representation.
pub trait Calculator {
    /// Bottom-up pass computing every node's value under the given evidence.
    fn evaluate(&mut self, circuit: &Circuit, evidence: &Evidence) -> Result<(), CalcError>;

    /// Top-down pass computing the sensitivity of the root to every node.
    ///
    /// Requires values from an [`evaluate`](Self::evaluate) pass on the same
    /// circuit and evidence.
    fn differentiate(&mut self, circuit: &Circuit, mode: DiffMode) -> Result<(), CalcError>;

    /// Value of node `n` as seen by its parents.
    fn node_value(&self, n: usize) -> f64;

    /// Derivative of the root with respect to node `n`, if current.
    fn node_partial(&self, n: usize) -> Option<f64>;

    /// Derivative times value for node `n`, if current.
    fn node_marginal(&self, n: usize) -> Option<f64>;

    /// Marginal of node `n` normalised by the root value, if current.
    fn node_posterior(&self, n: usize) -> Option<f64>;

    /// Approximate equality of two node values.
    fn values_are_close(&self, n1: usize, n2: usize) -> bool;

    /// Exact equality of two node values.
    fn values_are_equal(&self, n1: usize, n2: usize) -> bool;

    /// The zero element of the representation.
    fn zero(&self) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_enables_differentiation() {
        let config = CalculatorConfig::default();
        assert!(config.enable_differentiation);
        assert_eq!(config.close_tolerance, DEFAULT_CLOSE_TOLERANCE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let config = CalculatorConfig {
            close_tolerance: -1.0,
            ..CalculatorConfig::default()
        };
        assert!(matches!(config.validate(), Err(CalcError::ValidationError(_))));
        let config = CalculatorConfig {
            close_tolerance: f64::NAN,
            ..CalculatorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
