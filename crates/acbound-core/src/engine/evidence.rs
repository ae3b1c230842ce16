//! Evidence snapshot.
//!
//! Holds the current weight of every literal: one vector for negative
//! literals and one for positive literals, both indexed by AC-variable
//! (1-based, slot 0 unused). Passes borrow the snapshot read-only; it changes
//! only between passes, and every change requires a fresh evaluation before
//! values or derivatives are read again.

use crate::engine::errors::CalcError;

/// Per-literal weights supplying the leaf values of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    negative: Vec<f64>,
    positive: Vec<f64>,
}

impl Evidence {
    /// Creates evidence for `num_vars` AC-variables with every weight set to 1.
    pub fn new(num_vars: usize) -> Self {
        Self {
            negative: vec![1.0; num_vars + 1],
            positive: vec![1.0; num_vars + 1],
        }
    }

    /// Creates evidence from explicit weight vectors (slot 0 unused).
    pub fn from_weights(negative: Vec<f64>, positive: Vec<f64>) -> Result<Self, CalcError> {
        if negative.len() != positive.len() {
            return Err(CalcError::ValidationError(format!(
                "weight vectors differ in length: {} negative, {} positive",
                negative.len(),
                positive.len()
            )));
        }
        if negative.is_empty() {
            return Err(CalcError::ValidationError(
                "weight vectors must include the unused slot 0".into(),
            ));
        }
        Ok(Self { negative, positive })
    }

    /// Number of AC-variables covered.
    pub fn num_vars(&self) -> usize {
        self.positive.len() - 1
    }

    /// Weights of negative literals, indexed by AC-variable.
    pub fn negative_weights(&self) -> &[f64] {
        &self.negative
    }

    /// Weights of positive literals, indexed by AC-variable.
    pub fn positive_weights(&self) -> &[f64] {
        &self.positive
    }

    fn check_var(&self, var: usize) -> Result<(), CalcError> {
        if var == 0 || var > self.num_vars() {
            return Err(CalcError::ValidationError(format!(
                "AC-variable {} outside 1..={}",
                var,
                self.num_vars()
            )));
        }
        Ok(())
    }

    /// Current weight of a signed literal.
    pub fn weight(&self, literal: i32) -> Result<f64, CalcError> {
        let var = literal.unsigned_abs() as usize;
        self.check_var(var)?;
        Ok(if literal < 0 {
            self.negative[var]
        } else {
            self.positive[var]
        })
    }

    /// Sets the weight of a signed literal.
    pub fn set_weight(&mut self, literal: i32, weight: f64) -> Result<(), CalcError> {
        let var = literal.unsigned_abs() as usize;
        self.check_var(var)?;
        if literal < 0 {
            self.negative[var] = weight;
        } else {
            self.positive[var] = weight;
        }
        Ok(())
    }

    /// Sets both weights of an AC-variable.
    pub fn set_var_weights(&mut self, var: usize, negative: f64, positive: f64) -> Result<(), CalcError> {
        self.check_var(var)?;
        self.negative[var] = negative;
        self.positive[var] = positive;
        Ok(())
    }

    /// Asserts a literal: its weight becomes 1 and its complement's 0.
    pub fn clamp(&mut self, literal: i32) -> Result<(), CalcError> {
        self.set_weight(literal, 1.0)?;
        self.set_weight(-literal, 0.0)
    }

    /// Retracts any evidence on an AC-variable, restoring both weights to 1.
    pub fn retract(&mut self, var: usize) -> Result<(), CalcError> {
        self.set_var_weights(var, 1.0, 1.0)
    }
}
