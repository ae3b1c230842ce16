//! The calculator engine for arithmetic circuits.
//!
//! This module provides:
//! - **circuit**: Read-only circuit structure in compressed sparse row form
//! - **evidence**: Literal weight vectors supplying leaf values
//! - **calculator**: The calculator capability trait and its configuration
//! - **normal**: Normal-space evaluation and differentiation with exact zero handling
//! - **bubble_up**: Sum-to-max relaxation yielding interventional upper bounds
//! - **marginals**: Literal-level marginals and posteriors
//! - **term_count**: Diagnostic count of additive terms
//! - **parallel_bounds**: Bound relaxation over many intervention sets

pub mod bubble_up;
pub mod calculator;
pub mod circuit;
pub mod errors;
pub mod evidence;
pub mod marginals;
pub mod normal;
pub mod parallel_bounds;
pub mod term_count;
