//! # acbound core
//!
//! Evaluation, differentiation and interventional upper bounds for
//! arithmetic circuits compiled from probabilistic graphical models.
//!
//! ## Usage
//!
//! ```rust
//! use acbound_core::{Calculator, CircuitBuilder, DiffMode, Evidence, NormalCalculator};
//!
//! // root = x1 * t3 + x2 * t4
//! let mut b = CircuitBuilder::new();
//! let x1 = b.literal(1);
//! let x2 = b.literal(2);
//! let t3 = b.literal(3);
//! let t4 = b.literal(4);
//! let m1 = b.mult(&[x1, t3]);
//! let m2 = b.mult(&[x2, t4]);
//! b.add(&[m1, m2]);
//! let circuit = b.build()?;
//!
//! let mut evidence = Evidence::new(4);
//! evidence.set_weight(3, 0.25)?;
//! evidence.set_weight(4, 0.75)?;
//!
//! let mut calc = NormalCalculator::new(circuit.len(), true);
//! calc.evaluate(&circuit, &evidence)?;
//! calc.differentiate(&circuit, DiffMode::Sum)?;
//! assert_eq!(calc.node_partial(x1), Some(0.25));
//! # Ok::<(), acbound_core::CalcError>(())
//! ```

#![forbid(unsafe_code)]

pub mod engine;

// Re-export commonly used types
pub use engine::bubble_up::{InterventionMaps, RelaxationSummary};
pub use engine::calculator::{Calculator, CalculatorConfig, DiffMode};
pub use engine::circuit::{Circuit, CircuitBuilder, CircuitTables, NodeKind};
pub use engine::errors::CalcError;
pub use engine::evidence::Evidence;
pub use engine::marginals::{literal_marginals, literal_posteriors, LiteralTable};
pub use engine::normal::{NormalCalculator, ValueSnapshot};
pub use engine::parallel_bounds::bound_interventions;
pub use engine::term_count::{count_terms, TermCounts};
