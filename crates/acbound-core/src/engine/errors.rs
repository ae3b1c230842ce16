//! Error types for circuit passes.

use thiserror::Error;

use crate::engine::calculator::DiffMode;
use crate::engine::circuit::NodeKind;

/// Errors that can occur while building a circuit or running a pass over it.
///
/// Every variant is fatal for the pass that raised it: the value and
/// derivative buffers of the calculator must be treated as garbage until the
/// next successful pass.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// A product of nonzero factors collapsed to zero in floating point.
    ///
    /// Distinct from a genuine zero product, which is tracked through the
    /// force-zero flag. No rescaling is attempted.
    #[error("numeric underflow at node {node}: nonzero product collapsed to zero")]
    Underflow { node: usize },

    /// A raw type tag that does not name any node kind.
    #[error("unexpected node type tag {tag} at node {node}")]
    UnknownNodeType { node: usize, tag: u8 },

    /// A node kind that the requested differentiation mode cannot handle.
    #[error("did not expect {kind} node {node} in {mode} differentiation")]
    ModeMismatch {
        node: usize,
        kind: NodeKind,
        mode: DiffMode,
    },

    /// A constant node reached by the bound relaxation.
    #[error("found constant node {node} during bound relaxation")]
    ConstantInRelaxation { node: usize },

    /// Differentiation requested without values from a matching evaluation.
    #[error("stale values: {0}")]
    StaleValues(String),

    /// Differentiation requested on a calculator built without derivative storage.
    #[error("differentiation is not enabled for this calculator")]
    DifferentiationDisabled,

    /// The term count of a node does not fit in 128 bits.
    #[error("term count overflow at node {node}")]
    TermCountOverflow { node: usize },

    /// Malformed tables, mismatched sizes or invalid configuration.
    #[error("validation error: {0}")]
    ValidationError(String),
}
