//! # Circuit structure
//!
//! Read-only arithmetic circuit stored in compressed sparse row form.
//!
//! ## Layout
//!
//! - `kinds[n]`: the node kind
//! - `literals[n]`: signed literal id for LITERAL nodes, 0 otherwise
//! - `last_edge[n]`: exclusive end of node `n`'s child range
//! - `children[e]`: child node index for edge `e`
//!
//! The children of node `n` are `children[last_edge[n - 1]..last_edge[n]]`,
//! with a lower bound of 0 for the first node. Every child index is strictly
//! less than its parent's, so a single ascending sweep visits children before
//! parents. The last node is the root.
//!
//! ## Example
//!
//! ```rust
//! use acbound_core::engine::circuit::CircuitBuilder;
//!
//! let mut b = CircuitBuilder::new();
//! let x = b.literal(1);
//! let y = b.literal(2);
//! b.add(&[x, y]);
//! let circuit = b.build().unwrap();
//! assert_eq!(circuit.root(), 2);
//! ```

use std::fmt;

use crate::engine::errors::CalcError;

/// Kind of a circuit node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NodeKind {
    /// Product of children.
    Mult,
    /// Sum of children.
    Add,
    /// Maximum of children.
    Max,
    /// Leaf reading a weight from the evidence.
    Literal,
    /// Leaf with no evidence weight; never read by the passes.
    Constant,
}

impl NodeKind {
    /// Raw tag for MULT nodes.
    pub const MULT_TAG: u8 = 0;
    /// Raw tag for ADD nodes.
    pub const ADD_TAG: u8 = 1;
    /// Raw tag for MAX nodes.
    pub const MAX_TAG: u8 = 2;
    /// Raw tag for LITERAL nodes.
    pub const LITERAL_TAG: u8 = 3;
    /// Raw tag for CONSTANT nodes.
    pub const CONSTANT_TAG: u8 = 4;

    /// Decodes a raw tag for node `node`.
    pub fn from_tag(node: usize, tag: u8) -> Result<Self, CalcError> {
        match tag {
            Self::MULT_TAG => Ok(NodeKind::Mult),
            Self::ADD_TAG => Ok(NodeKind::Add),
            Self::MAX_TAG => Ok(NodeKind::Max),
            Self::LITERAL_TAG => Ok(NodeKind::Literal),
            Self::CONSTANT_TAG => Ok(NodeKind::Constant),
            _ => Err(CalcError::UnknownNodeType { node, tag }),
        }
    }

    /// The raw tag of this kind.
    pub fn tag(self) -> u8 {
        match self {
            NodeKind::Mult => Self::MULT_TAG,
            NodeKind::Add => Self::ADD_TAG,
            NodeKind::Max => Self::MAX_TAG,
            NodeKind::Literal => Self::LITERAL_TAG,
            NodeKind::Constant => Self::CONSTANT_TAG,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Mult => "MULT",
            NodeKind::Add => "ADD",
            NodeKind::Max => "MAX",
            NodeKind::Literal => "LITERAL",
            NodeKind::Constant => "CONSTANT",
        };
        f.write_str(name)
    }
}

/// Raw circuit tables as produced by an external loader.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CircuitTables {
    /// Raw node type tags (see [`NodeKind::from_tag`]).
    pub tags: Vec<u8>,
    /// Signed literal per node; ignored for non-literal nodes.
    pub literals: Vec<i32>,
    /// Exclusive end of each node's child range.
    pub last_edge: Vec<usize>,
    /// Flattened child list.
    pub children: Vec<usize>,
}

/// Validated, immutable arithmetic circuit.
///
/// Safe to share by reference across any number of calculators and threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Circuit {
    kinds: Vec<NodeKind>,
    literals: Vec<i32>,
    last_edge: Vec<usize>,
    children: Vec<usize>,
    num_vars: usize,
}

impl Circuit {
    /// Builds a circuit from decoded tables, checking the structural invariants.
    pub fn new(
        kinds: Vec<NodeKind>,
        literals: Vec<i32>,
        last_edge: Vec<usize>,
        children: Vec<usize>,
    ) -> Result<Self, CalcError> {
        let num_nodes = kinds.len();
        if num_nodes == 0 {
            return Err(CalcError::ValidationError(
                "circuit must have at least one node".into(),
            ));
        }
        if literals.len() != num_nodes || last_edge.len() != num_nodes {
            return Err(CalcError::ValidationError(format!(
                "table length mismatch: {} kinds, {} literals, {} edge bounds",
                num_nodes,
                literals.len(),
                last_edge.len()
            )));
        }

        let mut num_vars = 0usize;
        let mut start = 0usize;
        for n in 0..num_nodes {
            let end = last_edge[n];
            if end < start || end > children.len() {
                return Err(CalcError::ValidationError(format!(
                    "node {}: child range {}..{} is not within 0..{}",
                    n,
                    start,
                    end,
                    children.len()
                )));
            }
            if let Some(&bad) = children[start..end].iter().find(|&&ch| ch >= n) {
                return Err(CalcError::ValidationError(format!(
                    "node {}: child {} breaks topological order",
                    n, bad
                )));
            }
            if kinds[n] == NodeKind::Literal {
                let lit = literals[n];
                if lit == 0 {
                    return Err(CalcError::ValidationError(format!(
                        "node {}: literal id must be non-zero",
                        n
                    )));
                }
                num_vars = num_vars.max(lit.unsigned_abs() as usize);
            }
            start = end;
        }
        if start != children.len() {
            return Err(CalcError::ValidationError(format!(
                "last edge bound {} does not cover {} children",
                start,
                children.len()
            )));
        }

        Ok(Self {
            kinds,
            literals,
            last_edge,
            children,
            num_vars,
        })
    }

    /// Builds a circuit from raw tables, decoding every tag.
    pub fn from_tables(tables: CircuitTables) -> Result<Self, CalcError> {
        let kinds = tables
            .tags
            .iter()
            .enumerate()
            .map(|(n, &tag)| NodeKind::from_tag(n, tag))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(kinds, tables.literals, tables.last_edge, tables.children)
    }

    /// Returns the raw tables of this circuit.
    pub fn to_tables(&self) -> CircuitTables {
        CircuitTables {
            tags: self.kinds.iter().map(|k| k.tag()).collect(),
            literals: self.literals.clone(),
            last_edge: self.last_edge.clone(),
            children: self.children.clone(),
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always false: a validated circuit has a root.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Index of the root node.
    pub fn root(&self) -> usize {
        self.kinds.len() - 1
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.children.len()
    }

    /// Largest AC-variable referenced by any literal.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Kind of node `n`.
    #[inline]
    pub fn kind(&self, n: usize) -> NodeKind {
        self.kinds[n]
    }

    /// All node kinds in index order.
    pub fn kinds(&self) -> &[NodeKind] {
        &self.kinds
    }

    /// Signed literal of node `n` (0 for non-literal nodes built by [`CircuitBuilder`]).
    #[inline]
    pub fn literal(&self, n: usize) -> i32 {
        self.literals[n]
    }

    /// Children of node `n`.
    #[inline]
    pub fn children(&self, n: usize) -> &[usize] {
        let start = if n == 0 { 0 } else { self.last_edge[n - 1] };
        &self.children[start..self.last_edge[n]]
    }
}

/// Appends nodes in topological order and produces a [`Circuit`].
///
/// The last node added becomes the root.
#[derive(Debug, Default, Clone)]
pub struct CircuitBuilder {
    kinds: Vec<NodeKind>,
    literals: Vec<i32>,
    last_edge: Vec<usize>,
    children: Vec<usize>,
}

impl CircuitBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, kind: NodeKind, literal: i32, children: &[usize]) -> usize {
        let id = self.kinds.len();
        self.kinds.push(kind);
        self.literals.push(literal);
        self.children.extend_from_slice(children);
        self.last_edge.push(self.children.len());
        id
    }

    /// Adds a literal leaf. Returns its index.
    pub fn literal(&mut self, literal: i32) -> usize {
        self.push(NodeKind::Literal, literal, &[])
    }

    /// Adds a constant leaf. Returns its index.
    pub fn constant(&mut self) -> usize {
        self.push(NodeKind::Constant, 0, &[])
    }

    /// Adds a product node. Returns its index.
    pub fn mult(&mut self, children: &[usize]) -> usize {
        self.push(NodeKind::Mult, 0, children)
    }

    /// Adds a sum node. Returns its index.
    pub fn add(&mut self, children: &[usize]) -> usize {
        self.push(NodeKind::Add, 0, children)
    }

    /// Adds a max node. Returns its index.
    pub fn max(&mut self, children: &[usize]) -> usize {
        self.push(NodeKind::Max, 0, children)
    }

    /// Number of nodes added so far.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns true if no node was added.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Validates and freezes the circuit.
    pub fn build(self) -> Result<Circuit, CalcError> {
        Circuit::new(self.kinds, self.literals, self.last_edge, self.children)
    }
}
