//! Automatic arrangement of skill tree nodes.
//!
//! Layout works on a flat slice of node positions plus a list of
//! parent-child [`Edge`]s that index into that slice. It knows nothing about
//! titles, selection or the tree structure itself, which keeps it a pure
//! transformation of positions.

mod force;

pub use force::Engine;

/// A parent-child link expressed as indices into a position slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    child: usize,
    parent: usize,
}

impl Edge {
    pub fn new(child: usize, parent: usize) -> Self {
        Self { child, parent }
    }

    /// Index of the child end of the edge.
    pub fn child(self) -> usize {
        self.child
    }

    /// Index of the parent end of the edge.
    pub fn parent(self) -> usize {
        self.parent
    }
}
