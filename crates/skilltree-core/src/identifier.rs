//! Node identifiers derived from creation order.
//!
//! This module provides the [`NodeId`] type and the [`IdGenerator`] that hands
//! them out. Identifiers increase monotonically and are never reused, even
//! after the node they named has been removed.

use std::fmt;

/// Opaque identifier of a node in a skill tree.
///
/// # Examples
///
/// ```
/// use skilltree_core::identifier::IdGenerator;
///
/// let mut ids = IdGenerator::default();
/// let first = ids.next_id();
/// let second = ids.next_id();
///
/// assert!(first < second);
/// assert_eq!(first.to_string(), "1");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Returns the raw creation sequence number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic source of [`NodeId`] values.
///
/// The first identifier handed out is `1`.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    /// Returns a fresh identifier, distinct from every previous one.
    pub fn next_id(&mut self) -> NodeId {
        self.last += 1;
        NodeId(self.last)
    }
}
