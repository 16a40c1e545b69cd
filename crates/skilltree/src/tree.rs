//! Tree store: the node collection and its parent/child links.
//!
//! [`TreeStore`] exclusively owns every [`Node`]. Structure changes only
//! through [`TreeStore::add_node`] and [`TreeStore::remove_node`], both of
//! which keep `parent` and `children` mutually consistent and re-run the
//! layout engine. Nodes are kept in creation order, which is also the order
//! the renderer draws them in.
//!
//! The store is a forest: every node without a parent is a root. Removing a
//! node splices its children into its own parent, or promotes them to roots
//! when the removed node had no parent.

use indexmap::IndexMap;
use log::{debug, info, warn};
use thiserror::Error;

use skilltree_core::{
    geometry::{Point, Size},
    identifier::{IdGenerator, NodeId},
};

use crate::{
    config::AppConfig,
    layout::{Edge, Engine},
};

/// Title given to children created without an explicit title.
pub const DEFAULT_TITLE: &str = "Skill";

/// Title of the root created by [`TreeStore::initialize`].
pub const ROOT_TITLE: &str = "Root Skill";

/// Offset of a new child from its parent when no position is given.
const CHILD_OFFSET: Point = Point::new(150.0, 50.0);

/// A labeled skill with a position on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    title: String,
    position: Point,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Top-left corner of the node box.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child ids in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Outcome of committing an edited title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleEdit {
    /// The trimmed text replaced the title.
    Applied,
    /// The text was empty after trimming; the previous title is kept.
    Rejected { kept: String },
    /// No node has the given id.
    UnknownNode,
}

/// A broken parent/child link found by [`TreeStore::check_consistency`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {node} refers to missing parent {parent}")]
    MissingParent { node: NodeId, parent: NodeId },

    #[error("node {node} is not listed among the children of its parent {parent}")]
    NotListedByParent { node: NodeId, parent: NodeId },

    #[error("node {parent} lists missing child {child}")]
    MissingChild { parent: NodeId, child: NodeId },

    #[error("node {parent} lists child {child}, whose parent is {actual:?}")]
    WrongParent {
        parent: NodeId,
        child: NodeId,
        actual: Option<NodeId>,
    },

    #[error("node {parent} lists child {child} more than once")]
    DuplicateChild { parent: NodeId, child: NodeId },
}

/// Owner of all nodes, the current selection and the layout engine.
#[derive(Debug, Clone)]
pub struct TreeStore {
    nodes: IndexMap<NodeId, Node>,
    ids: IdGenerator,
    selected: Option<NodeId>,
    canvas: Size,
    engine: Engine,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl TreeStore {
    /// Create an empty store with the given layout engine and canvas size.
    pub fn new(engine: Engine, canvas: Size) -> Self {
        Self {
            nodes: IndexMap::new(),
            ids: IdGenerator::default(),
            selected: None,
            canvas,
            engine,
        }
    }

    /// Create an empty store configured from `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Engine::from_config(config.layout()),
            config.canvas().size(),
        )
    }

    /// Add the initial root node centered horizontally, a third of the way down the canvas.
    pub fn initialize(&mut self) -> NodeId {
        let position = Point::new(self.canvas.width() / 2.0, self.canvas.height() / 3.0);
        self.add_node(None, ROOT_TITLE, Some(position))
    }

    /// Create a node, link it under `parent` and relax the layout.
    ///
    /// Without an explicit position the node is placed at a fixed offset from
    /// its parent, or at the canvas center when it has no parent. A `parent`
    /// that does not resolve yields a detached root node rather than an error.
    /// The new node becomes the selected node.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        title: impl Into<String>,
        position: Option<Point>,
    ) -> NodeId {
        let id = self.ids.next_id();

        let resolved_parent = parent.and_then(|parent_id| {
            let found = self.nodes.get_mut(&parent_id);
            if found.is_none() {
                warn!(node_id:% = id, parent_id:% = parent_id; "Parent not found, creating detached node");
            }
            found
        });

        let (parent, default_position) = match resolved_parent {
            Some(parent_node) => {
                parent_node.children.push(id);
                (
                    Some(parent_node.id),
                    parent_node.position.add_point(CHILD_OFFSET),
                )
            }
            None => (
                None,
                Point::new(self.canvas.width() / 2.0, self.canvas.height() / 2.0),
            ),
        };

        let node = Node {
            id,
            title: title.into(),
            position: position.unwrap_or(default_position),
            parent,
            children: Vec::new(),
        };
        debug!(node_id:% = id, parent_id:? = parent, title = node.title.as_str(); "Adding node");

        self.nodes.insert(id, node);
        self.selected = Some(id);
        self.run_layout();

        id
    }

    /// Remove a node, splicing its children into its parent, and relax the layout.
    ///
    /// Returns the removed node, or `None` when `id` is unknown.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let Some(removed) = self.nodes.shift_remove(&id) else {
            debug!(node_id:% = id; "Ignoring removal of unknown node");
            return None;
        };

        let new_parent = removed
            .parent
            .filter(|parent_id| self.nodes.contains_key(parent_id));

        if let Some(parent) = new_parent.and_then(|parent_id| self.nodes.get_mut(&parent_id)) {
            parent.children.retain(|child| *child != id);
            for child in &removed.children {
                if !parent.children.contains(child) {
                    parent.children.push(*child);
                }
            }
        }

        for child_id in &removed.children {
            if let Some(child) = self.nodes.get_mut(child_id) {
                child.parent = new_parent;
            }
        }

        if self.selected == Some(id) {
            self.selected = None;
        }

        info!(
            node_id:% = id,
            spliced_children = removed.children.len(),
            new_parent:? = new_parent;
            "Removed node"
        );

        self.run_layout();
        Some(removed)
    }

    /// Set the selected node. An unknown id clears the selection.
    pub fn select_node(&mut self, id: Option<NodeId>) {
        self.selected = id.filter(|id| self.nodes.contains_key(id));
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Move a node without running the layout engine.
    ///
    /// Returns `false` when `id` is unknown.
    pub fn set_position(&mut self, id: NodeId, position: Point) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    /// Commit an edited title. Surrounding whitespace is trimmed; empty text
    /// keeps the previous title.
    pub fn rename(&mut self, id: NodeId, text: &str) -> TitleEdit {
        let Some(node) = self.nodes.get_mut(&id) else {
            return TitleEdit::UnknownNode;
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            debug!(node_id:% = id; "Rejected empty title");
            return TitleEdit::Rejected {
                kept: node.title.clone(),
            };
        }

        node.title = trimmed.to_string();
        TitleEdit::Applied
    }

    /// Relax all node positions with the layout engine.
    pub fn run_layout(&mut self) {
        let edges = self.layout_edges();
        let mut positions: Vec<Point> = self.nodes.values().map(Node::position).collect();

        self.engine.relax(&mut positions, &edges);

        for (node, position) in self.nodes.values_mut().zip(positions) {
            node.position = position;
        }
    }

    fn layout_edges(&self) -> Vec<Edge> {
        self.nodes
            .values()
            .enumerate()
            .filter_map(|(child_index, node)| {
                let parent_index = self.nodes.get_index_of(&node.parent?)?;
                Some(Edge::new(child_index, parent_index))
            })
            .collect()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Nodes without a parent.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|node| node.is_root())
    }

    /// `(child, parent)` pairs in child creation order.
    pub fn edges(&self) -> impl Iterator<Item = (&Node, &Node)> {
        self.nodes.values().filter_map(|child| {
            let parent = self.nodes.get(&child.parent?)?;
            Some((child, parent))
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    /// Update the canvas size used for default node placement.
    pub fn set_canvas(&mut self, canvas: Size) {
        self.canvas = canvas;
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Verify that every parent link is mirrored by a children entry and vice versa.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found, in node order.
    pub fn check_consistency(&self) -> Result<(), TreeError> {
        for node in self.nodes.values() {
            if let Some(parent_id) = node.parent {
                let parent = self.nodes.get(&parent_id).ok_or(TreeError::MissingParent {
                    node: node.id,
                    parent: parent_id,
                })?;
                if !parent.children.contains(&node.id) {
                    return Err(TreeError::NotListedByParent {
                        node: node.id,
                        parent: parent_id,
                    });
                }
            }

            for (index, child_id) in node.children.iter().enumerate() {
                if node.children[..index].contains(child_id) {
                    return Err(TreeError::DuplicateChild {
                        parent: node.id,
                        child: *child_id,
                    });
                }
                let child = self.nodes.get(child_id).ok_or(TreeError::MissingChild {
                    parent: node.id,
                    child: *child_id,
                })?;
                if child.parent != Some(node.id) {
                    return Err(TreeError::WrongParent {
                        parent: node.id,
                        child: *child_id,
                        actual: child.parent,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;

    /// Store whose layout engine never moves anything.
    fn frozen_store() -> TreeStore {
        let engine = Engine::from_config(&LayoutConfig::default().with_iterations(0));
        TreeStore::new(engine, Size::new(800.0, 600.0))
    }

    fn children(store: &TreeStore, id: NodeId) -> Vec<NodeId> {
        store.node(id).unwrap().children().to_vec()
    }

    #[test]
    fn test_add_root_to_empty_store() {
        let mut store = TreeStore::default();
        let root = store.add_node(None, "Root", Some(Point::new(400.0, 300.0)));

        assert_eq!(store.len(), 1);
        let node = store.node(root).unwrap();
        assert_eq!(node.parent(), None);
        assert!(node.children().is_empty());
        assert_eq!(node.position(), Point::new(400.0, 300.0));
        assert_eq!(store.selected(), Some(root));
    }

    #[test]
    fn test_child_defaults_to_offset_from_parent() {
        let mut store = frozen_store();
        let root = store.add_node(None, "Root", Some(Point::new(400.0, 300.0)));
        let child = store.add_node(Some(root), "Child A", None);

        let node = store.node(child).unwrap();
        assert_eq!(node.position(), Point::new(550.0, 350.0));
        assert_eq!(node.parent(), Some(root));
        assert_eq!(children(&store, root), vec![child]);
        assert_eq!(store.selected(), Some(child));
    }

    #[test]
    fn test_parentless_node_defaults_to_canvas_center() {
        let mut store = frozen_store();
        let id = store.add_node(None, "Loose", None);
        assert_eq!(store.node(id).unwrap().position(), Point::new(400.0, 300.0));
    }

    #[test]
    fn test_dangling_parent_creates_detached_node() {
        let mut store = frozen_store();
        let root = store.add_node(None, "Root", None);
        store.remove_node(root);

        let orphan = store.add_node(Some(root), "Orphan", None);

        let node = store.node(orphan).unwrap();
        assert_eq!(node.parent(), None);
        assert_eq!(node.position(), Point::new(400.0, 300.0));
        assert!(store.check_consistency().is_ok());
    }

    #[test]
    fn test_initialize_places_root_in_upper_third() {
        let mut store = frozen_store();
        let root = store.initialize();
        let node = store.node(root).unwrap();
        assert_eq!(node.title(), ROOT_TITLE);
        assert_eq!(node.position(), Point::new(400.0, 200.0));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut store = frozen_store();
        let a = store.add_node(None, "A", None);
        store.remove_node(a);
        let b = store.add_node(None, "B", None);
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_remove_splices_grandchild_to_root() {
        let mut store = TreeStore::default();
        let root = store.add_node(None, "Root", Some(Point::new(400.0, 300.0)));
        let a = store.add_node(Some(root), "A", None);
        let b = store.add_node(Some(a), "B", None);

        let removed = store.remove_node(a).expect("node exists");

        assert_eq!(removed.id(), a);
        assert!(!store.contains(a));
        assert_eq!(store.node(b).unwrap().parent(), Some(root));
        assert_eq!(children(&store, root), vec![b]);
        assert!(store.check_consistency().is_ok());
    }

    #[test]
    fn test_remove_keeps_sibling_order_and_appends_spliced_children() {
        let mut store = frozen_store();
        let root = store.add_node(None, "Root", None);
        let first = store.add_node(Some(root), "First", None);
        let middle = store.add_node(Some(root), "Middle", None);
        let last = store.add_node(Some(root), "Last", None);
        let x = store.add_node(Some(middle), "X", None);
        let y = store.add_node(Some(middle), "Y", None);

        store.remove_node(middle);

        assert_eq!(children(&store, root), vec![first, last, x, y]);
        assert_eq!(store.node(x).unwrap().parent(), Some(root));
        assert_eq!(store.node(y).unwrap().parent(), Some(root));
        assert!(store.check_consistency().is_ok());
    }

    #[test]
    fn test_remove_root_promotes_children() {
        let mut store = frozen_store();
        let root = store.add_node(None, "Root", None);
        let a = store.add_node(Some(root), "A", None);
        let b = store.add_node(Some(root), "B", None);

        store.remove_node(root);

        let roots: Vec<NodeId> = store.roots().map(Node::id).collect();
        assert_eq!(roots, vec![a, b]);
        assert!(store.check_consistency().is_ok());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut store = frozen_store();
        let root = store.add_node(None, "Root", None);
        store.remove_node(root);
        let before = store.len();

        assert!(store.remove_node(root).is_none());
        assert_eq!(store.len(), before);
    }

    #[test]
    fn test_remove_clears_matching_selection() {
        let mut store = frozen_store();
        let root = store.add_node(None, "Root", None);
        let child = store.add_node(Some(root), "Child", None);

        store.select_node(Some(root));
        store.remove_node(child);
        assert_eq!(store.selected(), Some(root));

        store.remove_node(root);
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_select_unknown_clears_selection() {
        let mut store = frozen_store();
        let root = store.add_node(None, "Root", None);
        store.remove_node(root);
        let other = store.add_node(None, "Other", None);
        assert_eq!(store.selected(), Some(other));

        store.select_node(Some(root));
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_rename_trims_and_rejects_empty() {
        let mut store = frozen_store();
        let root = store.add_node(None, "Root", None);

        assert_eq!(store.rename(root, "  Algebra \n"), TitleEdit::Applied);
        assert_eq!(store.node(root).unwrap().title(), "Algebra");

        assert_eq!(
            store.rename(root, "   "),
            TitleEdit::Rejected {
                kept: "Algebra".to_string()
            }
        );
        assert_eq!(store.node(root).unwrap().title(), "Algebra");

        store.remove_node(root);
        assert_eq!(store.rename(root, "x"), TitleEdit::UnknownNode);
    }

    #[test]
    fn test_set_position_bypasses_layout() {
        let mut store = TreeStore::default();
        let root = store.add_node(None, "Root", Some(Point::new(0.0, 0.0)));
        let child = store.add_node(Some(root), "Child", None);

        assert!(store.set_position(child, Point::new(1.0, 1.0)));
        assert_eq!(store.node(child).unwrap().position(), Point::new(1.0, 1.0));
    }

    #[test]
    fn test_layout_separates_siblings() {
        let mut store = TreeStore::default();
        let root = store.add_node(None, "Root", Some(Point::new(400.0, 300.0)));
        let a = store.add_node(Some(root), "A", None);
        let b = store.add_node(Some(root), "B", None);

        let pa = store.node(a).unwrap().position();
        let pb = store.node(b).unwrap().position();
        assert!(pa.distance(pb) > 100.0, "siblings overlap: {pa:?} {pb:?}");
    }

    #[test]
    fn test_edges_follow_node_order() {
        let mut store = frozen_store();
        let root = store.add_node(None, "Root", None);
        let a = store.add_node(Some(root), "A", None);
        let b = store.add_node(Some(a), "B", None);

        let edges: Vec<(NodeId, NodeId)> = store
            .edges()
            .map(|(child, parent)| (child.id(), parent.id()))
            .collect();
        assert_eq!(edges, vec![(a, root), (b, a)]);
    }

    #[test]
    fn test_check_consistency_reports_broken_link() {
        let mut store = frozen_store();
        let root = store.add_node(None, "Root", None);
        let child = store.add_node(Some(root), "Child", None);

        store.nodes.get_mut(&root).unwrap().children.clear();

        assert_eq!(
            store.check_consistency(),
            Err(TreeError::NotListedByParent {
                node: child,
                parent: root
            })
        );
    }

    #[test]
    fn test_check_consistency_reports_duplicate_child() {
        let mut store = frozen_store();
        let root = store.add_node(None, "Root", None);
        let child = store.add_node(Some(root), "Child", None);

        store.nodes.get_mut(&root).unwrap().children.push(child);

        assert_eq!(
            store.check_consistency(),
            Err(TreeError::DuplicateChild {
                parent: root,
                child
            })
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::config::{LayoutConfig, RelaxationMode};

    #[derive(Debug, Clone)]
    enum Op {
        /// Add under the live node at this index, or as a root when out of range.
        Add(usize),
        /// Remove the live node at this index.
        Remove(usize),
        RemoveRoot,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0usize..24).prop_map(Op::Add),
            2 => (0usize..16).prop_map(Op::Remove),
            1 => Just(Op::RemoveRoot),
        ]
    }

    fn apply(store: &mut TreeStore, op: &Op) {
        let live: Vec<NodeId> = store.nodes().map(Node::id).collect();
        match *op {
            Op::Add(index) => {
                store.add_node(live.get(index).copied(), DEFAULT_TITLE, None);
            }
            Op::Remove(index) => {
                if !live.is_empty() {
                    store.remove_node(live[index % live.len()]);
                }
            }
            Op::RemoveRoot => {
                let root = store.roots().next().map(Node::id);
                if let Some(root) = root {
                    store.remove_node(root);
                }
            }
        }
    }

    fn check_links_survive_edits(
        ops: &[Op],
        relaxation: RelaxationMode,
    ) -> Result<(), TestCaseError> {
        let config = LayoutConfig::default()
            .with_iterations(5)
            .with_relaxation(relaxation);
        let mut store = TreeStore::new(Engine::from_config(&config), Size::new(800.0, 600.0));
        store.initialize();

        for (step, op) in ops.iter().enumerate() {
            apply(&mut store, op);

            prop_assert!(
                store.check_consistency().is_ok(),
                "step {} ({:?}): {:?}",
                step,
                op,
                store.check_consistency()
            );
            for node in store.nodes() {
                let position = node.position();
                prop_assert!(
                    position.x().is_finite() && position.y().is_finite(),
                    "step {}: node {} at {:?}",
                    step,
                    node.id(),
                    position
                );
            }
            if let Some(selected) = store.selected() {
                prop_assert!(store.contains(selected));
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn links_stay_consistent_in_place(ops in prop::collection::vec(op_strategy(), 1..40)) {
            check_links_survive_edits(&ops, RelaxationMode::InPlace)?;
        }

        #[test]
        fn links_stay_consistent_batched(ops in prop::collection::vec(op_strategy(), 1..40)) {
            check_links_survive_edits(&ops, RelaxationMode::Batched)?;
        }
    }
}
