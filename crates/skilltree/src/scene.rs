//! Renderer-facing snapshot of a skill tree.
//!
//! A [`Scene`] is built from a [`TreeStore`] after every visible change and
//! handed to a [`Renderer`]. It carries everything a drawing surface needs:
//! node boxes with titles and selection state, and one directed edge per
//! parent-child pair with precomputed endpoints and arrow head.

use skilltree_core::{
    geometry::{Bounds, Point, Size},
    identifier::NodeId,
};

use crate::tree::TreeStore;

/// Size of every node box.
pub const NODE_SIZE: Size = Size::new(120.0, 40.0);

/// Length of the arrow head sides.
const ARROW_SIZE: f32 = 10.0;

/// Half-angle of the arrow head opening.
const ARROW_SPREAD: f32 = std::f32::consts::FRAC_PI_6;

/// A drawing surface for skill tree scenes.
pub trait Renderer {
    /// Draw the full scene, replacing whatever was drawn before.
    fn render(&mut self, scene: &Scene);
}

/// Renderer that discards every scene.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _scene: &Scene) {}
}

/// A node box ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub id: NodeId,
    pub title: String,
    /// Top-left corner of the box.
    pub position: Point,
    pub selected: bool,
}

impl NodeView {
    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(self.position, NODE_SIZE)
    }
}

/// A directed parent-to-child connection ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeView {
    /// Parent node.
    pub from: NodeId,
    /// Child node.
    pub to: NodeId,
    /// Anchor on the parent box.
    pub start: Point,
    /// Anchor on the child box, where the arrow head points.
    pub end: Point,
    /// Tip followed by the two wing points of the arrow head.
    pub arrow_head: [Point; 3],
    /// True when either end is the selected node.
    pub highlighted: bool,
}

/// Everything a [`Renderer`] draws in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub canvas: Size,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl Scene {
    /// Snapshot the store's nodes (creation order) and edges (child creation order).
    pub fn from_store(store: &TreeStore) -> Self {
        let selected = store.selected();

        let nodes = store
            .nodes()
            .map(|node| NodeView {
                id: node.id(),
                title: node.title().to_string(),
                position: node.position(),
                selected: selected == Some(node.id()),
            })
            .collect();

        let edges = store
            .edges()
            .map(|(child, parent)| {
                let start = anchor(parent.position());
                let end = anchor(child.position());
                EdgeView {
                    from: parent.id(),
                    to: child.id(),
                    start,
                    end,
                    arrow_head: arrow_head(start, end),
                    highlighted: selected == Some(child.id()) || selected == Some(parent.id()),
                }
            })
            .collect();

        Self {
            canvas: store.canvas(),
            nodes,
            edges,
        }
    }

    /// Union of the canvas and every node box.
    pub fn bounds(&self) -> Bounds {
        let canvas = Bounds::new_from_top_left(Point::default(), self.canvas);
        self.nodes
            .iter()
            .fold(canvas, |acc, node| acc.merge(&node.bounds()))
    }
}

/// Edge anchor of a node box whose top-left corner is `position`.
pub fn anchor(position: Point) -> Point {
    position.add_point(NODE_SIZE.center_offset())
}

/// Arrow head triangle for a line running from `start` to `end`.
///
/// Returns the tip (`end`) followed by the two wing points, each
/// `ARROW_SIZE` back from the tip at `±ARROW_SPREAD` off the line.
pub fn arrow_head(start: Point, end: Point) -> [Point; 3] {
    let angle = end.sub_point(start).angle();
    [
        end,
        end.sub_point(Point::from_polar(ARROW_SIZE, angle - ARROW_SPREAD)),
        end.sub_point(Point::from_polar(ARROW_SIZE, angle + ARROW_SPREAD)),
    ]
}
