//! SVG rendering of skill tree scenes.

use log::{debug, trace};
use svg::{
    Document,
    node::{Text as SvgText, element as svg_element},
};

use skilltree_core::{
    apply_stroke,
    color::Color,
    geometry::Point,
    stroke::StrokeDefinition,
};

use crate::{
    config::StyleConfig,
    scene::{EdgeView, NODE_SIZE, NodeView, Renderer, Scene},
};

/// Corner radius of node boxes.
const NODE_CORNER_RADIUS: f32 = 6.0;

/// Font size of node titles.
const TITLE_FONT_SIZE: f32 = 14.0;

/// Resolved drawing style.
#[derive(Debug, Clone)]
struct Theme {
    background: Option<Color>,
    node_fill: Color,
    node_border: StrokeDefinition,
    node_selected_border: StrokeDefinition,
    text: Color,
    edge: StrokeDefinition,
    edge_highlight: StrokeDefinition,
}

impl Theme {
    fn from_style(style: &StyleConfig) -> Result<Self, String> {
        let cap = style.edge_cap()?;
        let highlight = style.highlight_color()?;

        Ok(Self {
            background: style.background_color()?,
            node_fill: style.node_fill_color()?,
            node_border: StrokeDefinition::new(style.node_border_color()?, 1.0),
            node_selected_border: StrokeDefinition::new(highlight, style.highlight_width()),
            text: style.text_color()?,
            edge: StrokeDefinition::new(style.edge_color()?, style.edge_width()).with_cap(cap),
            edge_highlight: StrokeDefinition::new(highlight, style.highlight_width())
                .with_cap(cap),
        })
    }
}

/// Renderer that keeps the most recent scene as an SVG document.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    theme: Theme,
    document: Option<Document>,
}

impl SvgRenderer {
    /// Creates a renderer using the given style.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending value when a color or cap in
    /// `style` cannot be parsed.
    pub fn new(style: &StyleConfig) -> Result<Self, String> {
        Ok(Self {
            theme: Theme::from_style(style)?,
            document: None,
        })
    }

    /// The document for the last rendered scene, if any.
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Serialized SVG for the last rendered scene, if any.
    pub fn svg_string(&self) -> Option<String> {
        self.document.as_ref().map(|document| document.to_string())
    }

    fn render_edge(&self, edge: &EdgeView) -> svg_element::Group {
        let stroke = if edge.highlighted {
            &self.theme.edge_highlight
        } else {
            &self.theme.edge
        };

        let line = svg_element::Line::new()
            .set("x1", edge.start.x())
            .set("y1", edge.start.y())
            .set("x2", edge.end.x())
            .set("y2", edge.end.y());
        let line = apply_stroke!(line, stroke);

        let head = svg_element::Polygon::new()
            .set("points", polygon_points(&edge.arrow_head))
            .set("fill", stroke.color().to_string())
            .set("fill-opacity", stroke.color().alpha());

        svg_element::Group::new()
            .set("class", "edge")
            .set("data-from", edge.from.to_string())
            .set("data-to", edge.to.to_string())
            .add(line)
            .add(head)
    }

    fn render_node(&self, node: &NodeView) -> svg_element::Group {
        let border = if node.selected {
            &self.theme.node_selected_border
        } else {
            &self.theme.node_border
        };

        let rect = svg_element::Rectangle::new()
            .set("x", node.position.x())
            .set("y", node.position.y())
            .set("width", NODE_SIZE.width())
            .set("height", NODE_SIZE.height())
            .set("rx", NODE_CORNER_RADIUS)
            .set("fill", &self.theme.node_fill)
            .set("fill-opacity", self.theme.node_fill.alpha());
        let rect = apply_stroke!(rect, border);

        let center = node.bounds().center();
        let title = svg_element::Text::new("")
            .set("x", center.x())
            .set("y", center.y())
            .set("text-anchor", "middle")
            .set("dominant-baseline", "middle")
            .set("font-family", "sans-serif")
            .set("font-size", TITLE_FONT_SIZE)
            .set("fill", &self.theme.text)
            .add(SvgText::new(node.title.as_str()));

        let class = if node.selected { "node selected" } else { "node" };
        svg_element::Group::new()
            .set("class", class)
            .set("data-id", node.id.to_string())
            .add(rect)
            .add(title)
    }
}

impl Renderer for SvgRenderer {
    fn render(&mut self, scene: &Scene) {
        let bounds = scene.bounds();
        debug!(
            nodes = scene.nodes.len(),
            edges = scene.edges.len();
            "Rendering scene to SVG"
        );

        let mut document = Document::new()
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    bounds.min_x(),
                    bounds.min_y(),
                    bounds.width(),
                    bounds.height()
                ),
            )
            .set("width", bounds.width())
            .set("height", bounds.height());

        if let Some(background) = &self.theme.background {
            document = document.add(
                svg_element::Rectangle::new()
                    .set("x", bounds.min_x())
                    .set("y", bounds.min_y())
                    .set("width", bounds.width())
                    .set("height", bounds.height())
                    .set("fill", background)
                    .set("fill-opacity", background.alpha()),
            );
        }

        // Highlighted edges go last so they are painted over muted ones.
        let (highlighted, muted): (Vec<&EdgeView>, Vec<&EdgeView>) =
            scene.edges.iter().partition(|edge| edge.highlighted);
        let mut edges = svg_element::Group::new().set("class", "edges");
        for edge in muted.into_iter().chain(highlighted) {
            trace!(from:% = edge.from, to:% = edge.to; "Rendering edge");
            edges = edges.add(self.render_edge(edge));
        }

        let mut nodes = svg_element::Group::new().set("class", "nodes");
        for node in &scene.nodes {
            trace!(node_id:% = node.id, title = node.title.as_str(); "Rendering node");
            nodes = nodes.add(self.render_node(node));
        }

        self.document = Some(document.add(edges).add(nodes));
    }
}

fn polygon_points(points: &[Point]) -> String {
    points
        .iter()
        .map(|point| format!("{},{}", point.x(), point.y()))
        .collect::<Vec<_>>()
        .join(" ")
}
