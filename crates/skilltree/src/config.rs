//! Configuration types for skill tree layout and rendering.
//!
//! This module provides configuration structures that control how trees are
//! laid out and styled. All types implement [`serde::Deserialize`] for
//! flexible loading from external sources.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout, style and canvas settings.
//! - [`LayoutConfig`] - Force simulation tuning ([`RelaxationMode`], distances, strengths).
//! - [`StyleConfig`] - Colors and stroke widths used by the SVG renderer.
//! - [`CanvasConfig`] - Initial canvas dimensions.
//!
//! # Example
//!
//! ```
//! # use skilltree::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().min_distance(), 150.0);
//! assert!(config.layout().validate().is_ok());
//! ```

use serde::Deserialize;

use skilltree_core::{color::Color, geometry::Size, stroke::StrokeCap};

/// Top-level configuration combining layout, style and canvas settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,

    /// Canvas configuration section.
    #[serde(default)]
    canvas: CanvasConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(layout: LayoutConfig, style: StyleConfig, canvas: CanvasConfig) -> Self {
        Self {
            layout,
            style,
            canvas,
        }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the canvas configuration.
    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }
}

/// How force deltas are applied within one relaxation pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelaxationMode {
    /// Gauss-Seidel style: every pair moves its nodes immediately, so later
    /// pairs in the same pass see the updated positions.
    #[default]
    InPlace,
    /// Jacobi style: deltas of a phase are accumulated from a snapshot and
    /// applied together at the end of the phase.
    Batched,
}

/// Force simulation tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    min_distance: f32,
    repulsion_strength: f32,
    attraction_strength: f32,
    iterations: usize,
    relaxation: RelaxationMode,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_distance: 150.0,
            repulsion_strength: 0.5,
            attraction_strength: 0.1,
            iterations: 50,
            relaxation: RelaxationMode::InPlace,
        }
    }
}

impl LayoutConfig {
    /// Sets the target spacing between nodes (builder style).
    pub fn with_min_distance(mut self, min_distance: f32) -> Self {
        self.min_distance = min_distance;
        self
    }

    /// Sets the repulsion strength (builder style).
    pub fn with_repulsion_strength(mut self, strength: f32) -> Self {
        self.repulsion_strength = strength;
        self
    }

    /// Sets the attraction strength (builder style).
    pub fn with_attraction_strength(mut self, strength: f32) -> Self {
        self.attraction_strength = strength;
        self
    }

    /// Sets the number of relaxation passes (builder style).
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the relaxation mode (builder style).
    pub fn with_relaxation(mut self, relaxation: RelaxationMode) -> Self {
        self.relaxation = relaxation;
        self
    }

    /// Distance below which nodes repel and above which linked nodes attract.
    pub fn min_distance(&self) -> f32 {
        self.min_distance
    }

    pub fn repulsion_strength(&self) -> f32 {
        self.repulsion_strength
    }

    pub fn attraction_strength(&self) -> f32 {
        self.attraction_strength
    }

    /// Number of relaxation passes per layout run.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn relaxation(&self) -> RelaxationMode {
        self.relaxation
    }

    /// Checks that all values describe a usable simulation.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending field when a value is
    /// not finite, `min_distance` is not positive, or a strength is negative.
    pub fn validate(&self) -> Result<(), String> {
        if !self.min_distance.is_finite() || self.min_distance <= 0.0 {
            return Err(format!(
                "layout.min_distance must be a positive number, got {}",
                self.min_distance
            ));
        }
        for (name, value) in [
            ("repulsion_strength", self.repulsion_strength),
            ("attraction_strength", self.attraction_strength),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "layout.{name} must be a non-negative number, got {value}"
                ));
            }
        }
        Ok(())
    }
}

/// Visual styling configuration for rendered trees.
///
/// All colors are CSS color strings. Unset fields fall back to the built-in
/// palette.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    background_color: Option<String>,
    node_fill_color: String,
    node_border_color: String,
    text_color: String,
    edge_color: String,
    edge_width: f32,
    highlight_color: String,
    highlight_width: f32,
    edge_cap: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: None,
            node_fill_color: "#ffffff".to_string(),
            node_border_color: "#cbd5e1".to_string(),
            text_color: "#0f172a".to_string(),
            edge_color: "#94a3b8".to_string(),
            edge_width: 2.0,
            highlight_color: "#2563eb".to_string(),
            highlight_width: 3.0,
            edge_cap: "butt".to_string(),
        }
    }
}

fn parse_color(field: &str, value: &str) -> Result<Color, String> {
    Color::new(value).map_err(|err| format!("Invalid {field} in config: {err}"))
}

impl StyleConfig {
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn with_edge_color(mut self, color: impl Into<String>) -> Self {
        self.edge_color = color.into();
        self
    }

    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_deref()
            .map(|color| parse_color("background_color", color))
            .transpose()
    }

    pub fn node_fill_color(&self) -> Result<Color, String> {
        parse_color("node_fill_color", &self.node_fill_color)
    }

    pub fn node_border_color(&self) -> Result<Color, String> {
        parse_color("node_border_color", &self.node_border_color)
    }

    pub fn text_color(&self) -> Result<Color, String> {
        parse_color("text_color", &self.text_color)
    }

    /// Color of edges that do not touch the selected node.
    pub fn edge_color(&self) -> Result<Color, String> {
        parse_color("edge_color", &self.edge_color)
    }

    pub fn edge_width(&self) -> f32 {
        self.edge_width
    }

    /// Color of edges touching the selected node, and of the selected node's border.
    pub fn highlight_color(&self) -> Result<Color, String> {
        parse_color("highlight_color", &self.highlight_color)
    }

    pub fn highlight_width(&self) -> f32 {
        self.highlight_width
    }

    pub fn edge_cap(&self) -> Result<StrokeCap, String> {
        self.edge_cap.parse()
    }
}

/// Initial canvas dimensions, in pixels.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    width: f32,
    height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl CanvasConfig {
    /// Returns the canvas dimensions as a [`Size`].
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
