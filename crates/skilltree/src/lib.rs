//! Skilltree - an interactive skill tree editor with a force-directed layout.
//!
//! A [`tree::TreeStore`] owns the nodes and their parent/child links, the
//! [`layout::Engine`] relaxes node positions after every structural change,
//! and a [`controller::Controller`] turns pointer and editing events into
//! store operations and re-renders through a [`scene::Renderer`].
//!
//! Sessions can be replayed from a text [`script::Script`] and rendered to
//! SVG with [`SessionBuilder`].

pub mod config;
pub mod controller;
pub mod layout;
pub mod scene;
pub mod script;
pub mod tree;

mod error;
mod export;

pub use skilltree_core::{color, geometry, identifier, stroke};

pub use error::SkillTreeError;
pub use export::SvgRenderer;

use log::{debug, info};

use config::AppConfig;
use controller::Controller;
use script::Script;
use tree::TreeStore;

/// Builder for replaying session scripts and rendering the resulting tree.
///
/// # Examples
///
/// ```rust,no_run
/// use skilltree::{SessionBuilder, config::AppConfig};
///
/// let source = "node root \"Root Skill\"\nnode bow \"Archery\" under root\n";
///
/// let builder = SessionBuilder::new(AppConfig::default());
/// let script = builder.parse(source).expect("Failed to parse");
/// let svg = builder.render_svg(&script).expect("Failed to render");
/// ```
#[derive(Debug, Default)]
pub struct SessionBuilder {
    config: AppConfig,
}

impl SessionBuilder {
    /// Create a new session builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse and check a session script.
    ///
    /// # Errors
    ///
    /// Returns [`SkillTreeError::Script`] carrying the source for syntax
    /// errors and alias misuse.
    pub fn parse(&self, source: &str) -> Result<Script, SkillTreeError> {
        info!("Parsing session script");

        let script =
            Script::parse(source).map_err(|err| SkillTreeError::new_script_error(err, source))?;

        debug!(statements = script.len(); "Session script parsed successfully");
        Ok(script)
    }

    /// Create an empty editor that renders to SVG with the configured style.
    ///
    /// # Errors
    ///
    /// Returns [`SkillTreeError::Config`] when the style configuration holds
    /// an invalid color or cap.
    pub fn controller(&self) -> Result<Controller<SvgRenderer>, SkillTreeError> {
        let renderer = SvgRenderer::new(self.config.style()).map_err(SkillTreeError::Config)?;
        Ok(Controller::new(TreeStore::from_config(&self.config), renderer))
    }

    /// Replay `script` on a fresh editor and return the final scene as SVG.
    ///
    /// # Errors
    ///
    /// Returns [`SkillTreeError::Config`] for an invalid style and
    /// [`SkillTreeError::Export`] if no scene was rendered.
    pub fn render_svg(&self, script: &Script) -> Result<String, SkillTreeError> {
        let mut controller = self.controller()?;

        info!(statements = script.len(); "Replaying session script");
        let bindings = script.run(&mut controller);
        debug!(aliases = bindings.len(); "Session replayed");

        let svg = controller
            .renderer()
            .svg_string()
            .ok_or_else(|| SkillTreeError::Export("no scene was rendered".to_string()))?;

        info!(nodes = controller.store().len(); "SVG rendered successfully");
        Ok(svg)
    }
}
