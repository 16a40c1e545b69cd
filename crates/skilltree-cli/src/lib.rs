//! CLI logic for the skilltree session replayer.
//!
//! Reads a session script, replays it on a fresh editor and writes the final
//! tree as SVG.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::info;

use skilltree::{SessionBuilder, SkillTreeError};

/// Run the skilltree CLI application
///
/// # Errors
///
/// Returns `SkillTreeError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Script errors
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), SkillTreeError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Replaying session"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;

    let builder = SessionBuilder::new(app_config);
    let script = builder.parse(&source)?;
    let svg = builder.render_svg(&script)?;

    fs::write(&args.output, svg)?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}
