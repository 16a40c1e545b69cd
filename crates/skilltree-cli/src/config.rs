//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use skilltree::{SkillTreeError, config::AppConfig};

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for SkillTreeError {
    fn from(err: ConfigError) -> Self {
        SkillTreeError::Config(err.to_string())
    }
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (skilltree/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed
/// - Config values are out of range
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, SkillTreeError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("skilltree/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "skilltree", "skilltree") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load and validate configuration from a TOML file
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, SkillTreeError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()).into());
    }

    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;

    debug!(
        min_distance = config.layout().min_distance(),
        iterations = config.layout().iterations();
        "Configuration loaded"
    );
    Ok(config)
}

/// Parse TOML configuration text and check value ranges.
fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    config.layout().validate().map_err(ConfigError::Validation)?;

    let canvas = config.canvas().size();
    if !(canvas.width() > 0.0 && canvas.height() > 0.0)
        || !canvas.width().is_finite()
        || !canvas.height().is_finite()
    {
        return Err(ConfigError::Validation(format!(
            "canvas size must be positive, got {}x{}",
            canvas.width(),
            canvas.height()
        )));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use skilltree::config::RelaxationMode;

    use super::*;

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config(
            r##"
            [layout]
            min_distance = 200.0
            relaxation = "batched"

            [style]
            highlight_color = "#dc2626"

            [canvas]
            width = 1024
            "##,
        )
        .unwrap();

        assert_eq!(config.layout().min_distance(), 200.0);
        assert_eq!(config.layout().iterations(), 50);
        assert_eq!(config.layout().relaxation(), RelaxationMode::Batched);
        assert!(config.style().highlight_color().is_ok());
        assert_eq!(config.canvas().size().width(), 1024.0);
        assert_eq!(config.canvas().size().height(), 600.0);
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[layout\nmin_distance = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_relaxation_mode() {
        let err = parse_config("[layout]\nrelaxation = \"sideways\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error() {
        let err = parse_config("[layout]\nmin_distance = 0.0").unwrap_err();
        match err {
            ConfigError::Validation(message) => assert!(message.contains("min_distance")),
            other => panic!("expected validation error, got {other:?}"),
        }

        let err = parse_config("[canvas]\nwidth = -5.0").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[layout]\niterations = 7").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.layout().iterations(), 7);
    }

    #[test]
    fn test_missing_explicit_path() {
        let err = load_config(Some("/definitely/not/here/config.toml")).unwrap_err();
        match err {
            SkillTreeError::Config(message) => assert!(message.contains("Missing configuration")),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
