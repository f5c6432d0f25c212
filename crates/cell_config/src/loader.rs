//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::CellConfig;
use std::path::Path;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE: &str = "cell.toml";

/// Loads and validates `cell.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<CellConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE))?;
    load_config_from_str(&content)
}

/// Parses and validates a `cell.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<CellConfig, ConfigError> {
    let config: CellConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &CellConfig) -> Result<(), ConfigError> {
    let sim = &config.simulation;
    if sim.top.trim().is_empty() {
        return Err(ConfigError::MissingField("simulation.top".to_string()));
    }
    if sim.max_cycles == 0 {
        return Err(ConfigError::ValidationError(
            "simulation.max_cycles must be positive".to_string(),
        ));
    }
    if sim.duration.value < 0 {
        return Err(ConfigError::ValidationError(format!(
            "simulation.duration must not be negative, got {}",
            sim.duration
        )));
    }
    Ok(())
}
