//! Parsing and validation of `cell.toml` simulation configuration files.
//!
//! The file selects the top module, the default run length and the
//! delta-cycle cap, plus the log filter used when no `RUST_LOG` is set.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
