//! CLI command implementations.

pub mod config;
pub mod op;
pub mod run;

use std::path::Path;

use prism_core::Config;

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config, prism_core::ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
