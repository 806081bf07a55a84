//! Harbor configuration system.
//!
//! TOML-based configuration with validation. All sections use defaults so
//! partial configs work out of the box.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::HarborConfig;

use std::path::Path;

use harbor_common::ConfigError;

/// Load config from `path` when given, otherwise from the platform default
/// location (creating it on first run), then validate the result.
pub fn load_config(path: Option<&Path>) -> Result<HarborConfig, ConfigError> {
    let config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };
    validation::validate(&config)?;
    Ok(config)
}
