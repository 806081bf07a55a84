//! TOML config file loading and creation.

use crate::schema::HarborConfig;
use crate::validation;
use harbor_common::ConfigError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load config from a specific TOML file path.
///
/// Missing fields use serde defaults. If validation fails, a warning is
/// logged and the default config is returned.
pub fn load_from_path(path: &Path) -> Result<HarborConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
    })?;

    let config: HarborConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    if let Err(e) = validation::validate(&config) {
        warn!("config validation warning: {e}");
        warn!("falling back to default config");
        return Ok(HarborConfig::default());
    }

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/harbor/config.toml`
/// On Linux: `~/.config/harbor/config.toml`
///
/// If the file does not exist, creates a default config file and returns defaults.
pub fn load_default() -> Result<HarborConfig, ConfigError> {
    let path = default_config_path()?;

    if !path.exists() {
        info!("no config found at {}, creating default", path.display());
        create_default_config(&path)?;
        return Ok(HarborConfig::default());
    }

    load_from_path(&path)
}

/// Get the platform-specific default config file path.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("harbor").join("config.toml"))
}

/// Create a default TOML config file with documentation comments.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TOML).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}

const DEFAULT_CONFIG_TOML: &str = r##"# Harbor Configuration
# Only override what you want to change -- missing fields use defaults.

[startup]
# splash = true
# post_ready_script = "Host?.checkServer?.();"

[updates]
# check_on_startup = true
# repository = "harbor-desktop/harbor"
# timeout_secs = 10          # 1-120

[backend]
# url = "http://127.0.0.1:8765/"
# binary_path = "/opt/harbor/backend/harbor-backend"
# args = []
# startup_timeout_ms = 20000 # 0 disables the wait, max 600000
# probe_timeout_ms = 800     # 50-10000

[frontend]
# url = "http://127.0.0.1:5173/"
# command = "npm run serve"
# probe_interval_ms = 250    # 50-10000

[logging]
# level = "INFO"             # DEBUG, INFO, WARNING, ERROR
"##;
