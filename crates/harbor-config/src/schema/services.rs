//! Backend and frontend service configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Local backend services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL the backend listens on.
    pub url: String,
    /// Explicit backend binary. When unset the binary is looked up in the
    /// data directory.
    pub binary_path: Option<PathBuf>,
    pub args: Vec<String>,
    /// How long to wait for the backend port after spawning (0 = don't wait).
    pub startup_timeout_ms: u64,
    /// Connect timeout for a single reachability probe.
    pub probe_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8765/".into(),
            binary_path: None,
            args: Vec::new(),
            startup_timeout_ms: 20_000,
            probe_timeout_ms: 800,
        }
    }
}

/// Frontend server and readiness probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    /// URL the main surface loads. `renderer-ready` is announced once it
    /// answers; without it the announcement is immediate.
    pub url: Option<String>,
    /// Command line of a frontend server to run alongside the main surface.
    pub command: Option<String>,
    pub probe_interval_ms: u64,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            url: None,
            command: None,
            probe_interval_ms: 250,
        }
    }
}
