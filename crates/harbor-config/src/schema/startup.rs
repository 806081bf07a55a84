//! Boot sequence configuration types.

use serde::{Deserialize, Serialize};

/// Startup sequence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Show the splash surface while the backend and frontend come up.
    pub splash: bool,
    /// Script evaluated in the main surface once both readiness signals
    /// have settled. Failures are logged and ignored.
    pub post_ready_script: String,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            splash: true,
            post_ready_script: "Host?.checkServer?.();".into(),
        }
    }
}
