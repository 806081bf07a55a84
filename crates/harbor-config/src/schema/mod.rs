//! Configuration schema types for Harbor.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod services;
mod startup;
mod system;

pub use services::*;
pub use startup::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Root configuration for Harbor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct HarborConfig {
    pub startup: StartupConfig,
    pub updates: UpdatesConfig,
    pub backend: BackendConfig,
    pub frontend: FrontendConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================
