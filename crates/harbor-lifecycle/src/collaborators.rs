//! Contracts of the external collaborators driven by the lifecycle core.
//!
//! Each trait is a call/return boundary only. Implementations live in the
//! host binary (or in test fakes); the core never looks behind them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use harbor_common::Result;

use crate::surface::SurfaceHost;

/// Startup version check.
#[async_trait]
pub trait Updater: Send + Sync {
    /// Returns `false` when boot must stop. In that case the updater has
    /// already arranged a restart or quit.
    async fn check(&self) -> bool;
}

/// Secure-fetch interception and its hidden proxy surface.
#[async_trait]
pub trait SecureFetch: Send + Sync {
    /// Install the interception. Idempotent.
    fn install(&self);

    async fn destroy_proxy_surface(&self) -> Result<()>;
}

/// Global keyboard shortcuts.
pub trait Shortcuts: Send + Sync {
    fn register(&self);

    fn unregister(&self);
}

/// Local backend services.
#[async_trait]
pub trait BackendServices: Send + Sync {
    async fn is_running(&self) -> bool;

    /// Locate the backend binary, downloading it if the implementation does.
    async fn resolve_location(&self) -> Result<PathBuf>;

    async fn start(&self, location: &Path) -> Result<()>;

    async fn stop(&self) -> Result<()>;
}

/// The frontend HTTP server.
#[async_trait]
pub trait FrontendServer: Send + Sync {
    async fn stop(&self) -> Result<()>;
}

/// Final process exit that bypasses quit-event dispatch.
pub trait ProcessExit: Send + Sync {
    fn exit(&self, code: i32);
}

/// Every collaborator the coordinator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub updater: Arc<dyn Updater>,
    pub surfaces: Arc<dyn SurfaceHost>,
    pub secure_fetch: Arc<dyn SecureFetch>,
    pub shortcuts: Arc<dyn Shortcuts>,
    pub backend: Arc<dyn BackendServices>,
    pub frontend: Arc<dyn FrontendServer>,
    pub exit: Arc<dyn ProcessExit>,
}
