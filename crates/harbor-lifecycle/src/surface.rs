//! Top-level UI surfaces as seen by the lifecycle core.
//!
//! Window mechanics belong to the host. The core only needs to show, close
//! and script surfaces, hear about closes, and ask which surfaces are visible.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use harbor_common::Result;

/// Opaque surface identifier assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// What a surface is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Transient boot UI.
    Splash,
    /// The persistent application UI.
    Main,
    /// Hidden helper surfaces (secure-fetch proxy and similar).
    Auxiliary,
}

/// Callback invoked once when a surface is closed.
pub type ClosedCallback = Box<dyn FnOnce() + Send + 'static>;

/// A top-level surface handle.
#[async_trait]
pub trait Surface: Send + Sync {
    fn id(&self) -> SurfaceId;

    fn kind(&self) -> SurfaceKind;

    fn show(&self);

    /// Destroy the surface. Safe to call on an already destroyed surface.
    fn close(&self);

    /// Register a callback fired once the surface has been closed.
    fn on_closed(&self, callback: ClosedCallback);

    /// Evaluate a script in the surface's embedded content.
    async fn run_script(&self, source: &str) -> Result<serde_json::Value>;
}

/// Visibility of one open, non-destroyed surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceState {
    pub id: SurfaceId,
    pub kind: SurfaceKind,
    pub visible: bool,
}

/// Every open, non-destroyed top-level surface at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowVisibilitySnapshot {
    pub surfaces: Vec<SurfaceState>,
}

impl WindowVisibilitySnapshot {
    pub fn any_visible(&self) -> bool {
        self.surfaces.iter().any(|s| s.visible)
    }

    pub fn visible(&self) -> impl Iterator<Item = &SurfaceState> {
        self.surfaces.iter().filter(|s| s.visible)
    }
}

/// The host's window registry.
#[async_trait]
pub trait SurfaceHost: Send + Sync {
    async fn create_splash(&self) -> Result<Arc<dyn Surface>>;

    /// Create the main surface. It starts hidden.
    async fn create_main(&self) -> Result<Arc<dyn Surface>>;

    fn snapshot(&self) -> WindowVisibilitySnapshot;

    /// Any surface that has not been destroyed, visible or not.
    fn first_live_surface(&self) -> Option<Arc<dyn Surface>>;
}
