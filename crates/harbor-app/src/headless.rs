//! Headless host: an in-process surface registry plus the small collaborators
//! that have no real window system behind them.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use harbor_common::{HostEvent, HostEventSender, Result};
use harbor_config::schema::FrontendConfig;
use harbor_lifecycle::{
    ClosedCallback, ProcessExit, SecureFetch, Shortcuts, Surface, SurfaceHost, SurfaceId,
    SurfaceKind, SurfaceState, WindowVisibilitySnapshot,
};

use crate::frontend;

pub struct HeadlessSurface {
    id: SurfaceId,
    kind: SurfaceKind,
    visible: AtomicBool,
    destroyed: AtomicBool,
    callbacks: Mutex<Vec<ClosedCallback>>,
}

impl HeadlessSurface {
    fn new(id: SurfaceId, kind: SurfaceKind) -> Self {
        Self {
            id,
            kind,
            visible: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Surface for HeadlessSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn show(&self) {
        if self.is_destroyed() {
            return;
        }
        if !self.visible.swap(true, Ordering::SeqCst) {
            tracing::info!(surface = %self.id, kind = ?self.kind, "surface shown");
        }
    }

    fn close(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.visible.store(false, Ordering::SeqCst);
        tracing::debug!(surface = %self.id, kind = ?self.kind, "surface closed");

        // Run callbacks after releasing the lock; they may query the host.
        let callbacks: Vec<ClosedCallback> = self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    fn on_closed(&self, callback: ClosedCallback) {
        if self.is_destroyed() {
            callback();
            return;
        }
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }

    async fn run_script(&self, source: &str) -> Result<serde_json::Value> {
        tracing::debug!(surface = %self.id, script = source, "no script engine, skipping");
        Ok(serde_json::Value::Null)
    }
}

/// Surface registry for running without a window system.
///
/// A new main surface announces `renderer-ready` once the frontend URL
/// answers, or right away when no URL is configured.
pub struct HeadlessSurfaceHost {
    events: HostEventSender,
    frontend_url: Option<String>,
    probe_interval: Duration,
    next_id: AtomicU32,
    surfaces: Mutex<Vec<Arc<HeadlessSurface>>>,
}

impl HeadlessSurfaceHost {
    pub fn new(events: HostEventSender, config: &FrontendConfig) -> Self {
        Self {
            events,
            frontend_url: config.url.clone(),
            probe_interval: Duration::from_millis(config.probe_interval_ms),
            next_id: AtomicU32::new(1),
            surfaces: Mutex::new(Vec::new()),
        }
    }

    fn add(&self, kind: SurfaceKind) -> Arc<HeadlessSurface> {
        let id = SurfaceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let surface = Arc::new(HeadlessSurface::new(id, kind));
        let mut surfaces = self.surfaces.lock().unwrap_or_else(PoisonError::into_inner);
        surfaces.retain(|s| !s.is_destroyed());
        surfaces.push(Arc::clone(&surface));
        tracing::debug!(surface = %id, ?kind, "surface created");
        surface
    }

    /// Create the hidden secure-fetch proxy surface.
    pub fn create_proxy(&self) -> Arc<HeadlessSurface> {
        self.add(SurfaceKind::Auxiliary)
    }

    fn announce_renderer_ready(&self) {
        let events = self.events.clone();
        let Some(url) = self.frontend_url.clone() else {
            events.send(HostEvent::RendererReady);
            return;
        };
        let interval = self.probe_interval;
        tokio::spawn(async move {
            frontend::wait_until_served(&url, interval).await;
            events.send(HostEvent::RendererReady);
        });
    }

    fn live(&self) -> Vec<Arc<HeadlessSurface>> {
        self.surfaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| !s.is_destroyed())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SurfaceHost for HeadlessSurfaceHost {
    async fn create_splash(&self) -> Result<Arc<dyn Surface>> {
        Ok(self.add(SurfaceKind::Splash))
    }

    async fn create_main(&self) -> Result<Arc<dyn Surface>> {
        let main = self.add(SurfaceKind::Main);
        self.announce_renderer_ready();
        Ok(main)
    }

    fn snapshot(&self) -> WindowVisibilitySnapshot {
        let surfaces = self
            .live()
            .iter()
            .map(|s| SurfaceState {
                id: s.id,
                kind: s.kind,
                visible: s.is_visible(),
            })
            .collect();
        WindowVisibilitySnapshot { surfaces }
    }

    fn first_live_surface(&self) -> Option<Arc<dyn Surface>> {
        let live = self.live();
        // Prefer a user-facing surface over the hidden proxy.
        live.iter()
            .find(|s| s.kind != SurfaceKind::Auxiliary)
            .or_else(|| live.first())
            .map(|s| Arc::clone(s) as Arc<dyn Surface>)
    }
}

/// Secure-fetch interception backed by a hidden proxy surface.
pub struct HeadlessSecureFetch {
    host: Arc<HeadlessSurfaceHost>,
    proxy: Mutex<Option<Arc<HeadlessSurface>>>,
}

impl HeadlessSecureFetch {
    pub fn new(host: Arc<HeadlessSurfaceHost>) -> Self {
        Self {
            host,
            proxy: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SecureFetch for HeadlessSecureFetch {
    fn install(&self) {
        let mut proxy = self.proxy.lock().unwrap_or_else(PoisonError::into_inner);
        if proxy.is_none() {
            *proxy = Some(self.host.create_proxy());
            tracing::debug!("secure fetch interception installed");
        }
    }

    async fn destroy_proxy_surface(&self) -> Result<()> {
        let proxy = self
            .proxy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(proxy) = proxy {
            proxy.close();
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HeadlessShortcuts {
    registered: AtomicBool,
}

impl HeadlessShortcuts {
    #[cfg(test)]
    fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }
}

impl Shortcuts for HeadlessShortcuts {
    fn register(&self) {
        if !self.registered.swap(true, Ordering::SeqCst) {
            tracing::debug!("global shortcuts registered");
        }
    }

    fn unregister(&self) {
        if self.registered.swap(false, Ordering::SeqCst) {
            tracing::debug!("global shortcuts unregistered");
        }
    }
}

/// Exits the process directly, skipping quit-event dispatch.
///
/// No `WillQuit` follows, so the shortcuts are released here first.
pub struct SystemExit {
    shortcuts: Arc<HeadlessShortcuts>,
}

impl SystemExit {
    pub fn new(shortcuts: Arc<HeadlessShortcuts>) -> Self {
        Self { shortcuts }
    }

    fn release(&self) {
        self.shortcuts.unregister();
    }
}

impl ProcessExit for SystemExit {
    fn exit(&self, code: i32) {
        self.release();
        tracing::info!(code, "exiting");
        std::process::exit(code);
    }
}
