//! Recording fakes for every collaborator.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use harbor_common::{HarborError, Result};
use tokio::sync::{broadcast, Notify};

use crate::collaborators::{
    BackendServices, Collaborators, FrontendServer, ProcessExit, SecureFetch, Shortcuts, Updater,
};
use crate::events::LifecycleEvent;
use crate::surface::{
    ClosedCallback, Surface, SurfaceHost, SurfaceId, SurfaceKind, SurfaceState,
    WindowVisibilitySnapshot,
};

pub(crate) const BACKEND_LOCATION: &str = "/srv/backend";

/// Ordered record of collaborator calls.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub(crate) fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.entries().iter().filter(|c| *c == call).count()
    }

    pub(crate) fn contains(&self, call: &str) -> bool {
        self.count(call) > 0
    }

    pub(crate) fn position(&self, call: &str) -> Option<usize> {
        self.entries().iter().position(|c| c == call)
    }
}

/// Knobs for the fakes, all defaulting to the happy path.
#[derive(Debug, Default)]
pub(crate) struct FakeSettings {
    pub(crate) update_declines: bool,
    /// Hold `Updater::check` until `Harness::release_update_check`.
    pub(crate) gate_update_check: bool,
    pub(crate) splash_fails: bool,
    pub(crate) main_fails: bool,
    pub(crate) script_fails: bool,
    /// Hold `Surface::run_script` until `Harness::release_script`.
    pub(crate) gate_script: bool,
    pub(crate) backend_running: bool,
    pub(crate) resolve_error: Option<String>,
    pub(crate) start_error: Option<String>,
    /// Hold `BackendServices::start` until `Harness::release_backend`.
    pub(crate) gate_backend_start: bool,
    pub(crate) stop_frontend_error: Option<String>,
    pub(crate) stop_backend_error: Option<String>,
    pub(crate) destroy_proxy_error: Option<String>,
}

pub(crate) struct FakeUpdater {
    log: CallLog,
    declines: bool,
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl Updater for FakeUpdater {
    async fn check(&self) -> bool {
        self.log.push("updater.check");
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        !self.declines
    }
}

pub(crate) struct FakeSurface {
    id: SurfaceId,
    kind: SurfaceKind,
    label: &'static str,
    log: CallLog,
    script_fails: bool,
    script_gate: Option<Arc<Notify>>,
    visible: AtomicBool,
    destroyed: AtomicBool,
    callbacks: Mutex<Vec<ClosedCallback>>,
}

impl FakeSurface {
    pub(crate) fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// Close the surface the way a user would.
    pub(crate) fn user_close(&self) {
        self.destroy();
    }

    fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.visible.store(false, Ordering::SeqCst);
        let callbacks: Vec<ClosedCallback> = self.callbacks.lock().unwrap().drain(..).collect();
        for callback in callbacks {
            callback();
        }
    }
}

#[async_trait]
impl Surface for FakeSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn show(&self) {
        self.log.push(format!("{}.show", self.label));
        self.visible.store(true, Ordering::SeqCst);
    }

    fn close(&self) {
        self.log.push(format!("{}.close", self.label));
        self.destroy();
    }

    fn on_closed(&self, callback: ClosedCallback) {
        self.callbacks.lock().unwrap().push(callback);
    }

    async fn run_script(&self, _source: &str) -> Result<serde_json::Value> {
        self.log.push(format!("{}.run_script", self.label));
        if let Some(gate) = &self.script_gate {
            gate.notified().await;
        }
        if self.script_fails {
            return Err(HarborError::Script("Host is not defined".into()));
        }
        Ok(serde_json::Value::Null)
    }
}

pub(crate) struct FakeHost {
    log: CallLog,
    splash_fails: bool,
    main_fails: bool,
    script_fails: bool,
    script_gate: Option<Arc<Notify>>,
    next_id: AtomicU32,
    surfaces: Mutex<Vec<Arc<FakeSurface>>>,
}

impl FakeHost {
    fn add(&self, kind: SurfaceKind, label: &'static str) -> Arc<FakeSurface> {
        let surface = Arc::new(FakeSurface {
            id: SurfaceId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            kind,
            label,
            log: self.log.clone(),
            script_fails: self.script_fails,
            script_gate: self.script_gate.clone(),
            visible: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
            callbacks: Mutex::new(Vec::new()),
        });
        self.surfaces.lock().unwrap().push(Arc::clone(&surface));
        surface
    }

    fn latest(&self, kind: SurfaceKind) -> Option<Arc<FakeSurface>> {
        self.surfaces
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|s| s.kind == kind)
            .cloned()
    }

    pub(crate) fn splash(&self) -> Option<Arc<FakeSurface>> {
        self.latest(SurfaceKind::Splash)
    }

    pub(crate) fn main(&self) -> Option<Arc<FakeSurface>> {
        self.latest(SurfaceKind::Main)
    }

    pub(crate) fn main_count(&self) -> usize {
        self.surfaces
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.kind == SurfaceKind::Main)
            .count()
    }

    pub(crate) fn surface_count(&self) -> usize {
        self.surfaces.lock().unwrap().len()
    }
}

#[async_trait]
impl SurfaceHost for FakeHost {
    async fn create_splash(&self) -> Result<Arc<dyn Surface>> {
        self.log.push("host.create_splash");
        if self.splash_fails {
            return Err(HarborError::Surface("no display".into()));
        }
        Ok(self.add(SurfaceKind::Splash, "splash"))
    }

    async fn create_main(&self) -> Result<Arc<dyn Surface>> {
        self.log.push("host.create_main");
        if self.main_fails {
            return Err(HarborError::Surface("no display".into()));
        }
        Ok(self.add(SurfaceKind::Main, "main"))
    }

    fn snapshot(&self) -> WindowVisibilitySnapshot {
        let surfaces = self
            .surfaces
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.is_destroyed())
            .map(|s| SurfaceState {
                id: s.id,
                kind: s.kind,
                visible: s.is_visible(),
            })
            .collect();
        WindowVisibilitySnapshot { surfaces }
    }

    fn first_live_surface(&self) -> Option<Arc<dyn Surface>> {
        self.surfaces
            .lock()
            .unwrap()
            .iter()
            .find(|s| !s.is_destroyed())
            .map(|s| Arc::clone(s) as Arc<dyn Surface>)
    }
}

pub(crate) struct FakeSecureFetch {
    log: CallLog,
    destroy_error: Option<String>,
}

#[async_trait]
impl SecureFetch for FakeSecureFetch {
    fn install(&self) {
        self.log.push("secure_fetch.install");
    }

    async fn destroy_proxy_surface(&self) -> Result<()> {
        self.log.push("secure_fetch.destroy_proxy_surface");
        match &self.destroy_error {
            Some(reason) => Err(HarborError::Surface(reason.clone())),
            None => Ok(()),
        }
    }
}

pub(crate) struct FakeShortcuts {
    log: CallLog,
}

impl Shortcuts for FakeShortcuts {
    fn register(&self) {
        self.log.push("shortcuts.register");
    }

    fn unregister(&self) {
        self.log.push("shortcuts.unregister");
    }
}

pub(crate) struct FakeBackend {
    log: CallLog,
    running: bool,
    resolve_error: Option<String>,
    start_error: Option<String>,
    stop_error: Option<String>,
    start_gate: Option<Arc<Notify>>,
}

#[async_trait]
impl BackendServices for FakeBackend {
    async fn is_running(&self) -> bool {
        self.log.push("backend.is_running");
        self.running
    }

    async fn resolve_location(&self) -> Result<PathBuf> {
        self.log.push("backend.resolve_location");
        match &self.resolve_error {
            Some(reason) => Err(HarborError::Backend(reason.clone())),
            None => Ok(PathBuf::from(BACKEND_LOCATION)),
        }
    }

    async fn start(&self, location: &Path) -> Result<()> {
        self.log.push(format!("backend.start {}", location.display()));
        if let Some(gate) = &self.start_gate {
            gate.notified().await;
        }
        match &self.start_error {
            Some(reason) => Err(HarborError::Backend(reason.clone())),
            None => Ok(()),
        }
    }

    async fn stop(&self) -> Result<()> {
        self.log.push("backend.stop");
        match &self.stop_error {
            Some(reason) => Err(HarborError::Backend(reason.clone())),
            None => Ok(()),
        }
    }
}

pub(crate) struct FakeFrontend {
    log: CallLog,
    stop_error: Option<String>,
}

#[async_trait]
impl FrontendServer for FakeFrontend {
    async fn stop(&self) -> Result<()> {
        self.log.push("frontend.stop");
        match &self.stop_error {
            Some(reason) => Err(HarborError::Frontend(reason.clone())),
            None => Ok(()),
        }
    }
}

pub(crate) struct FakeExit {
    log: CallLog,
    codes: Mutex<Vec<i32>>,
    notify: Notify,
}

impl FakeExit {
    pub(crate) fn codes(&self) -> Vec<i32> {
        self.codes.lock().unwrap().clone()
    }

    /// Wait for the first exit call and return its code.
    pub(crate) async fn wait(&self) -> i32 {
        let wait = async {
            loop {
                if let Some(code) = self.codes().first().copied() {
                    return code;
                }
                self.notify.notified().await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("process exit was never called")
    }
}

impl ProcessExit for FakeExit {
    fn exit(&self, code: i32) {
        self.log.push(format!("exit {code}"));
        self.codes.lock().unwrap().push(code);
        self.notify.notify_one();
    }
}

/// All fakes wired together, sharing one call log.
pub(crate) struct Harness {
    pub(crate) log: CallLog,
    pub(crate) host: Arc<FakeHost>,
    pub(crate) exit: Arc<FakeExit>,
    updater: Arc<FakeUpdater>,
    secure_fetch: Arc<FakeSecureFetch>,
    shortcuts: Arc<FakeShortcuts>,
    backend: Arc<FakeBackend>,
    frontend: Arc<FakeFrontend>,
    backend_gate: Arc<Notify>,
    update_gate: Arc<Notify>,
    script_gate: Arc<Notify>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with(|_| {})
    }

    pub(crate) fn with(configure: impl FnOnce(&mut FakeSettings)) -> Self {
        let mut settings = FakeSettings::default();
        configure(&mut settings);

        let log = CallLog::default();
        let backend_gate = Arc::new(Notify::new());
        let update_gate = Arc::new(Notify::new());
        let script_gate = Arc::new(Notify::new());
        Self {
            updater: Arc::new(FakeUpdater {
                log: log.clone(),
                declines: settings.update_declines,
                gate: settings
                    .gate_update_check
                    .then(|| Arc::clone(&update_gate)),
            }),
            host: Arc::new(FakeHost {
                log: log.clone(),
                splash_fails: settings.splash_fails,
                main_fails: settings.main_fails,
                script_fails: settings.script_fails,
                script_gate: settings.gate_script.then(|| Arc::clone(&script_gate)),
                next_id: AtomicU32::new(1),
                surfaces: Mutex::new(Vec::new()),
            }),
            secure_fetch: Arc::new(FakeSecureFetch {
                log: log.clone(),
                destroy_error: settings.destroy_proxy_error,
            }),
            shortcuts: Arc::new(FakeShortcuts { log: log.clone() }),
            backend: Arc::new(FakeBackend {
                log: log.clone(),
                running: settings.backend_running,
                resolve_error: settings.resolve_error,
                start_error: settings.start_error,
                stop_error: settings.stop_backend_error,
                start_gate: settings
                    .gate_backend_start
                    .then(|| Arc::clone(&backend_gate)),
            }),
            frontend: Arc::new(FakeFrontend {
                log: log.clone(),
                stop_error: settings.stop_frontend_error,
            }),
            exit: Arc::new(FakeExit {
                log: log.clone(),
                codes: Mutex::new(Vec::new()),
                notify: Notify::new(),
            }),
            backend_gate,
            update_gate,
            script_gate,
            log,
        }
    }

    pub(crate) fn collaborators(&self) -> Collaborators {
        Collaborators {
            updater: self.updater.clone(),
            surfaces: self.host.clone(),
            secure_fetch: self.secure_fetch.clone(),
            shortcuts: self.shortcuts.clone(),
            backend: self.backend.clone(),
            frontend: self.frontend.clone(),
            exit: self.exit.clone(),
        }
    }

    /// Let a gated `BackendServices::start` finish.
    pub(crate) fn release_backend(&self) {
        self.backend_gate.notify_one();
    }

    /// Let a gated `Updater::check` finish.
    pub(crate) fn release_update_check(&self) {
        self.update_gate.notify_one();
    }

    /// Let a gated `Surface::run_script` finish.
    pub(crate) fn release_script(&self) {
        self.script_gate.notify_one();
    }
}

/// Let spawned tasks run until they block.
pub(crate) async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Wait for the first bus event matching `predicate`.
pub(crate) async fn wait_for_event(
    rx: &mut broadcast::Receiver<LifecycleEvent>,
    predicate: impl Fn(&LifecycleEvent) -> bool,
) -> LifecycleEvent {
    let wait = async {
        loop {
            match rx.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) => continue,
                Err(e) => panic!("lifecycle bus closed: {e}"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .expect("lifecycle event never arrived")
}
