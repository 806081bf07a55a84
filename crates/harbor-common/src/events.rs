//! Process-level host events delivered to the lifecycle coordinator.
//!
//! Events flow from the host (window system, OS signals, embedded UI) into a
//! single unbounded channel that the coordinator drains in order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

/// An event raised by the host process.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// The host finished initializing and can create surfaces.
    Ready,
    /// The application was activated (dock click, relaunch).
    Activate,
    /// The main UI surface was closed by the user.
    MainSurfaceClosed,
    /// Something asked the process to quit.
    QuitRequested(QuitRequest),
    /// The process is about to quit; global shortcuts must be released.
    WillQuit,
    /// The main surface's embedded content announced `renderer-ready`.
    RendererReady,
}

impl HostEvent {
    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::Ready => "ready",
            HostEvent::Activate => "activate",
            HostEvent::MainSurfaceClosed => "main-surface-closed",
            HostEvent::QuitRequested(_) => "quit-requested",
            HostEvent::WillQuit => "will-quit",
            HostEvent::RendererReady => "renderer-ready",
        }
    }
}

/// A quit request whose default action (immediate exit) can be suppressed.
///
/// Clones share the same flag, so the host keeps one copy and checks it after
/// the coordinator has seen the event.
#[derive(Debug, Clone, Default)]
pub struct QuitRequest {
    default_prevented: Arc<AtomicBool>,
}

impl QuitRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress the host's immediate exit for this request.
    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }
}

/// Sending half of the host event channel.
#[derive(Debug, Clone)]
pub struct HostEventSender {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl HostEventSender {
    /// Deliver an event. Returns `false` once the coordinator has gone away.
    pub fn send(&self, event: HostEvent) -> bool {
        let name = event.name();
        match self.tx.send(event) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(event = name, "host event dropped: coordinator stopped");
                false
            }
        }
    }

    /// Ask the process to quit through the regular quit path.
    pub fn request_quit(&self) -> QuitRequest {
        let request = QuitRequest::new();
        self.send(HostEvent::QuitRequested(request.clone()));
        request
    }
}

/// Receiving half of the host event channel, owned by the coordinator.
pub type HostEventReceiver = mpsc::UnboundedReceiver<HostEvent>;

/// Create a connected sender/receiver pair.
pub fn host_channel() -> (HostEventSender, HostEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (HostEventSender { tx }, rx)
}
