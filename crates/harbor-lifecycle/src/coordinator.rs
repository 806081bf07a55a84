//! Routes host events to the boot and shutdown sequencers.

use std::sync::{Arc, Mutex, PoisonError};

use harbor_common::{HostEvent, HostEventReceiver, HostEventSender};
use tokio_util::sync::CancellationToken;

use crate::boot::{BootOptions, BootSequencer};
use crate::collaborators::{Collaborators, Shortcuts};
use crate::events::LifecycleBus;
use crate::shutdown::ShutdownSequencer;
use crate::signal::{once_signal, SignalTrigger, SignalWait};

/// Owns both sequencers and the process-lifetime event wiring.
pub struct LifecycleCoordinator {
    boot: Arc<BootSequencer>,
    shutdown: Arc<ShutdownSequencer>,
    shortcuts: Arc<dyn Shortcuts>,
    events: HostEventSender,
    bus: LifecycleBus,
    renderer_trigger: Mutex<Option<SignalTrigger>>,
    renderer_wait: Mutex<Option<SignalWait>>,
}

impl LifecycleCoordinator {
    pub fn new(
        collaborators: Collaborators,
        events: HostEventSender,
        options: BootOptions,
    ) -> Arc<Self> {
        let bus = LifecycleBus::default();
        let quitting = CancellationToken::new();
        let (trigger, wait) = once_signal();
        let shortcuts = Arc::clone(&collaborators.shortcuts);

        let boot = BootSequencer::new(
            collaborators.clone(),
            events.clone(),
            bus.clone(),
            quitting.clone(),
            options,
        );
        let shutdown = ShutdownSequencer::new(collaborators, events.clone(), bus.clone(), quitting);

        Arc::new(Self {
            boot: Arc::new(boot),
            shutdown: Arc::new(shutdown),
            shortcuts,
            events,
            bus,
            renderer_trigger: Mutex::new(Some(trigger)),
            renderer_wait: Mutex::new(Some(wait)),
        })
    }

    pub fn bus(&self) -> &LifecycleBus {
        &self.bus
    }

    pub fn boot(&self) -> &BootSequencer {
        &self.boot
    }

    pub fn shutdown(&self) -> &ShutdownSequencer {
        &self.shutdown
    }

    /// Drain host events until every sender is gone.
    pub async fn run(self: Arc<Self>, mut events: HostEventReceiver) {
        while let Some(event) = events.recv().await {
            self.dispatch(event);
        }
        tracing::debug!("host event channel closed");
    }

    /// Handle one host event. Long-running work is spawned so the event loop
    /// keeps draining while boot or teardown is suspended.
    pub fn dispatch(self: &Arc<Self>, event: HostEvent) {
        tracing::debug!(event = event.name(), "host event");
        match event {
            HostEvent::Ready => self.start_boot(),
            HostEvent::RendererReady => self.renderer_ready(),
            HostEvent::Activate => self.activate(),
            HostEvent::MainSurfaceClosed => {
                tracing::info!("main surface closed, quitting");
                self.events.request_quit();
            }
            HostEvent::QuitRequested(request) => {
                request.prevent_default();
                if self.shutdown.spawn_trigger().is_none() {
                    tracing::debug!("quit requested while already shutting down");
                }
            }
            HostEvent::WillQuit => self.shortcuts.unregister(),
        }
    }

    fn start_boot(&self) {
        let wait = self
            .renderer_wait
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(wait) = wait else {
            tracing::warn!("host ready delivered twice, ignoring");
            return;
        };

        let boot = Arc::clone(&self.boot);
        tokio::spawn(async move {
            let outcome = boot.run(wait).await;
            tracing::info!(?outcome, "boot sequence finished");
        });
    }

    fn renderer_ready(&self) {
        let trigger = self
            .renderer_trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match trigger {
            Some(trigger) => {
                if !trigger.fire() {
                    tracing::debug!("renderer-ready arrived after boot stopped waiting");
                }
            }
            None => tracing::debug!("ignoring repeated renderer-ready"),
        }
    }

    fn activate(&self) {
        if !self.boot.is_revealed() {
            tracing::debug!("activate before reveal, ignoring");
            return;
        }
        let shutdown = Arc::clone(&self.shutdown);
        tokio::spawn(async move {
            if let Err(e) = shutdown.activate().await {
                tracing::error!(error = %e, "failed to bring a surface forward on activate");
            }
        });
    }
}
