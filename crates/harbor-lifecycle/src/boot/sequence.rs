//! Ordered boot stages and the splash-to-main transition.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use harbor_common::{HostEvent, HostEventSender};
use tokio_util::sync::CancellationToken;

use super::types::{BootOptions, BootState, RevealOutcome};
use crate::collaborators::Collaborators;
use crate::events::{LifecycleBus, LifecycleEvent};
use crate::readiness::{Branch, BranchOutcome, ReadinessGate};
use crate::signal::SignalWait;
use crate::surface::Surface;

/// Drives the boot stages once per process.
pub struct BootSequencer {
    collaborators: Collaborators,
    events: HostEventSender,
    bus: LifecycleBus,
    options: BootOptions,
    /// Cancelled once the process is on its way out.
    quitting: CancellationToken,
    state: Mutex<BootState>,
    started: AtomicBool,
    gate: ReadinessGate,
}

impl BootSequencer {
    pub fn new(
        collaborators: Collaborators,
        events: HostEventSender,
        bus: LifecycleBus,
        quitting: CancellationToken,
        options: BootOptions,
    ) -> Self {
        Self {
            collaborators,
            events,
            bus,
            options,
            quitting,
            state: Mutex::new(BootState::UpdateChecking),
            started: AtomicBool::new(false),
            gate: ReadinessGate::new(),
        }
    }

    pub fn state(&self) -> BootState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_revealed(&self) -> bool {
        self.state() == BootState::Revealed
    }

    /// Run the boot sequence. `renderer_ready` fires when the main surface's
    /// content announces `renderer-ready`.
    pub async fn run(&self, renderer_ready: SignalWait) -> RevealOutcome {
        if self.started.swap(true, Ordering::AcqRel) {
            tracing::warn!("boot sequence already ran, ignoring");
            return RevealOutcome::AlreadyRan;
        }

        tracing::info!("checking for updates");
        if !self.collaborators.updater.check().await {
            tracing::info!("update check stopped the boot sequence");
            return RevealOutcome::UpdateDeclined;
        }
        if self.quitting.is_cancelled() {
            tracing::info!("quit requested during the update check");
            return RevealOutcome::QuitDuringBoot;
        }

        let splash = if self.options.show_splash {
            self.open_splash().await
        } else {
            None
        };
        self.advance(BootState::SplashShown);
        if self.quitting.is_cancelled() {
            return RevealOutcome::QuitDuringBoot;
        }

        self.collaborators.secure_fetch.install();

        let main = match self.collaborators.surfaces.create_main().await {
            Ok(main) => main,
            Err(e) => {
                tracing::error!(error = %e, "failed to create main surface, quitting");
                self.quitting.cancel();
                self.events.request_quit();
                return RevealOutcome::MainSurfaceFailed(e.to_string());
            }
        };
        self.advance(BootState::MainCreated);
        self.collaborators.shortcuts.register();
        if self.quitting.is_cancelled() {
            return RevealOutcome::QuitDuringBoot;
        }

        self.advance(BootState::AwaitingReadiness);
        let Some(join) = self
            .gate
            .join(self.backend_branch(), self.frontend_branch(renderer_ready))
            .await
        else {
            return RevealOutcome::AlreadyRan;
        };
        self.advance(BootState::Ready);
        self.bus.publish(LifecycleEvent::SystemReady);
        if self.quitting.is_cancelled() {
            tracing::info!("quit requested while waiting for readiness, not revealing");
            return RevealOutcome::QuitDuringBoot;
        }

        self.post_ready_hook(main.as_ref()).await;
        if self.quitting.is_cancelled() {
            tracing::info!("quit requested during the post-ready hook, not revealing");
            return RevealOutcome::QuitDuringBoot;
        }

        if let Some((splash, armed)) = splash {
            armed.store(false, Ordering::SeqCst);
            splash.close();
        }
        main.show();
        self.watch_main(main.as_ref());
        self.advance(BootState::Revealed);
        self.bus.publish(LifecycleEvent::Revealed);
        tracing::info!(
            backend_ready = join.backend.is_ready(),
            "main surface revealed"
        );

        RevealOutcome::Revealed(join)
    }

    fn advance(&self, next: BootState) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if next <= *state {
                tracing::warn!(from = ?*state, to = ?next, "ignoring backwards boot transition");
                return;
            }
            *state = next;
        }
        tracing::debug!(state = ?next, "boot state changed");
        self.bus.publish(LifecycleEvent::BootStateChanged(next));
    }

    /// Show the splash and arm the "closed before reveal" listener.
    ///
    /// The returned flag disarms the listener before boot closes the splash
    /// itself.
    async fn open_splash(&self) -> Option<(Arc<dyn Surface>, Arc<AtomicBool>)> {
        let splash = match self.collaborators.surfaces.create_splash().await {
            Ok(splash) => splash,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "failed to create splash surface, continuing without it"
                );
                return None;
            }
        };
        splash.show();

        let armed = Arc::new(AtomicBool::new(true));
        let listener_armed = Arc::clone(&armed);
        let surfaces = Arc::clone(&self.collaborators.surfaces);
        let events = self.events.clone();
        let quitting = self.quitting.clone();
        splash.on_closed(Box::new(move || {
            if !listener_armed.load(Ordering::SeqCst) {
                return;
            }
            let snapshot = surfaces.snapshot();
            if snapshot.any_visible() {
                tracing::debug!(
                    visible = snapshot.visible().count(),
                    "splash closed while another surface is visible"
                );
                return;
            }
            tracing::info!("splash closed before the main surface was shown, quitting");
            quitting.cancel();
            events.request_quit();
        }));

        Some((splash, armed))
    }

    async fn backend_branch(&self) -> BranchOutcome {
        let backend = &self.collaborators.backend;
        let outcome = if backend.is_running().await {
            tracing::info!("backend services already running");
            BranchOutcome::Ready
        } else {
            tracing::info!("starting backend services");
            let started = match backend.resolve_location().await {
                Ok(location) => backend.start(&location).await,
                Err(e) => Err(e),
            };
            match started {
                Ok(()) => {
                    tracing::info!("backend services started");
                    BranchOutcome::Ready
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to start backend services");
                    BranchOutcome::Failed(e.to_string())
                }
            }
        };
        self.settled(Branch::Backend, &outcome);
        outcome
    }

    async fn frontend_branch(&self, renderer_ready: SignalWait) -> BranchOutcome {
        let outcome = if renderer_ready.wait().await {
            tracing::info!("renderer signaled ready");
            BranchOutcome::Ready
        } else {
            tracing::warn!("renderer-ready signal dropped before firing");
            BranchOutcome::Failed("renderer-ready signal dropped".into())
        };
        self.settled(Branch::Frontend, &outcome);
        outcome
    }

    fn settled(&self, branch: Branch, outcome: &BranchOutcome) {
        self.bus.publish(LifecycleEvent::BranchSettled {
            branch,
            ready: outcome.is_ready(),
        });
    }

    async fn post_ready_hook(&self, main: &dyn Surface) {
        let script = self.options.post_ready_script.trim();
        if script.is_empty() {
            return;
        }
        match main.run_script(script).await {
            Ok(value) => tracing::debug!(%value, "post-ready hook ran"),
            Err(e) => tracing::warn!(error = %e, "post-ready hook failed"),
        }
    }

    /// Closing the sole main surface means the user wants to quit.
    fn watch_main(&self, main: &dyn Surface) {
        let events = self.events.clone();
        main.on_closed(Box::new(move || {
            events.send(HostEvent::MainSurfaceClosed);
        }));
    }
}
