//! Shutdown sequencer: single-run ordered teardown and the final exit.
//!
//! Also owns steady-state window behavior after reveal (activate).

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use harbor_common::{HarborError, HostEvent, HostEventSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::collaborators::Collaborators;
use crate::events::{LifecycleBus, LifecycleEvent};

/// Shutdown sequencer state. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Idle,
    CleaningUp,
    Terminated,
}

/// Result of the teardown, mapped onto the process exit code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    Failure(String),
}

impl ExitOutcome {
    pub fn code(&self) -> i32 {
        match self {
            ExitOutcome::Success => 0,
            ExitOutcome::Failure(_) => 1,
        }
    }
}

/// One teardown step, run in [`TeardownStep::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    StopFrontend,
    StopBackend,
    DestroyAuxiliarySurface,
}

impl TeardownStep {
    pub const ORDER: [TeardownStep; 3] = [
        TeardownStep::StopFrontend,
        TeardownStep::StopBackend,
        TeardownStep::DestroyAuxiliarySurface,
    ];
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownStep::StopFrontend => f.write_str("stop frontend server"),
            TeardownStep::StopBackend => f.write_str("stop backend services"),
            TeardownStep::DestroyAuxiliarySurface => f.write_str("destroy proxy surface"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{step} failed: {source}")]
pub struct TeardownError {
    pub step: TeardownStep,
    #[source]
    pub source: HarborError,
}

/// Single-shot flag: engaged by the first shutdown trigger, never released.
#[derive(Debug, Default)]
pub struct ShutdownGuard {
    engaged: AtomicBool,
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engage the guard. Only the first caller gets `true`.
    pub fn try_engage(&self) -> bool {
        self.engaged
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }
}

pub struct ShutdownSequencer {
    collaborators: Collaborators,
    events: HostEventSender,
    bus: LifecycleBus,
    quitting: CancellationToken,
    guard: ShutdownGuard,
    phase: Mutex<ShutdownPhase>,
    outcome: OnceLock<ExitOutcome>,
}

impl ShutdownSequencer {
    pub fn new(
        collaborators: Collaborators,
        events: HostEventSender,
        bus: LifecycleBus,
        quitting: CancellationToken,
    ) -> Self {
        Self {
            collaborators,
            events,
            bus,
            quitting,
            guard: ShutdownGuard::new(),
            phase: Mutex::new(ShutdownPhase::Idle),
            outcome: OnceLock::new(),
        }
    }

    pub fn phase(&self) -> ShutdownPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The final outcome, once teardown has finished.
    pub fn outcome(&self) -> Option<&ExitOutcome> {
        self.outcome.get()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.guard.is_engaged()
    }

    /// Engage the guard and hand back the teardown to drive.
    ///
    /// The guard is set before this returns, so every later call sees
    /// `None` even if the returned future has not been polled yet.
    pub fn begin(
        self: &Arc<Self>,
    ) -> Option<impl Future<Output = ExitOutcome> + Send + 'static> {
        if !self.guard.try_engage() {
            tracing::debug!(
                phase = ?self.phase(),
                "shutdown already in progress, ignoring trigger"
            );
            return None;
        }

        self.set_phase(ShutdownPhase::CleaningUp);
        self.quitting.cancel();
        self.bus.publish(LifecycleEvent::ShutdownStarted);
        tracing::info!("running shutdown cleanup");

        let this = Arc::clone(self);
        Some(async move { this.teardown().await })
    }

    /// Run the shutdown if no other trigger got there first.
    ///
    /// Returns `None` for ignored triggers.
    pub async fn trigger_shutdown(self: &Arc<Self>) -> Option<ExitOutcome> {
        let teardown = self.begin()?;
        Some(teardown.await)
    }

    /// Engage the guard now and run the teardown on a spawned task.
    pub fn spawn_trigger(self: &Arc<Self>) -> Option<JoinHandle<ExitOutcome>> {
        self.begin().map(tokio::spawn)
    }

    async fn teardown(&self) -> ExitOutcome {
        let outcome = match self.run_steps().await {
            Ok(()) => {
                tracing::info!("cleanup complete, exiting");
                ExitOutcome::Success
            }
            Err(e) => {
                tracing::error!(step = %e.step, error = %e.source, "cleanup failed, exiting");
                ExitOutcome::Failure(e.to_string())
            }
        };
        self.finish(&outcome);
        outcome
    }

    async fn run_steps(&self) -> Result<(), TeardownError> {
        for step in TeardownStep::ORDER {
            tracing::debug!(%step, "teardown step");
            self.run_step(step)
                .await
                .map_err(|source| TeardownError { step, source })?;
        }
        Ok(())
    }

    async fn run_step(&self, step: TeardownStep) -> harbor_common::Result<()> {
        match step {
            TeardownStep::StopFrontend => self.collaborators.frontend.stop().await,
            TeardownStep::StopBackend => self.collaborators.backend.stop().await,
            TeardownStep::DestroyAuxiliarySurface => {
                self.collaborators.secure_fetch.destroy_proxy_surface().await
            }
        }
    }

    fn finish(&self, outcome: &ExitOutcome) {
        self.set_phase(ShutdownPhase::Terminated);
        let _ = self.outcome.set(outcome.clone());
        let code = outcome.code();
        self.bus.publish(LifecycleEvent::Exiting { code });
        self.collaborators.exit.exit(code);
    }

    fn set_phase(&self, next: ShutdownPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Bring a surface forward after the app is activated.
    ///
    /// Shows the first live surface, or creates and shows a new main surface
    /// when none is left. Nothing new is created once shutdown has begun.
    pub async fn activate(&self) -> harbor_common::Result<()> {
        let surfaces = &self.collaborators.surfaces;
        if let Some(surface) = surfaces.first_live_surface() {
            tracing::debug!(surface = %surface.id(), "activate: showing existing surface");
            surface.show();
            return Ok(());
        }
        if self.guard.is_engaged() {
            tracing::debug!("activate during shutdown, not creating a main surface");
            return Ok(());
        }

        let main = surfaces.create_main().await?;
        tracing::info!(surface = %main.id(), "activate: created new main surface");
        main.show();
        let events = self.events.clone();
        main.on_closed(Box::new(move || {
            events.send(HostEvent::MainSurfaceClosed);
        }));
        Ok(())
    }
}
