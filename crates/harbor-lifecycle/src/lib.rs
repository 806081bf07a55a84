//! Startup and shutdown lifecycle of the Harbor desktop host.
//!
//! The [`LifecycleCoordinator`] turns host events into a boot run (update
//! check, splash, hidden main surface, readiness join, reveal) and a single
//! ordered teardown that ends in an exit code.

pub mod boot;
pub mod collaborators;
pub mod coordinator;
pub mod events;
pub mod readiness;
pub mod shutdown;
pub mod signal;
pub mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use boot::{BootOptions, BootSequencer, BootState, RevealOutcome};
pub use collaborators::{
    BackendServices, Collaborators, FrontendServer, ProcessExit, SecureFetch, Shortcuts, Updater,
};
pub use coordinator::LifecycleCoordinator;
pub use events::{LifecycleBus, LifecycleEvent};
pub use readiness::{Branch, BranchOutcome, ReadinessGate, ReadinessJoin};
pub use shutdown::{
    ExitOutcome, ShutdownGuard, ShutdownPhase, ShutdownSequencer, TeardownError, TeardownStep,
};
pub use signal::{once_signal, SignalTrigger, SignalWait};
pub use surface::{
    ClosedCallback, Surface, SurfaceHost, SurfaceId, SurfaceKind, SurfaceState,
    WindowVisibilitySnapshot,
};
