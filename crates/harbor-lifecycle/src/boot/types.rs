//! Boot sequence state and result types.

use crate::readiness::ReadinessJoin;

/// Boot sequence state. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BootState {
    /// Waiting for the startup update check.
    UpdateChecking,
    /// Splash surface is up.
    SplashShown,
    /// Main surface exists but is hidden.
    MainCreated,
    /// Backend and frontend branches are running.
    AwaitingReadiness,
    /// Both branches have settled.
    Ready,
    /// Splash closed, main surface shown.
    Revealed,
}

/// How a boot run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The main surface is showing.
    Revealed(ReadinessJoin),
    /// The update check asked to stop booting.
    UpdateDeclined,
    /// A quit arrived before the main surface was revealed.
    QuitDuringBoot,
    /// The main surface could not be created; a quit has been requested.
    MainSurfaceFailed(String),
    /// `run` was called more than once.
    AlreadyRan,
}

/// Boot tuning taken from the `[startup]` config section.
#[derive(Debug, Clone)]
pub struct BootOptions {
    pub show_splash: bool,
    /// Empty disables the post-ready hook.
    pub post_ready_script: String,
}

impl Default for BootOptions {
    fn default() -> Self {
        Self {
            show_splash: true,
            post_ready_script: "Host?.checkServer?.();".into(),
        }
    }
}
