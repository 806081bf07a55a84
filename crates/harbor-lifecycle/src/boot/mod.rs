//! Boot sequencer.
//!
//! Runs the update check, opens the splash, creates the hidden main surface,
//! waits for backend and renderer readiness, then swaps the splash for the
//! main surface.

mod sequence;
mod types;

pub use sequence::BootSequencer;
pub use types::{BootOptions, BootState, RevealOutcome};
