//! Single-fire completion signals.
//!
//! A [`SignalTrigger`] is consumed by [`SignalTrigger::fire`], so a signal can
//! be raised at most once by construction.

use tokio::sync::oneshot;

/// Raising half of a single-fire signal.
#[derive(Debug)]
pub struct SignalTrigger {
    tx: oneshot::Sender<()>,
}

/// Waiting half of a single-fire signal.
#[derive(Debug)]
pub struct SignalWait {
    rx: oneshot::Receiver<()>,
}

/// Create a connected trigger/wait pair.
pub fn once_signal() -> (SignalTrigger, SignalWait) {
    let (tx, rx) = oneshot::channel();
    (SignalTrigger { tx }, SignalWait { rx })
}

impl SignalTrigger {
    /// Raise the signal. Returns `false` if nobody is waiting any more.
    pub fn fire(self) -> bool {
        self.tx.send(()).is_ok()
    }
}

impl SignalWait {
    /// Wait for the signal.
    ///
    /// Returns `false` if the trigger was dropped without firing, in which
    /// case the signal can never arrive.
    pub async fn wait(self) -> bool {
        self.rx.await.is_ok()
    }
}
