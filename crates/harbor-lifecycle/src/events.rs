use tokio::sync::broadcast;

use crate::boot::BootState;
use crate::readiness::Branch;

/// Lifecycle milestones published for observers (logging, tests, UI glue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    BootStateChanged(BootState),
    BranchSettled { branch: Branch, ready: bool },
    SystemReady,
    Revealed,
    ShutdownStarted,
    Exiting { code: i32 },
}

#[derive(Debug, Clone)]
pub struct LifecycleBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: LifecycleEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}

impl Default for LifecycleBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = LifecycleBus::default();
        let mut rx = bus.subscribe();

        bus.publish(LifecycleEvent::SystemReady);
        bus.publish(LifecycleEvent::Exiting { code: 1 });

        assert_eq!(rx.recv().await.unwrap(), LifecycleEvent::SystemReady);
        assert_eq!(rx.recv().await.unwrap(), LifecycleEvent::Exiting { code: 1 });
    }

    #[test]
    fn publish_returns_zero_with_no_subscribers() {
        let bus = LifecycleBus::default();
        assert_eq!(bus.publish(LifecycleEvent::Revealed), 0);
    }

    #[tokio::test]
    async fn clones_share_subscribers() {
        let bus = LifecycleBus::default();
        let mut rx = bus.subscribe();
        let clone = bus.clone();

        assert_eq!(clone.publish(LifecycleEvent::ShutdownStarted), 1);
        assert_eq!(rx.recv().await.unwrap(), LifecycleEvent::ShutdownStarted);
    }
}
