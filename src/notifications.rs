//! In-process change notifications.
//!
//! Fire-and-forget: publishing never blocks and never fails, subscribers that
//! fall behind lose the oldest events.

use tokio::sync::broadcast;
use uuid::Uuid;

/// Default number of buffered events per subscriber
const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEvent {
    JournalEntrySaved { day_uuid: Uuid, entry_uuid: Uuid },
    MediaAdded { day_uuid: Uuid, photo_uuid: Uuid },
}

#[derive(Debug, Clone)]
pub struct Notifications {
    sender: broadcast::Sender<JournalEvent>,
}

impl Notifications {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: JournalEvent) {
        match self.sender.send(event) {
            Ok(receivers) => log::trace!("Event delivered to {} subscribers", receivers),
            // No subscribers, nothing to do
            Err(_) => log::trace!("Event published without subscribers"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JournalEvent> {
        self.sender.subscribe()
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
