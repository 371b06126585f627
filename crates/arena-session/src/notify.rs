use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::broadcast;

use crate::snapshot::SessionSnapshot;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Push-based fan-out of session snapshots, one broadcast channel per
/// room. Subscribers that fall behind observe `Lagged` per broadcast
/// semantics; there is no historical replay. Dropping a receiver is
/// the whole unsubscribe story and has no effect on session state.
pub struct SessionNotifier {
    capacity: usize,
    channels: RwLock<HashMap<String, broadcast::Sender<SessionSnapshot>>>,
}

impl SessionNotifier {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to subsequent snapshots of `room_id`. The caller is
    /// responsible for pairing this with an initial snapshot read.
    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<SessionSnapshot> {
        let mut channels = self.channels.write().expect("notifier lock poisoned");
        channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Publish a committed snapshot. A room with no subscribers is a
    /// no-op; a send error only means every receiver was dropped.
    pub fn publish(&self, room_id: &str, snapshot: SessionSnapshot) {
        let channels = self.channels.read().expect("notifier lock poisoned");
        if let Some(sender) = channels.get(room_id) {
            let _ = sender.send(snapshot);
        }
    }

    pub fn subscriber_count(&self, room_id: &str) -> usize {
        self.channels
            .read()
            .expect("notifier lock poisoned")
            .get(room_id)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for SessionNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}
