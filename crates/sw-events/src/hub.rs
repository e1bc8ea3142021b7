use crate::types::ReviewStreamEvent;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Per-project fan-out for review lifecycle events.
///
/// Channels are created lazily on first subscribe or first emit and live for
/// the life of the process. Emission is fire-and-forget: an event sent while
/// no subscriber is attached is dropped, and there is no replay buffer.
#[derive(Clone, Default)]
pub struct ReviewHub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<ReviewStreamEvent>>>>,
}

impl ReviewHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, project_id: &str) -> broadcast::Receiver<ReviewStreamEvent> {
        self.sender(project_id).subscribe()
    }

    pub fn emit(&self, project_id: &str, event: ReviewStreamEvent) {
        // SendError just means nobody is listening right now.
        let _ = self.sender(project_id).send(event);
    }

    fn sender(&self, project_id: &str) -> broadcast::Sender<ReviewStreamEvent> {
        let mut channels = self.channels.lock().expect("review hub lock poisoned");
        channels
            .entry(project_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}
