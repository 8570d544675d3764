//! Append-only discussion message log.

use crate::store::{KeyValueStore, DISCUSSION_KEY};
use shared::discussion::DiscussionMessage;
use std::sync::Arc;

pub struct DiscussionLog {
    store: Arc<dyn KeyValueStore>,
}

impl DiscussionLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Messages oldest first. A corrupt slot reads as empty.
    pub fn messages(&self) -> Vec<DiscussionMessage> {
        let raw = match self.store.get(DISCUSSION_KEY) {
            Ok(Some(raw)) => raw,
            _ => return Vec::new(),
        };
        match serde_json::from_str::<Vec<DiscussionMessage>>(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("discarding corrupt discussion slot: {}", e);
                Vec::new()
            }
        }
    }

    pub fn append(&self, message: DiscussionMessage) -> Vec<DiscussionMessage> {
        let mut messages = self.messages();
        messages.push(message);
        if let Ok(json) = serde_json::to_string(&messages) {
            let _ = self.store.set(DISCUSSION_KEY, &json);
        }
        messages
    }
}
