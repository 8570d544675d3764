//! Saved note sets, newest first.

use crate::store::{KeyValueStore, NOTES_KEY};
use shared::notes::NoteSet;
use std::sync::Arc;
use uuid::Uuid;

pub struct NotesStore {
    store: Arc<dyn KeyValueStore>,
}

impl NotesStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All saved sets, most recent first. A corrupt slot reads as empty.
    pub fn all(&self) -> Vec<NoteSet> {
        let raw = match self.store.get(NOTES_KEY) {
            Ok(Some(raw)) => raw,
            _ => return Vec::new(),
        };
        match serde_json::from_str::<Vec<NoteSet>>(&raw) {
            Ok(sets) => sets,
            Err(e) => {
                tracing::warn!("discarding corrupt note sets slot: {}", e);
                Vec::new()
            }
        }
    }

    /// Inserts at the front so the newest set lists first.
    pub fn save(&self, set: NoteSet) {
        let mut sets = self.all();
        sets.insert(0, set);
        self.persist(&sets);
    }

    pub fn open(&self, id: Uuid) -> Option<NoteSet> {
        self.all().into_iter().find(|s| s.id == id)
    }

    fn persist(&self, sets: &[NoteSet]) {
        if let Ok(json) = serde_json::to_string(sets) {
            let _ = self.store.set(NOTES_KEY, &json);
        }
    }
}
