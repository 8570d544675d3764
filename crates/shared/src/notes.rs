//! Note types produced by the analysis backend and persisted inside note sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category assigned to a note by the analysis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Task,
    Decision,
    Question,
}

impl NoteKind {
    /// Fixed order used for type-grouped columns and cluster slots.
    pub fn all() -> &'static [NoteKind] {
        &[NoteKind::Task, NoteKind::Decision, NoteKind::Question]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteKind::Task => "task",
            NoteKind::Decision => "decision",
            NoteKind::Question => "question",
        }
    }

    /// Column header shown above a group of notes.
    pub fn display_name(&self) -> &'static str {
        match self {
            NoteKind::Task => "Tasks",
            NoteKind::Decision => "Decisions",
            NoteKind::Question => "Questions",
        }
    }

    /// Position within the fixed type order.
    pub fn order_index(&self) -> usize {
        match self {
            NoteKind::Task => 0,
            NoteKind::Decision => 1,
            NoteKind::Question => 2,
        }
    }

    pub fn from_name(name: &str) -> Option<NoteKind> {
        match name {
            "task" => Some(NoteKind::Task),
            "decision" => Some(NoteKind::Decision),
            "question" => Some(NoteKind::Question),
            _ => None,
        }
    }
}

/// A single categorized note. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub text: String,
}

impl Note {
    pub fn new(kind: NoteKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Decode one stored note string. Unrecognized categories degrade to a task;
/// anything that is not a JSON object with non-empty `type` and `text`
/// becomes a task note carrying the raw string.
pub fn parse_stored_note(raw: &str) -> Note {
    #[derive(Deserialize)]
    struct StoredNote {
        #[serde(rename = "type", default)]
        kind: String,
        #[serde(default)]
        text: String,
    }

    match serde_json::from_str::<StoredNote>(raw) {
        Ok(stored) if !stored.kind.is_empty() && !stored.text.is_empty() => Note {
            kind: NoteKind::from_name(&stored.kind).unwrap_or(NoteKind::Task),
            text: stored.text,
        },
        _ => Note::new(NoteKind::Task, raw),
    }
}

/// A saved board: title plus the serialized notes it was rendered from.
/// Never mutated after creation; replaced by saving a new set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteSet {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sticky_notes: Vec<String>,
}

impl NoteSet {
    pub fn new(title: impl Into<String>, notes: &[Note]) -> Self {
        let sticky_notes = notes
            .iter()
            .map(|n| serde_json::to_string(n).unwrap_or_else(|_| n.text.clone()))
            .collect();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            created_at: Utc::now(),
            sticky_notes,
        }
    }

    /// Decode the stored strings back into notes, order preserved.
    pub fn notes(&self) -> Vec<Note> {
        self.sticky_notes
            .iter()
            .map(|raw| parse_stored_note(raw))
            .collect()
    }
}
