//! Discussion log types: messages, resolved mentions, canvas attachments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a mention token resolved against the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionKind {
    /// The synthetic broadcast entry, never tied to a member.
    Everyone,
    Lead,
    User,
}

impl MentionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MentionKind::Everyone => "everyone",
            MentionKind::Lead => "lead",
            MentionKind::User => "user",
        }
    }
}

/// A mention resolved at send time. `id` is the member id, or `"everyone"`
/// for the broadcast entry. Labels are frozen at resolution; removing or
/// renaming a member later leaves old messages untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionRef {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: MentionKind,
}

impl MentionRef {
    /// The broadcast mention, label fixed regardless of typed casing.
    pub fn everyone() -> Self {
        Self {
            id: "everyone".to_string(),
            label: "@Everyone".to_string(),
            kind: MentionKind::Everyone,
        }
    }

    /// Whether this mention can target an actual member inbox.
    pub fn is_taggable(&self) -> bool {
        matches!(self.kind, MentionKind::Lead | MentionKind::User)
    }
}

/// Weak reference to a canvas node. The host document owns node lifetime;
/// a stale tag simply fails to focus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    pub node_id: String,
    #[serde(default)]
    pub node_type: String,
    pub tag: String,
}

/// One sent message. Append-only; never edited or deleted after send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionMessage {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub mentions: Vec<MentionRef>,
    /// Zero or one attachment; the composer replaces rather than appends.
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    pub created_by: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl DiscussionMessage {
    pub fn compose(
        text: impl Into<String>,
        mentions: Vec<MentionRef>,
        attachments: Vec<AttachmentRef>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            mentions,
            attachments,
            created_by: "me".to_string(),
            created_at: Utc::now(),
        }
    }
}
