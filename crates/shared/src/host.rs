//! Host-document boundary: selection snapshots and the sandboxed node API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Snapshot of the host's current selection. `tag` is present only when the
/// node already carries a persisted NoteGrid tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSelection {
    pub node_id: String,
    #[serde(default)]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Total nodes selected; flows with more than one use the first.
    #[serde(default)]
    pub selection_count: usize,
}

/// Node located by a focus call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusedNode {
    pub node_id: String,
    pub node_type: String,
}

/// Host-integration failures the caller distinguishes.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("host document not connected")]
    NotConnected,

    #[error("gave up connecting after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("host call failed: {0}")]
    Call(#[from] anyhow::Error),
}

/// Sandboxed document API. Calls cross an external boundary and may fail
/// transiently; the selection watcher owns the retry policy.
#[async_trait]
pub trait HostDocument: Send + Sync {
    /// Current selection, or None when nothing is selected.
    async fn get_selection(&self) -> anyhow::Result<Option<CanvasSelection>>;

    /// Persist `tag` on the node unless it already carries one. Returns the
    /// tag the node ends up with, or None when the node no longer exists.
    async fn ensure_tag(&self, node_id: &str, tag: &str) -> anyhow::Result<Option<String>>;

    async fn focus_by_tag(&self, tag: &str) -> anyhow::Result<Option<FocusedNode>>;

    async fn focus_by_node_id(&self, node_id: &str) -> anyhow::Result<Option<FocusedNode>>;
}
