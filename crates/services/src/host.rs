//! Canvas selection watcher.
//!
//! Owns the sandbox connection on a dedicated thread: bounded connect
//! retries, then a fixed-interval selection poll. Events flow back over a
//! channel the controller drains between frames.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared::host::{CanvasSelection, FocusedNode, HostDocument, HostError};
use shared::settings::Settings;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

/// What the watcher reports back. `Connected` hands the caller its own
/// handle for tag and focus calls.
#[derive(Clone)]
pub enum HostEvent {
    Connecting { attempt: u32 },
    Connected(Arc<dyn HostDocument>),
    /// One poll tick; None means nothing is selected.
    Selection(Option<CanvasSelection>),
    /// A poll tick failed; the connection may still recover.
    PollFailed(String),
    /// The connect retry budget is spent.
    Unavailable { attempts: u32 },
}

impl std::fmt::Debug for HostEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostEvent::Connecting { attempt } => write!(f, "Connecting({})", attempt),
            HostEvent::Connected(_) => write!(f, "Connected"),
            HostEvent::Selection(sel) => write!(f, "Selection({:?})", sel),
            HostEvent::PollFailed(e) => write!(f, "PollFailed({})", e),
            HostEvent::Unavailable { attempts } => write!(f, "Unavailable({})", attempts),
        }
    }
}

/// Factory the watcher calls to (re)establish the sandbox connection.
pub type HostFactory = dyn Fn() -> Result<Arc<dyn HostDocument>> + Send + Sync;

/// Call the factory until it yields a connection or the retry budget runs
/// out, reporting every attempt on the event channel.
pub fn connect_with_retry(
    factory: &HostFactory,
    limit: u32,
    delay: Duration,
    events: &Sender<HostEvent>,
) -> Result<Arc<dyn HostDocument>, HostError> {
    let limit = limit.max(1);
    let mut last = String::new();
    for attempt in 1..=limit {
        let _ = events.send(HostEvent::Connecting { attempt });
        match factory() {
            Ok(host) => {
                let _ = events.send(HostEvent::Connected(host.clone()));
                return Ok(host);
            }
            Err(e) => {
                last = e.to_string();
                if attempt < limit {
                    std::thread::sleep(delay);
                }
            }
        }
    }
    let _ = events.send(HostEvent::Unavailable { attempts: limit });
    Err(HostError::RetriesExhausted {
        attempts: limit,
        last,
    })
}

/// Spawn the watcher thread. It stops on its own once the receiver is
/// dropped.
pub fn spawn_selection_watcher(
    factory: Arc<HostFactory>,
    settings: &Settings,
) -> Receiver<HostEvent> {
    let (tx, rx) = channel::<HostEvent>();
    let poll_interval = Duration::from_millis(settings.selection_poll_ms.max(1));
    let retry_delay = Duration::from_millis(settings.connect_retry_delay_ms);
    let retry_limit = settings.connect_retry_limit;

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::warn!("selection watcher could not start a runtime: {}", e);
                return;
            }
        };

        let host = match connect_with_retry(factory.as_ref(), retry_limit, retry_delay, &tx) {
            Ok(host) => host,
            Err(e) => {
                tracing::warn!("{}", e);
                return;
            }
        };

        loop {
            let event = match rt.block_on(host.get_selection()) {
                Ok(selection) => HostEvent::Selection(selection),
                Err(e) => HostEvent::PollFailed(e.to_string()),
            };
            if tx.send(event).is_err() {
                break;
            }
            std::thread::sleep(poll_interval);
        }
    });

    rx
}

/// Fixed-canvas host: serves a scripted selection and an in-memory tag map.
/// Useful offline and as a stand-in when no sandbox is reachable.
#[derive(Default)]
pub struct StaticHost {
    selection: RwLock<Option<CanvasSelection>>,
    tags: RwLock<HashMap<String, String>>,
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selection(selection: CanvasSelection) -> Self {
        let host = Self::default();
        *host.selection.write() = Some(selection);
        host
    }

    /// Replace what the canvas reports as selected.
    pub fn select(&self, selection: Option<CanvasSelection>) {
        *self.selection.write() = selection;
    }

    fn node_type_of(&self, node_id: &str) -> String {
        self.selection
            .read()
            .as_ref()
            .filter(|s| s.node_id == node_id)
            .map(|s| s.node_type.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HostDocument for StaticHost {
    async fn get_selection(&self) -> Result<Option<CanvasSelection>> {
        let mut selection = self.selection.read().clone();
        if let Some(sel) = selection.as_mut() {
            if sel.tag.is_none() {
                sel.tag = self.tags.read().get(&sel.node_id).cloned();
            }
        }
        Ok(selection)
    }

    async fn ensure_tag(&self, node_id: &str, tag: &str) -> Result<Option<String>> {
        let mut tags = self.tags.write();
        let stored = tags
            .entry(node_id.to_string())
            .or_insert_with(|| tag.to_string());
        Ok(Some(stored.clone()))
    }

    async fn focus_by_tag(&self, tag: &str) -> Result<Option<FocusedNode>> {
        let node_id = self
            .tags
            .read()
            .iter()
            .find(|(_, stored)| stored.as_str() == tag)
            .map(|(id, _)| id.clone());
        Ok(node_id.map(|node_id| {
            let node_type = self.node_type_of(&node_id);
            FocusedNode { node_id, node_type }
        }))
    }

    async fn focus_by_node_id(&self, node_id: &str) -> Result<Option<FocusedNode>> {
        let known = self.tags.read().contains_key(node_id)
            || self
                .selection
                .read()
                .as_ref()
                .map(|s| s.node_id == node_id)
                .unwrap_or(false);
        Ok(known.then(|| FocusedNode {
            node_id: node_id.to_string(),
            node_type: self.node_type_of(node_id),
        }))
    }
}
