//! Client for the note-analysis backend.

use anyhow::{anyhow, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use shared::notes::{Note, NoteKind};
use std::sync::LazyLock;

// No request timeout: analysis has no abort path.
static SHARED_HTTP: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
});

/// One attachment for analysis: bytes plus enough metadata for a multipart
/// file part.
#[derive(Debug, Clone)]
pub struct AnalysisFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawNote {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Lenient per-note decode: unknown or missing categories become tasks,
/// missing text becomes empty. Order is preserved.
fn normalize(raw: Vec<RawNote>) -> Vec<Note> {
    raw.into_iter()
        .map(|n| Note {
            kind: NoteKind::from_name(&n.kind).unwrap_or(NoteKind::Task),
            text: n.text,
        })
        .collect()
}

pub struct AnalysisClient {
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Submit text and attachments, returning categorized notes. Fails fast
    /// on any non-2xx status; no retry, no backoff.
    pub async fn analyze(&self, text: &str, files: &[AnalysisFile]) -> Result<Vec<Note>> {
        let mut form = Form::new().text("text", text.to_string());
        for file in files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(&file.mime)?;
            form = form.part("files", part);
        }

        let resp = SHARED_HTTP
            .post(format!("{}/analyze", self.base_url.trim_end_matches('/')))
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let detail: String = body.chars().take(800).collect();
            if detail.trim().is_empty() {
                return Err(anyhow!("analysis error: {}", status));
            }
            return Err(anyhow!("analysis error: {}\n{}", status, detail));
        }

        let raw: Vec<RawNote> = resp.json().await?;
        Ok(normalize(raw))
    }
}
