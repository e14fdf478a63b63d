//! Memory feeds – where raw records come from.
//!
//! A [`MemoryFeed`] produces a [`FeedSnapshot`]: a collection status plus the
//! raw [`MemoryRecord`]s.  Feeds never fail loudly; every transport, HTTP or
//! decode problem is folded into a [`FeedStatus::Error`] snapshot so the
//! scene can show an error placeholder with a retry action.
//!
//! Three feeds ship with the runtime:
//!
//! - [`HttpMemoryFeed`] – `GET {base_url}/api/memories/{memory_id}` against the
//!   MemoryBridge backend.
//! - [`FileMemoryFeed`] – the same JSON document read from disk.
//! - [`StaticFeed`] – a fixed snapshot, for demos and tests.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use memlane_types::{FeedStatus, MemlaneError, MemoryRecord};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise while loading a feed.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The backend has no memory under the requested id.
    #[error("Memory '{0}' does not exist")]
    NotFound(String),
    /// No memory id was configured.
    #[error("No memory id configured")]
    MissingMemoryId,
    /// The document could not be read from disk.
    #[error("Could not read {path}: {reason}")]
    Io { path: String, reason: String },
    /// The document is not a memory document.
    #[error("Unexpected document format: {0}")]
    Decode(String),
}

impl From<FeedError> for MemlaneError {
    fn from(e: FeedError) -> Self {
        MemlaneError::FeedUnavailable(e.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────────────────────────────────────

/// The backend memory document.  Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub person_name: String,
    /// `processing` or `ready`.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub photos: Vec<MemoryRecord>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedDocument {
    Memory(MemoryDocument),
    Records(Vec<MemoryRecord>),
}

/// Decode either a full memory document or a bare array of photo records.
pub fn decode_document(json: &str) -> Result<MemoryDocument, FeedError> {
    match serde_json::from_str::<FeedDocument>(json) {
        Ok(FeedDocument::Memory(doc)) => Ok(doc),
        Ok(FeedDocument::Records(photos)) => Ok(MemoryDocument {
            status: "ready".to_string(),
            photos,
            ..MemoryDocument::default()
        }),
        Err(e) => Err(FeedError::Decode(e.to_string())),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FeedSnapshot
// ─────────────────────────────────────────────────────────────────────────────

/// One observation of the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub status: FeedStatus,
    pub records: Vec<MemoryRecord>,
    /// The backend has finished provisioning the voice agent.  Informational.
    pub narration_ready: bool,
    pub person_name: Option<String>,
}

impl FeedSnapshot {
    pub fn loading() -> Self {
        Self {
            status: FeedStatus::Loading,
            records: Vec::new(),
            narration_ready: false,
            person_name: None,
        }
    }

    pub fn ready(records: Vec<MemoryRecord>) -> Self {
        Self {
            status: FeedStatus::Ready,
            records,
            narration_ready: false,
            person_name: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: FeedStatus::Error(message.into()),
            ..Self::loading()
        }
    }

    /// A successfully fetched document is `ready` regardless of its backend
    /// processing status.
    pub fn from_document(doc: MemoryDocument) -> Self {
        let person_name = Some(doc.person_name).filter(|n| !n.trim().is_empty());
        Self {
            status: FeedStatus::Ready,
            narration_ready: doc.status.eq_ignore_ascii_case("ready"),
            records: doc.photos,
            person_name,
        }
    }

    fn from_result(result: Result<MemoryDocument, FeedError>) -> Self {
        match result {
            Ok(doc) => {
                debug!(photos = doc.photos.len(), status = %doc.status, "memory document loaded");
                Self::from_document(doc)
            }
            Err(e) => {
                warn!(error = %e, "memory feed failed");
                Self::error(e.to_string())
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryFeed trait
// ─────────────────────────────────────────────────────────────────────────────

/// A source of memory records.
#[async_trait]
pub trait MemoryFeed: Send + Sync {
    /// Fetch the current collection.  Never panics; failures become an
    /// error snapshot.
    async fn load(&self) -> FeedSnapshot;

    /// Where the feed reads from, for logs and the CLI banner.
    fn describe(&self) -> String;
}

// ─────────────────────────────────────────────────────────────────────────────
// HttpMemoryFeed
// ─────────────────────────────────────────────────────────────────────────────

/// Upper bound on one memory-document request, connect to last byte.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads a memory document from the MemoryBridge HTTP API.
pub struct HttpMemoryFeed {
    base_url: String,
    memory_id: String,
    client: reqwest::Client,
}

impl HttpMemoryFeed {
    pub fn new(base_url: impl Into<String>, memory_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            memory_id: memory_id.into(),
            client: build_client(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    /// Replace the request timeout.  A backend that accepts the connection
    /// but never answers yields an error snapshot after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// `{base_url}/api/memories/{memory_id}`.
    pub fn url(&self) -> String {
        format!(
            "{}/api/memories/{}",
            self.base_url.trim_end_matches('/'),
            self.memory_id.trim()
        )
    }

    async fn fetch(&self) -> Result<MemoryDocument, FeedError> {
        if self.memory_id.trim().is_empty() {
            return Err(FeedError::MissingMemoryId);
        }
        let response = self.client.get(self.url()).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(FeedError::NotFound(self.memory_id.trim().to_string()));
        }
        let body = response.error_for_status()?.text().await?;
        decode_document(&body)
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "HTTP client builder failed; falling back to defaults");
            reqwest::Client::new()
        })
}

#[async_trait]
impl MemoryFeed for HttpMemoryFeed {
    async fn load(&self) -> FeedSnapshot {
        FeedSnapshot::from_result(self.fetch().await)
    }

    fn describe(&self) -> String {
        self.url()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FileMemoryFeed
// ─────────────────────────────────────────────────────────────────────────────

/// Reads a memory document (or a bare record array) from a JSON file.
pub struct FileMemoryFeed {
    path: PathBuf,
}

impl FileMemoryFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn fetch(&self) -> Result<MemoryDocument, FeedError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FeedError::Io {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        decode_document(&raw)
    }
}

#[async_trait]
impl MemoryFeed for FileMemoryFeed {
    async fn load(&self) -> FeedSnapshot {
        FeedSnapshot::from_result(self.fetch().await)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// StaticFeed
// ─────────────────────────────────────────────────────────────────────────────

/// Always returns the same snapshot.
#[derive(Debug, Clone)]
pub struct StaticFeed {
    snapshot: FeedSnapshot,
}

impl StaticFeed {
    pub fn new(snapshot: FeedSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn ready(records: Vec<MemoryRecord>) -> Self {
        Self::new(FeedSnapshot::ready(records))
    }
}

#[async_trait]
impl MemoryFeed for StaticFeed {
    async fn load(&self) -> FeedSnapshot {
        self.snapshot.clone()
    }

    fn describe(&self) -> String {
        format!("static ({} records)", self.snapshot.records.len())
    }
}
