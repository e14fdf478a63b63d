//! Narration sinks – where selection events go.
//!
//! A [`NarrationSink`] receives one [`SelectionEvent`] per activation and
//! must return immediately; delivery is fire-and-forget.  Two sinks ship
//! with the engine:
//!
//! - [`BusNarrationSink`] publishes the event on [`Topic::Selection`] so any
//!   in-process subscriber (a voice agent, the CLI printer) can pick it up.
//! - [`HttpNarrationSink`] POSTs a small JSON envelope to a conversational
//!   agent endpoint from a background task.

use memlane_types::{Event, EventPayload, MemlaneError, SelectionEvent};
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::bus::{EventBus, Topic};

/// Header carrying the narration service API key.
pub const API_KEY_HEADER: &str = "xi-api-key";

/// Receives selection notifications.
pub trait NarrationSink: Send + Sync {
    /// Hand `event` off for delivery without blocking.
    ///
    /// An error means the event could not even be handed off; callers log it
    /// and carry on.
    fn notify(&self, event: &SelectionEvent) -> Result<(), MemlaneError>;
}

// ────────────────────────────────────────────────────────────────────────────
// BusNarrationSink
// ────────────────────────────────────────────────────────────────────────────

/// Publishes selections on the event bus.
#[derive(Debug, Clone)]
pub struct BusNarrationSink {
    bus: EventBus,
    source: String,
}

impl BusNarrationSink {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            source: "memlane-middleware::narration".to_string(),
        }
    }

    /// Override the `source` stamped on published events.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

impl NarrationSink for BusNarrationSink {
    fn notify(&self, event: &SelectionEvent) -> Result<(), MemlaneError> {
        let receivers = self.bus.publish_to(
            Topic::Selection,
            Event::new(self.source.clone(), EventPayload::Selection(event.clone())),
        )?;
        debug!(item_id = %event.item_id, receivers, "selection published");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HttpNarrationSink
// ────────────────────────────────────────────────────────────────────────────

/// JSON envelope POSTed to the narration endpoint.
#[derive(Debug, Serialize)]
pub struct NarrationRequest<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Natural-language context for the agent.
    pub text: String,
    pub memory: &'a SelectionEvent,
}

impl<'a> NarrationRequest<'a> {
    pub fn for_event(event: &'a SelectionEvent) -> Self {
        Self {
            kind: "memory_selected",
            text: event.context_text(),
            memory: event,
        }
    }
}

/// POSTs selections to an HTTP endpoint from a spawned task.
///
/// Must be used from inside a Tokio runtime; outside one,
/// [`notify`][NarrationSink::notify] returns
/// [`MemlaneError::NarrationDelivery`].
pub struct HttpNarrationSink {
    url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpNarrationSink {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for HttpNarrationSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpNarrationSink")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl NarrationSink for HttpNarrationSink {
    fn notify(&self, event: &SelectionEvent) -> Result<(), MemlaneError> {
        let handle = Handle::try_current()
            .map_err(|e| MemlaneError::NarrationDelivery(format!("no async runtime: {e}")))?;

        let mut request = self
            .client
            .post(&self.url)
            .json(&NarrationRequest::for_event(event));
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let item_id = event.item_id.clone();
        let url = self.url.clone();
        handle.spawn(async move {
            match request.send().await.and_then(|r| r.error_for_status()) {
                Ok(response) => {
                    debug!(%item_id, status = %response.status(), "narration delivered");
                }
                Err(e) => {
                    warn!(%item_id, %url, error = %e, "narration delivery failed");
                }
            }
        });
        Ok(())
    }
}
