//! `memlane-runtime` – The Scene Host
//!
//! Everything that turns the pure layout and interaction pieces into a live
//! scene: reading the memory feed, composing the visible page, rendering the
//! view model and running the session event loop.
//!
//! # Modules
//!
//! - [`composer`] – [`SceneComposer`][composer::SceneComposer]: owns the
//!   collection, page cursor, solved layout and one interaction machine per
//!   visible item, and produces the [`SceneView`][renderer::SceneView].
//! - [`renderer`] – the [`SceneRenderer`][renderer::SceneRenderer] strategy
//!   (immersive or flat) and the view model the host draws.
//! - [`feed`] – [`MemoryFeed`][feed::MemoryFeed] and its HTTP, file and
//!   static implementations.
//! - [`session`] – [`SceneSession`][session::SceneSession]: the single-task
//!   async loop that owns the composer and ticks its timers.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.  Set
//!   `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export.

pub mod composer;
pub mod feed;
pub mod renderer;
pub mod session;
pub mod telemetry;

pub use composer::{ComposerConfig, SceneComposer};
pub use feed::{FeedError, FeedSnapshot, FileMemoryFeed, HttpMemoryFeed, MemoryFeed, StaticFeed};
pub use renderer::{FlatRenderer, ImmersiveRenderer, SceneFrame, SceneRenderer, SceneView, Tile};
pub use session::{SceneCommand, SceneSession, SessionConfig, SessionHandle};
pub use telemetry::{TracerProviderGuard, init_tracing};

use memlane_types::{MemlaneError, SelectionEvent};
use schemars::schema_for;

/// JSON Schema of the selection event delivered to the voice subsystem.
pub fn selection_event_schema() -> Result<serde_json::Value, MemlaneError> {
    serde_json::to_value(schema_for!(SelectionEvent))
        .map_err(|e| MemlaneError::Serialization(e.to_string()))
}
