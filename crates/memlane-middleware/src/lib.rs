//! `memlane-middleware` – The Nervous System
//!
//! Routes events between the scene engine and its listeners without caring
//! about the events' meaning.
//!
//! # Modules
//!
//! - [`bus`] – Headless, typed, topic-based publish/subscribe event bus built
//!   on Tokio broadcast channels.
//! - [`narration`] – [`NarrationSink`][narration::NarrationSink] and its bus
//!   and HTTP implementations, which carry selection events to the voice
//!   subsystem.

pub mod bus;
pub mod narration;

pub use bus::{EventBus, Topic, TopicReceiver};
pub use narration::{BusNarrationSink, HttpNarrationSink, NarrationSink};
