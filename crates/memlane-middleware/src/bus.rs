//! In-process event bus for scene events.
//!
//! Three independent lanes, each a [`tokio::sync::broadcast`] channel: a slow
//! listener on one lane never holds up the others, and every listener on a
//! lane sees every event published to it.
//!
//! # Topics
//!
//! | Topic | Carries |
//! |---|---|
//! | [`Topic::Selection`] | Activated memories, consumed by the narration subsystem |
//! | [`Topic::Interaction`] | Per-item state transitions (hover, dwell, expand) |
//! | [`Topic::Scene`] | Page changes and memory-feed status |

use memlane_types::{Event, EventPayload, MemlaneError};
use tokio::sync::broadcast;
use tracing::warn;

/// Events buffered per lane before the oldest are overwritten for listeners
/// that fall behind.
pub const DEFAULT_CAPACITY: usize = 256;

/// Routing lanes of the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// A memory was activated and should be narrated.
    Selection,
    /// An item's interaction state changed.
    Interaction,
    /// Page and feed-status changes of the scene as a whole.
    Scene,
}

impl Topic {
    /// The lane a payload belongs on.
    pub fn for_payload(payload: &EventPayload) -> Self {
        match payload {
            EventPayload::Selection(_) => Topic::Selection,
            EventPayload::Interaction { .. } => Topic::Interaction,
            EventPayload::PageChanged { .. } | EventPayload::FeedStatus(_) => Topic::Scene,
        }
    }
}

/// Cloneable handle; clones publish into and subscribe from the same lanes.
#[derive(Clone, Debug)]
pub struct EventBus {
    selection: broadcast::Sender<Event>,
    interaction: broadcast::Sender<Event>,
    scene: broadcast::Sender<Event>,
}

impl EventBus {
    /// `capacity` is per lane.
    pub fn new(capacity: usize) -> Self {
        let (selection, _) = broadcast::channel(capacity);
        let (interaction, _) = broadcast::channel(capacity);
        let (scene, _) = broadcast::channel(capacity);
        Self {
            selection,
            interaction,
            scene,
        }
    }

    /// Send `event` on `topic`.
    ///
    /// Returns how many listeners were handed the event, or
    /// [`MemlaneError::Channel`] when the lane has none.
    pub fn publish_to(&self, topic: Topic, event: Event) -> Result<usize, MemlaneError> {
        self.lane(topic)
            .send(event)
            .map_err(|_| MemlaneError::Channel(format!("no listener on the {topic:?} lane")))
    }

    /// Send `event` on the lane its payload belongs to.
    pub fn publish(&self, event: Event) -> Result<usize, MemlaneError> {
        let topic = Topic::for_payload(&event.payload);
        self.publish_to(topic, event)
    }

    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.lane(topic).subscribe(),
        }
    }

    /// Number of live listeners on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.lane(topic).receiver_count()
    }

    fn lane(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Selection => &self.selection,
            Topic::Interaction => &self.interaction,
            Topic::Scene => &self.scene,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TopicReceiver
// ─────────────────────────────────────────────────────────────────────────────

/// Listener on one lane, from [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Raw receive.  `Lagged(n)` means `n` events were overwritten before
    /// this listener read them; `Closed` means every bus handle is gone.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Next event, stepping over any gap.  `None` once the bus is gone.
    pub async fn next_event(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(topic = ?self.topic, skipped, "listener fell behind; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }
}
