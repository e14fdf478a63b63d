use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The four ordered life-stage buckets a memory can belong to.
///
/// Declaration order is chronological: `Childhood` is the most distant past,
/// `Recent` the closest to the present.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Era {
    Childhood,
    YoungAdult,
    Family,
    Recent,
}

impl Era {
    /// Every era, oldest first.
    pub const ALL: [Era; 4] = [Era::Childhood, Era::YoungAdult, Era::Family, Era::Recent];

    /// Zero-based chronological index (`Childhood` = 0, `Recent` = 3).
    pub fn index(self) -> usize {
        match self {
            Era::Childhood => 0,
            Era::YoungAdult => 1,
            Era::Family => 2,
            Era::Recent => 3,
        }
    }

    /// The wire code used by the memory backend.
    pub fn code(self) -> &'static str {
        match self {
            Era::Childhood => "childhood",
            Era::YoungAdult => "young-adult",
            Era::Family => "family",
            Era::Recent => "recent",
        }
    }

    /// Human-readable section label.
    pub fn label(self) -> &'static str {
        match self {
            Era::Childhood => "Childhood",
            Era::YoungAdult => "Young Adult Years",
            Era::Family => "Family Years",
            Era::Recent => "Recent Memories",
        }
    }

    /// Parse a backend era code.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace;
    /// `young_adult` and `young adult` are accepted for `young-adult`.
    /// Returns `None` for anything else, including the backend's `"unknown"`.
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "childhood" => Some(Era::Childhood),
            "young-adult" => Some(Era::YoungAdult),
            "family" => Some(Era::Family),
            "recent" => Some(Era::Recent),
            _ => None,
        }
    }

    /// Infer an era from a photo's position in a roughly chronological upload
    /// batch by splitting the batch into four equal quarters.
    ///
    /// A batch of zero or one photo is always [`Era::Recent`].
    pub fn infer_from_position(index: usize, total: usize) -> Self {
        if total <= 1 {
            return Era::Recent;
        }
        let quarter = total as f64 / 4.0;
        let index = index as f64;
        if index < quarter {
            Era::Childhood
        } else if index < quarter * 2.0 {
            Era::YoungAdult
        } else if index < quarter * 3.0 {
            Era::Family
        } else {
            Era::Recent
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A raw photo record as delivered by the memory feed.
///
/// Field aliases accept the backend's photo document shape
/// (`photo_id`, `url`, `date`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    #[serde(alias = "photo_id")]
    pub id: String,
    #[serde(default, alias = "url")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub caption: String,
    #[serde(default, alias = "date")]
    pub date_label: String,
    #[serde(default)]
    pub era: String,
}

/// A classified memory: a record whose era is one of the four known values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: String,
    pub image_url: Option<String>,
    pub caption: String,
    pub date_label: String,
    pub era: Era,
}

impl MemoryItem {
    /// Classify a raw record.  Returns `None` when the era is unrecognized.
    ///
    /// An empty image reference is normalised to `None`.
    pub fn from_record(record: &MemoryRecord) -> Option<Self> {
        let era = Era::from_code(&record.era)?;
        let image_url = record
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        Some(Self {
            id: record.id.clone(),
            image_url,
            caption: record.caption.clone(),
            date_label: record.date_label.clone(),
            era,
        })
    }

    /// The notification payload sent when this item is selected.
    pub fn selection_event(&self) -> SelectionEvent {
        SelectionEvent {
            item_id: self.id.clone(),
            caption: self.caption.clone(),
            date_label: self.date_label.clone(),
            era: self.era,
        }
    }
}

/// One-way notification delivered to the voice/narration subsystem when the
/// viewer activates an expanded memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEvent {
    pub item_id: String,
    pub caption: String,
    pub date_label: String,
    pub era: Era,
}

impl SelectionEvent {
    /// A one-line natural-language context string for a conversational agent.
    pub fn context_text(&self) -> String {
        let date = if self.date_label.trim().is_empty() {
            "an unknown date"
        } else {
            self.date_label.trim()
        };
        if self.caption.trim().is_empty() {
            format!(
                "The viewer selected a photo from {} ({date}).",
                self.era.label()
            )
        } else {
            format!(
                "The viewer selected a photo from {} ({date}): {}",
                self.era.label(),
                self.caption.trim()
            )
        }
    }
}

/// Per-item interaction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionState {
    Idle,
    Hovered,
    Dwelling,
    Expanded,
    SelectedCooldown,
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InteractionState::Idle => "idle",
            InteractionState::Hovered => "hovered",
            InteractionState::Dwelling => "dwelling",
            InteractionState::Expanded => "expanded",
            InteractionState::SelectedCooldown => "selected-cooldown",
        };
        f.write_str(s)
    }
}

/// Collection-level status reported by the memory feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum FeedStatus {
    Loading,
    Ready,
    Error(String),
}

/// Unified event wrapper for the in-process event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. "memlane-runtime::composer"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Stamp `payload` with a fresh id and the current UTC time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data routed over the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    /// A memory was activated; consumed by the narration subsystem.
    Selection(SelectionEvent),
    /// An item's interaction state changed.
    Interaction {
        item_id: String,
        from: InteractionState,
        to: InteractionState,
    },
    /// The visible page changed.
    PageChanged { page_index: usize, page_count: usize },
    /// The memory feed moved to a new status.
    FeedStatus(FeedStatus),
}

/// Error type shared across the engine.  None of these are fatal; callers
/// degrade the view or log and continue.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemlaneError {
    #[error("Memory feed unavailable: {0}")]
    FeedUnavailable(String),

    #[error("Narration delivery failed: {0}")]
    NarrationDelivery(String),

    #[error("Event bus error: {0}")]
    Channel(String),

    #[error("Invalid layout configuration: {0}")]
    InvalidLayout(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
