//! Era-ordered collection builder.
//!
//! Turns the unordered feed into the single sequence every other stage works
//! on: all `childhood` items, then `young-adult`, `family` and `recent`, each
//! era keeping the order its items arrived in.  Records whose era cannot be
//! classified never make it into the sequence.

use memlane_types::{MemoryItem, MemoryRecord};
use tracing::debug;

/// Classify `records` and concatenate them era by era, oldest first.
///
/// The sort is stable, so items of the same era keep their feed order; dates
/// are never consulted.  Unrecognized eras are dropped silently.
pub fn build_era_ordered(records: &[MemoryRecord]) -> Vec<MemoryItem> {
    let mut items: Vec<MemoryItem> = Vec::with_capacity(records.len());
    for record in records {
        match MemoryItem::from_record(record) {
            Some(item) => items.push(item),
            None => debug!(id = %record.id, era = %record.era, "dropping record with unrecognized era"),
        }
    }
    items.sort_by_key(|item| item.era.index());
    items
}
