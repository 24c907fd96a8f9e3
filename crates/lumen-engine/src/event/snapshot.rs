use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use super::{EventKind, TimedEvent};

/// Immutable set of events collected by one render tick.
///
/// Cloning is cheap (the event list is shared). A new tick replaces the
/// snapshot wholesale; snapshots are never merged.
#[derive(Debug, Clone)]
pub struct EventSnapshot {
    tick: u64,
    stamp: Option<Instant>,
    events: Arc<[TimedEvent]>,
}

impl Default for EventSnapshot {
    fn default() -> Self {
        Self {
            tick: 0,
            stamp: None,
            events: Arc::from(Vec::new()),
        }
    }
}

impl EventSnapshot {
    pub(crate) fn new(tick: u64, stamp: Instant, events: Vec<TimedEvent>) -> Self {
        Self {
            tick,
            stamp: Some(stamp),
            events: Arc::from(events),
        }
    }

    /// Tick that produced this snapshot; 0 before the first aggregation.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn stamp(&self) -> Option<Instant> {
        self.stamp
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedEvent> {
        self.events.iter()
    }

    /// Copy of every event in the snapshot.
    pub fn get(&self) -> Vec<TimedEvent> {
        self.events.to_vec()
    }

    /// Copy of the events of one category, in source-reported order.
    pub fn get_kind(&self, kind: EventKind) -> Vec<TimedEvent> {
        self.iter_kind(kind).cloned().collect()
    }

    pub fn iter_kind(&self, kind: EventKind) -> impl Iterator<Item = &TimedEvent> {
        self.events.iter().filter(move |e| e.kind() == kind)
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.iter_kind(kind).count()
    }
}

/// Shared slot holding the latest snapshot, readable from any thread.
///
/// Replacement swaps the whole snapshot under a lock, so readers see either
/// the previous tick or the new one, never a mix.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHandle {
    slot: Arc<RwLock<EventSnapshot>>,
}

impl SnapshotHandle {
    pub fn load(&self) -> EventSnapshot {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn store(&self, snapshot: EventSnapshot) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }
}
