use std::time::Instant;

use super::{EngineEvent, EventKind, EventSnapshot, EventSource, SnapshotHandle, TimedEvent};

/// Collects events from every registered source once per tick.
///
/// Owned by the render thread. Each [`aggregate`](Self::aggregate) call throws
/// the previous snapshot away, polls all sources in registration order, stamps
/// the results with the tick timestamp and publishes them as one snapshot.
pub struct EventAggregator {
    sources: Vec<Box<dyn EventSource>>,
    current: EventSnapshot,
    published: SnapshotHandle,
    scratch: Vec<EngineEvent>,
    tick: u64,
}

impl EventAggregator {
    pub fn new() -> Self {
        Self::with_handle(SnapshotHandle::default())
    }

    /// Creates an aggregator publishing into an existing handle.
    pub fn with_handle(published: SnapshotHandle) -> Self {
        Self {
            sources: Vec::new(),
            current: EventSnapshot::default(),
            published,
            scratch: Vec::new(),
            tick: 0,
        }
    }

    pub fn register(&mut self, source: Box<dyn EventSource>) {
        log::debug!("event source registered: {}", source.name());
        self.sources.push(source);
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn handle(&self) -> SnapshotHandle {
        self.published.clone()
    }

    /// Runs one aggregation pass and returns the new snapshot.
    pub fn aggregate(&mut self, stamp: Instant) -> &EventSnapshot {
        self.tick += 1;
        self.scratch.clear();

        for source in &mut self.sources {
            source.poll(&mut self.scratch);
        }

        let tick = self.tick;
        let events = self
            .scratch
            .drain(..)
            .map(|event| TimedEvent { tick, stamp, event })
            .collect();

        self.current = EventSnapshot::new(tick, stamp, events);
        self.published.store(self.current.clone());
        &self.current
    }

    pub fn snapshot(&self) -> &EventSnapshot {
        &self.current
    }

    pub fn get(&self) -> Vec<TimedEvent> {
        self.current.get()
    }

    pub fn get_kind(&self, kind: EventKind) -> Vec<TimedEvent> {
        self.current.get_kind(kind)
    }
}

impl Default for EventAggregator {
    fn default() -> Self {
        Self::new()
    }
}
