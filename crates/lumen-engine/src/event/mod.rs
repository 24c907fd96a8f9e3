//! Per-tick event aggregation.
//!
//! Event flow:
//! - platforms and other producers push into [`EventSink`]s from any thread
//! - the render thread's [`EventAggregator`] polls every [`EventSource`] once
//!   per drawn tick and publishes an immutable [`EventSnapshot`]
//! - the draw hook reads that snapshot; other threads read the latest one
//!   through a [`SnapshotHandle`]

mod aggregator;
mod queue;
mod snapshot;
mod source;
mod types;

pub use aggregator::EventAggregator;
pub use queue::{event_queue, EventSink, QueueSource};
pub use snapshot::{EventSnapshot, SnapshotHandle};
pub use source::EventSource;
pub use types::{ControllerEvent, EngineEvent, EventKind, TimedEvent, WindowEvent};
