use crossbeam_channel::{Receiver, Sender};

use super::{EngineEvent, EventSource};

/// Creates a cross-thread event queue.
///
/// The [`EventSink`] half can be cloned and handed to any thread (the owner
/// thread's OS polling, controller polling, tests). The [`QueueSource`] half is
/// registered with the render thread's aggregator.
pub fn event_queue(name: impl Into<String>) -> (EventSink, QueueSource) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (
        EventSink { tx },
        QueueSource {
            name: name.into(),
            rx,
        },
    )
}

#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<EngineEvent>,
}

impl EventSink {
    /// Queues an event. Returns false once the source has been dropped.
    pub fn push(&self, event: impl Into<EngineEvent>) -> bool {
        self.tx.send(event.into()).is_ok()
    }
}

#[derive(Debug)]
pub struct QueueSource {
    name: String,
    rx: Receiver<EngineEvent>,
}

impl QueueSource {
    pub fn queued(&self) -> usize {
        self.rx.len()
    }
}

impl EventSource for QueueSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&mut self, out: &mut Vec<EngineEvent>) {
        // Events pushed while polling belong to the next tick.
        let queued = self.rx.len();
        out.extend(self.rx.try_iter().take(queued));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::WindowEvent;

    #[test]
    fn sink_events_arrive_in_order() {
        let (sink, mut source) = event_queue("test");
        sink.push(WindowEvent::Focused(true));
        sink.push(WindowEvent::CloseRequested);

        let mut out = Vec::new();
        source.poll(&mut out);
        assert_eq!(
            out,
            vec![
                EngineEvent::Window(WindowEvent::Focused(true)),
                EngineEvent::Window(WindowEvent::CloseRequested),
            ]
        );

        out.clear();
        source.poll(&mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn push_fails_after_source_drop() {
        let (sink, source) = event_queue("gone");
        drop(source);
        assert!(!sink.push(WindowEvent::CloseRequested));
    }
}
