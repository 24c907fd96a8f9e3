use super::EngineEvent;

/// A pollable producer of events, queried once per render tick.
///
/// Sources live on the render thread. `poll` appends everything observed since
/// the previous call, in the order the source observed it, and must not block.
pub trait EventSource: Send {
    fn name(&self) -> &str {
        "anonymous"
    }

    fn poll(&mut self, out: &mut Vec<EngineEvent>);
}

impl<F> EventSource for F
where
    F: FnMut(&mut Vec<EngineEvent>) + Send,
{
    fn poll(&mut self, out: &mut Vec<EngineEvent>) {
        self(out)
    }
}
