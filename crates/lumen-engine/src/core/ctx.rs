use crate::coords::Viewport;
use crate::delegate::Delegator;
use crate::event::EventSnapshot;
use crate::input::InputState;

use super::Engine;

/// Per-tick context passed to [`App::draw`](super::App::draw).
pub struct FrameCtx<'a, G> {
    pub gfx: &'a mut G,
    /// Seconds since the previous drawn frame.
    pub elapsed: f64,
    /// Frames completed before this one.
    pub frame: u64,
    pub viewport: Viewport,
    pub events: &'a EventSnapshot,
    pub input: &'a InputState,
    pub engine: &'a Engine,
    pub(crate) notification: Option<String>,
}

impl<'a, G> FrameCtx<'a, G> {
    /// Message posted through [`Engine::notify`] that has not yet expired.
    pub fn notification(&self) -> Option<&str> {
        self.notification.as_deref()
    }

    pub fn delegator(&self) -> &Delegator {
        self.engine.delegator()
    }

    /// Requests shutdown once this tick completes.
    pub fn stop(&self) {
        self.engine.stop();
    }
}
