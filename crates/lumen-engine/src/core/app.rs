use anyhow::Result;

use crate::device::GraphicsContext;
use crate::input::InputState;
use crate::time::FrameStats;

use super::ctx::FrameCtx;
use super::Engine;

/// Client contract implemented by users of the engine.
///
/// `setup` and `destroy` run on the owner thread. Everything else runs on the
/// render thread, which is why the app must be `Send`.
pub trait App<G: GraphicsContext>: Send + 'static {
    /// Called exactly once before either loop starts.
    fn setup(&mut self, engine: &Engine) -> Result<()> {
        let _ = engine;
        Ok(())
    }

    /// Called on the render thread after each event aggregation, including
    /// while paused. Input that must work while paused (resuming, quitting)
    /// belongs here rather than in `draw`.
    fn on_input(&mut self, input: &InputState, engine: &Engine) {
        let _ = (input, engine);
    }

    /// Called once per drawn, unpaused tick. An error is fatal.
    fn draw(&mut self, ctx: &mut FrameCtx<'_, G>) -> Result<()>;

    /// Called on the render thread each time statistics are refreshed.
    fn on_stats(&mut self, stats: &FrameStats) {
        let _ = stats;
    }

    /// Called on the render thread just before the graphics context is
    /// released, including after a fatal error.
    fn render_teardown(&mut self, gfx: &mut G) {
        let _ = gfx;
    }

    /// Called exactly once on the owner thread once `setup` has run: after
    /// both loops have stopped, or when startup is aborted after setup.
    fn destroy(&mut self) {}
}
