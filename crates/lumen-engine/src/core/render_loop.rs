use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use crate::coords::Viewport;
use crate::delegate::panic_message;
use crate::device::GraphicsContext;
use crate::event::{EngineEvent, EventAggregator, EventKind, WindowEvent};
use crate::input::InputState;
use crate::time::FrameClock;

use super::error::error_chain;
use super::{App, Engine, FrameCtx, RenderLoopError};

/// Upper bound on one idle sleep, so a stop request is seen promptly even at
/// very low frame rates.
const MAX_IDLE: Duration = Duration::from_millis(20);
const PAUSED_IDLE: Duration = Duration::from_millis(1);

/// One-shot completion latch, signaled when dropped.
pub(crate) struct Latch(Sender<()>);

impl Drop for Latch {
    fn drop(&mut self) {
        let _ = self.0.try_send(());
    }
}

pub(crate) fn latch() -> (Latch, Receiver<()>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (Latch(tx), rx)
}

/// Render-side state, owned by the render thread.
pub(crate) struct RenderLoop<G, A> {
    engine: Engine,
    clock: FrameClock,
    aggregator: EventAggregator,
    input: InputState,
    gfx: G,
    app: A,
}

impl<G, A> RenderLoop<G, A>
where
    G: GraphicsContext,
    A: App<G>,
{
    pub(crate) fn new(
        engine: Engine,
        clock: FrameClock,
        aggregator: EventAggregator,
        gfx: G,
        app: A,
    ) -> Self {
        Self {
            engine,
            clock,
            aggregator,
            input: InputState::default(),
            gfx,
            app,
        }
    }

    /// Hands the app back without running; used when the thread fails to spawn.
    pub(crate) fn into_app(self) -> A {
        self.app
    }

    /// Runs until the engine stops or a fatal error occurs, then tears down
    /// and hands the app back. The latch is signaled last.
    pub(crate) fn run(mut self, latch: Latch) -> (A, Option<RenderLoopError>) {
        log::info!("render thread started");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_ticks()));
        let failure = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(RenderLoopError::Panicked(panic_message(&*payload))),
        };
        if let Some(err) = &failure {
            log::error!("render loop failed: {}", error_chain(err));
        }

        let teardown = panic::catch_unwind(AssertUnwindSafe(|| {
            self.app.render_teardown(&mut self.gfx);
            self.gfx.release();
        }));
        if let Err(payload) = teardown {
            log::error!("render teardown panicked: {}", panic_message(&*payload));
        }

        self.engine.stop();
        log::info!(
            "render thread exiting after {} frame(s)",
            self.clock.frame_count()
        );
        drop(latch);
        (self.app, failure)
    }

    fn run_ticks(&mut self) -> Result<(), RenderLoopError> {
        self.gfx.attach().map_err(RenderLoopError::Graphics)?;
        while self.engine.state().is_running() {
            self.tick(Instant::now())?;
        }
        Ok(())
    }

    fn tick(&mut self, now: Instant) -> Result<(), RenderLoopError> {
        if self.clock.should_draw(now) {
            self.draw(now)?;
        }

        let now = Instant::now();
        if self.clock.should_update_stats(now) {
            let stats = *self.clock.stats();
            log::debug!("{stats}");
            self.app.on_stats(&stats);
        }

        let idle = self.clock.time_until_next_draw(Instant::now());
        if !idle.is_zero() {
            thread::sleep(idle.min(MAX_IDLE));
        } else if self.clock.is_paused() {
            thread::sleep(PAUSED_IDLE);
        }
        Ok(())
    }

    fn draw(&mut self, now: Instant) -> Result<(), RenderLoopError> {
        let snapshot = self.aggregator.aggregate(now);

        for timed in snapshot.iter_kind(EventKind::Window) {
            if let EngineEvent::Window(WindowEvent::Resized { width, height }) = timed.event {
                self.gfx.resize(width, height);
            }
        }
        self.input.apply_snapshot(snapshot);
        self.app.on_input(&self.input, &self.engine);

        let display = &self.engine.config().display;
        let viewport =
            Viewport::from_surface(self.gfx.size(), display.pixel_scale_x, display.pixel_scale_y);

        if self.clock.is_paused() {
            return Ok(());
        }
        if !self.gfx.begin_frame().map_err(RenderLoopError::Graphics)? {
            return Ok(());
        }

        let mut ctx = FrameCtx {
            gfx: &mut self.gfx,
            elapsed: self.clock.draw_elapsed().as_secs_f64(),
            frame: self.clock.frame_count(),
            viewport,
            events: snapshot,
            input: &self.input,
            engine: &self.engine,
            notification: self.engine.notification_at(now),
        };
        self.app.draw(&mut ctx).map_err(RenderLoopError::Draw)?;

        self.gfx.present().map_err(RenderLoopError::Graphics)?;
        self.clock.inc_frame(Instant::now());
        Ok(())
    }
}
