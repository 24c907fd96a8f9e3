#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use anyhow::bail;
use lumen_engine::coords::Viewport;
use lumen_engine::device::HeadlessGraphics;
use lumen_engine::input::{InputState, Key};
use lumen_engine::time::FrameStats;
use lumen_engine::{App, Engine, FrameCtx};

/// Only one engine may run per process; engine tests take this first.
static ENGINE_LOCK: Mutex<()> = Mutex::new(());

pub fn serial() -> MutexGuard<'static, ()> {
    ENGINE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Polls `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

/// What a [`Recorder`] observed, shared with the test thread.
#[derive(Debug, Default)]
pub struct Calls {
    pub setup: AtomicU32,
    pub draws: AtomicU64,
    pub stats: AtomicU32,
    pub input_ticks: AtomicU64,
    pub teardown: AtomicU32,
    pub destroy: AtomicU32,
    pub setup_thread: Mutex<Option<ThreadId>>,
    pub destroy_thread: Mutex<Option<ThreadId>>,
    pub draw_threads: Mutex<Vec<ThreadId>>,
    pub viewports: Mutex<Vec<Viewport>>,
    pub notifications: Mutex<Vec<String>>,
    pub space_held: Mutex<Vec<bool>>,
    pub delegated: Mutex<Vec<u64>>,
    pub last_stats: Mutex<Option<FrameStats>>,
}

impl Calls {
    pub fn draws(&self) -> u64 {
        self.draws.load(Ordering::SeqCst)
    }

    pub fn count(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Recorder {
    pub calls: Arc<Calls>,
    /// Stop the engine from inside the draw that reaches this count.
    pub stop_after: Option<u64>,
    pub fail_at: Option<u64>,
    pub panic_at: Option<u64>,
    /// Round-trip a value through the owner thread on every draw.
    pub delegate_each_frame: bool,
    pub fail_setup: bool,
    /// Toggle pause from the input hook whenever Space is pressed.
    pub space_toggles_pause: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stopping_after(mut self, frames: u64) -> Self {
        self.stop_after = Some(frames);
        self
    }

    pub fn failing_at(mut self, frame: u64) -> Self {
        self.fail_at = Some(frame);
        self
    }

    pub fn panicking_at(mut self, frame: u64) -> Self {
        self.panic_at = Some(frame);
        self
    }

    pub fn delegating(mut self) -> Self {
        self.delegate_each_frame = true;
        self
    }

    pub fn failing_setup(mut self) -> Self {
        self.fail_setup = true;
        self
    }

    pub fn pausing_on_space(mut self) -> Self {
        self.space_toggles_pause = true;
        self
    }
}

impl App<HeadlessGraphics> for Recorder {
    fn setup(&mut self, _engine: &Engine) -> anyhow::Result<()> {
        self.calls.setup.fetch_add(1, Ordering::SeqCst);
        *self.calls.setup_thread.lock().unwrap() = Some(thread::current().id());
        if self.fail_setup {
            bail!("setup refused");
        }
        Ok(())
    }

    fn on_input(&mut self, input: &InputState, engine: &Engine) {
        self.calls.input_ticks.fetch_add(1, Ordering::SeqCst);
        if self.space_toggles_pause && input.key_pressed(Key::Space) {
            engine.toggle_pause();
        }
    }

    fn draw(&mut self, ctx: &mut FrameCtx<'_, HeadlessGraphics>) -> anyhow::Result<()> {
        let n = self.calls.draws.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls
            .draw_threads
            .lock()
            .unwrap()
            .push(thread::current().id());
        self.calls.viewports.lock().unwrap().push(ctx.viewport);
        self.calls
            .space_held
            .lock()
            .unwrap()
            .push(ctx.input.key_down(Key::Space));
        if let Some(text) = ctx.notification() {
            self.calls.notifications.lock().unwrap().push(text.to_string());
        }

        if self.delegate_each_frame {
            let v = ctx
                .delegator()
                .submit_blocking_with_result(move || Ok(n * 10))?;
            self.calls.delegated.lock().unwrap().push(v);
        }

        if self.panic_at == Some(n) {
            panic!("boom at frame {n}");
        }
        if self.fail_at == Some(n) {
            bail!("draw failed at frame {n}");
        }
        if self.stop_after == Some(n) {
            ctx.stop();
        }
        Ok(())
    }

    fn on_stats(&mut self, stats: &FrameStats) {
        self.calls.stats.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_stats.lock().unwrap() = Some(*stats);
    }

    fn render_teardown(&mut self, _gfx: &mut HeadlessGraphics) {
        self.calls.teardown.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy(&mut self) {
        self.calls.destroy.fetch_add(1, Ordering::SeqCst);
        *self.calls.destroy_thread.lock().unwrap() = Some(thread::current().id());
    }
}
