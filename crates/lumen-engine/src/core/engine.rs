use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::Receiver;

use crate::delegate::{panic_message, Delegator};
use crate::device::GraphicsContext;
use crate::event::{EventAggregator, EventSnapshot, EventSource, SnapshotHandle};
use crate::platform::Platform;
use crate::time::{ClockHandle, FrameClock, FrameStats};

use super::lifecycle::{ActiveGuard, Lifecycle};
use super::notify::Notifier;
use super::render_loop::{self, RenderLoop};
use super::{main_loop, App, EngineConfig, EngineError, LifecycleState, RenderLoopError, StartupError};

const RENDER_THREAD_NAME: &str = "lumen-render";

/// Engine controller.
///
/// Cheap to clone; every clone refers to the same engine. The thread that
/// calls [`start`](Self::start) becomes the owner thread: it runs the main
/// loop and executes every delegated task until the engine stops.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

struct Inner {
    config: EngineConfig,
    lifecycle: Lifecycle,
    delegator: Arc<Delegator>,
    clock: ClockHandle,
    /// Taken by `start`.
    clock_seed: Mutex<Option<FrameClock>>,
    sources: Mutex<Vec<Box<dyn EventSource>>>,
    snapshot: SnapshotHandle,
    notifier: Notifier,
}

/// Where the app lives while the loops run.
enum Client<A> {
    Owner(A),
    Render {
        /// Yields `None` only if the render loop was reclaimed before it ran.
        handle: JoinHandle<Option<(A, Option<RenderLoopError>)>>,
        done: Receiver<()>,
    },
}

impl Engine {
    /// Creates an unstarted engine. The configuration is validated by `start`.
    pub fn new(config: EngineConfig) -> Self {
        let clock = FrameClock::new(config.target_fps, config.stats_frequency);
        Self {
            inner: Arc::new(Inner {
                clock: clock.handle(),
                clock_seed: Mutex::new(Some(clock)),
                notifier: Notifier::new(config.notification_secs),
                config,
                lifecycle: Lifecycle::new(),
                delegator: Arc::new(Delegator::new()),
                sources: Mutex::new(Vec::new()),
                snapshot: SnapshotHandle::default(),
            }),
        }
    }

    /// Runs the engine on the calling thread until it stops.
    ///
    /// Fails with [`StartupError`] before any thread is spawned when the
    /// engine was already started, another engine is running in this process,
    /// the configuration is invalid, graphics acquisition fails, or the setup
    /// hook fails. Returns [`EngineError::Render`] when the render loop ended
    /// on a fatal error; shutdown is orderly in that case too.
    pub fn start<P, A>(&self, platform: &mut P, mut app: A) -> Result<(), EngineError>
    where
        P: Platform,
        A: App<P::Graphics>,
    {
        let inner = &*self.inner;
        let state = inner.lifecycle.get();
        if state != LifecycleState::Unstarted {
            return Err(StartupError::AlreadyStarted(state).into());
        }
        inner.config.validate()?;
        let _active = ActiveGuard::claim().ok_or(StartupError::InstanceActive)?;
        if !inner.delegator.bind_owner() {
            return Err(StartupError::OwnerBound.into());
        }
        inner
            .lifecycle
            .transition(LifecycleState::Unstarted, LifecycleState::Running)
            .map_err(StartupError::AlreadyStarted)?;

        log::info!("engine starting: {:?}", inner.config.title);

        let gfx = if inner.config.rendering {
            match platform.create_graphics(&inner.config.title, &inner.config.display) {
                Ok(gfx) => Some(gfx),
                Err(e) => return Err(self.abort(StartupError::Graphics(e))),
            }
        } else {
            None
        };

        let mut clock = self.take_clock();
        clock.init(Instant::now());

        if let Err(e) = app.setup(self) {
            app.destroy();
            return Err(self.abort(StartupError::Setup(e)));
        }

        let client = match gfx {
            Some(gfx) => match self.spawn_render(platform, clock, gfx, app) {
                Ok(client) => client,
                Err(e) => return Err(self.abort(e)),
            },
            None => {
                log::info!("rendering disabled; no render thread");
                Client::Owner(app)
            }
        };

        let platform_failure = main_loop::run(self, platform);
        log::info!("main loop finished");

        let (app, render_failure) = match client {
            Client::Owner(app) => (Some(app), None),
            Client::Render { handle, done } => {
                main_loop::await_render(&inner.delegator, &done);
                match handle.join() {
                    Ok(Some((app, failure))) => (Some(app), failure),
                    Ok(None) => (None, None),
                    Err(payload) => {
                        let msg = panic_message(&*payload);
                        log::error!("render thread died: {msg}");
                        (None, Some(RenderLoopError::Panicked(msg)))
                    }
                }
            }
        };

        if let Some(mut app) = app {
            app.destroy();
        }
        platform.shutdown();
        self.finish();

        match (render_failure, platform_failure) {
            (Some(e), _) => Err(EngineError::Render(e)),
            (None, Some(e)) => Err(EngineError::Platform(e)),
            (None, None) => Ok(()),
        }
    }

    fn spawn_render<P, A>(
        &self,
        platform: &mut P,
        clock: FrameClock,
        mut gfx: P::Graphics,
        mut app: A,
    ) -> Result<Client<A>, StartupError>
    where
        P: Platform,
        A: App<P::Graphics>,
    {
        // Released on the owner thread before the render thread takes it.
        if let Err(e) = gfx.detach() {
            app.destroy();
            return Err(StartupError::Graphics(e));
        }

        let mut aggregator = EventAggregator::with_handle(self.inner.snapshot.clone());
        for source in platform.event_sources() {
            aggregator.register(source);
        }
        for source in self.take_sources() {
            aggregator.register(source);
        }

        let (latch, done) = render_loop::latch();
        // Shared so the app can be recovered if the thread never starts.
        let slot = Arc::new(Mutex::new(Some(RenderLoop::new(
            self.clone(),
            clock,
            aggregator,
            gfx,
            app,
        ))));
        let taken = Arc::clone(&slot);
        let spawned = thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_string())
            .spawn(move || {
                let render = taken.lock().unwrap_or_else(PoisonError::into_inner).take();
                render.map(|render| render.run(latch))
            });

        match spawned {
            Ok(handle) => Ok(Client::Render { handle, done }),
            Err(e) => {
                let render = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(render) = render {
                    render.into_app().destroy();
                }
                Err(StartupError::SpawnRenderThread(e))
            }
        }
    }

    fn abort(&self, err: StartupError) -> EngineError {
        log::error!("engine startup failed: {}", super::error::error_chain(&err));
        self.inner.lifecycle.request_stop();
        self.finish();
        err.into()
    }

    fn finish(&self) {
        let dropped = self.inner.delegator.close();
        if dropped > 0 {
            log::debug!("{dropped} delegated task(s) cancelled at shutdown");
        }
        self.inner.lifecycle.finish();
        log::info!("engine stopped");
    }

    fn take_clock(&self) -> FrameClock {
        self.inner
            .clock_seed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| {
                log::warn!("frame clock already taken; starting a detached clock");
                FrameClock::new(self.inner.config.target_fps, self.inner.config.stats_frequency)
            })
    }

    fn take_sources(&self) -> Vec<Box<dyn EventSource>> {
        std::mem::take(
            &mut *self
                .inner
                .sources
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Requests a cooperative stop, observed by each loop at its next
    /// iteration. Returns true if this call ended the `Running` state.
    pub fn stop(&self) -> bool {
        let stopped = self.inner.lifecycle.request_stop();
        if stopped {
            log::info!("engine stop requested");
        }
        stopped
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.get()
    }

    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn delegator(&self) -> &Arc<Delegator> {
        &self.inner.delegator
    }

    pub fn clock(&self) -> &ClockHandle {
        &self.inner.clock
    }

    /// Last published frame statistics.
    pub fn stats(&self) -> FrameStats {
        self.inner.clock.stats()
    }

    pub fn frame_count(&self) -> u64 {
        self.inner.clock.frame_count()
    }

    pub fn pause(&self) {
        self.inner.clock.pause();
        self.notify("Paused");
    }

    pub fn resume(&self) {
        self.inner.clock.resume();
        self.notify("Resumed");
    }

    /// Returns true if the engine is paused after the call.
    pub fn toggle_pause(&self) -> bool {
        let paused = self.inner.clock.toggle_pause();
        self.notify(if paused { "Paused" } else { "Resumed" });
        paused
    }

    pub fn is_paused(&self) -> bool {
        self.inner.clock.is_paused()
    }

    /// Shows `text` for the configured notification duration.
    pub fn notify(&self, text: impl Into<String>) {
        self.inner.notifier.post(text, Instant::now());
    }

    pub fn notification(&self) -> Option<String> {
        self.notification_at(Instant::now())
    }

    pub(crate) fn notification_at(&self, now: Instant) -> Option<String> {
        self.inner.notifier.active(now)
    }

    /// Latest event snapshot published by the render thread.
    pub fn snapshot(&self) -> EventSnapshot {
        self.inner.snapshot.load()
    }

    /// Adds an event source polled by the render thread. Only sources added
    /// before `start` are used; returns false otherwise.
    pub fn register_source(&self, source: impl EventSource + 'static) -> bool {
        if self.state() != LifecycleState::Unstarted {
            log::warn!("event source {:?} registered after start; ignored", source.name());
            return false;
        }
        self.inner
            .sources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(source));
        true
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("title", &self.inner.config.title)
            .field("state", &self.state())
            .field("paused", &self.is_paused())
            .field("frames", &self.frame_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EngineEvent;

    #[test]
    fn stop_before_start_is_a_no_op() {
        let engine = Engine::default();
        assert!(!engine.stop());
        assert_eq!(engine.state(), LifecycleState::Unstarted);
    }

    #[test]
    fn pause_posts_notification() {
        let engine = Engine::default();
        engine.pause();
        assert!(engine.is_paused());
        assert_eq!(engine.notification().as_deref(), Some("Paused"));

        assert!(!engine.toggle_pause());
        assert_eq!(engine.notification().as_deref(), Some("Resumed"));
    }

    #[test]
    fn clones_share_state() {
        let a = Engine::default();
        let b = a.clone();
        b.notify("hello");
        assert_eq!(a.notification().as_deref(), Some("hello"));
        assert!(Arc::ptr_eq(a.delegator(), b.delegator()));
    }

    #[test]
    fn sources_register_before_start() {
        let engine = Engine::default();
        assert!(engine.register_source(|_: &mut Vec<EngineEvent>| {}));
        assert_eq!(engine.take_sources().len(), 1);
    }
}
