use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use lumen_engine::device::GraphicsContext;
use lumen_engine::input::{InputState, Key};
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::platform::{HeadlessPlatform, Platform};
use lumen_engine::time::FrameStats;
use lumen_engine::{App, Engine, EngineConfig, FrameCtx};

/// Cycles the background color; Space toggles pause, Escape quits.
struct Pulse {
    engine: Option<Engine>,
    phase: f64,
}

impl<G: GraphicsContext> App<G> for Pulse {
    fn setup(&mut self, engine: &Engine) -> Result<()> {
        log::info!("pulse setup: {:?}", engine.config().display);
        self.engine = Some(engine.clone());
        Ok(())
    }

    fn on_input(&mut self, input: &InputState, engine: &Engine) {
        if input.key_pressed(Key::Escape) {
            engine.stop();
        }
        if input.key_pressed(Key::Space) {
            engine.toggle_pause();
        }
    }

    fn draw(&mut self, ctx: &mut FrameCtx<'_, G>) -> Result<()> {
        self.phase = (self.phase + ctx.elapsed * 0.25).fract();
        let t = self.phase * std::f64::consts::TAU;
        ctx.gfx.set_clear_color([
            0.5 + 0.5 * t.sin(),
            0.5 + 0.5 * (t + 2.1).sin(),
            0.5 + 0.5 * (t + 4.2).sin(),
            1.0,
        ]);

        if let Some(text) = ctx.notification() {
            log::trace!("frame {}: showing {text:?}", ctx.frame);
        }
        Ok(())
    }

    fn on_stats(&mut self, stats: &FrameStats) {
        log::info!("{stats}");
    }

    fn destroy(&mut self) {
        if let Some(engine) = self.engine.take() {
            log::info!("pulse done after {} frame(s)", engine.frame_count());
        }
    }
}

/// Asks the owner thread for a value twice a second until the engine stops.
fn spawn_worker(engine: Engine, done: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut ticks = 0u64;
        while !done.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(500));
            let frames = engine.clone();
            match engine
                .delegator()
                .submit_blocking_with_result(move || Ok(frames.frame_count()))
            {
                Ok(frames) => {
                    ticks += 1;
                    log::info!("worker tick {ticks}: owner reports {frames} frame(s)");
                }
                Err(e) => {
                    log::debug!("worker stopping: {e}");
                    break;
                }
            }
        }
    })
}

fn stop_after(engine: Engine, secs: u64) {
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(secs));
        engine.stop();
    });
}

fn load_config() -> Result<EngineConfig> {
    let mut config = match env::var("LUMEN_CONFIG") {
        Ok(path) => EngineConfig::from_toml_file(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        Err(_) => EngineConfig::default().with_title("lumen demo"),
    };
    config.apply_env_overrides();
    Ok(config)
}

fn run<P: Platform>(engine: &Engine, platform: &mut P) -> Result<()> {
    let done = Arc::new(AtomicBool::new(false));
    let worker = spawn_worker(engine.clone(), Arc::clone(&done));

    let result = engine.start(
        platform,
        Pulse {
            engine: None,
            phase: 0.0,
        },
    );

    done.store(true, Ordering::Release);
    if worker.join().is_err() {
        log::warn!("worker thread panicked");
    }
    result.context("engine run failed")
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = load_config()?;
    let engine = Engine::new(config);
    let headless = env::var_os("LUMEN_HEADLESS").is_some();
    let run_secs = env::var("LUMEN_RUN_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .or(headless.then_some(5));

    if let Some(secs) = run_secs {
        stop_after(engine.clone(), secs);
    }

    if headless {
        return run(&engine, &mut HeadlessPlatform::new());
    }

    run_windowed(&engine)
}

#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
fn run_windowed(engine: &Engine) -> Result<()> {
    let platform = lumen_engine::platform::WinitPlatform::new()?;
    #[cfg(feature = "gamepad")]
    let platform = match lumen_engine::platform::GilrsControllers::new() {
        Ok(pads) => platform.with_controller(pads),
        Err(e) => {
            log::warn!("gamepad support unavailable: {e:#}");
            platform
        }
    };
    let mut platform = platform;
    run(engine, &mut platform)
}

#[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
fn run_windowed(engine: &Engine) -> Result<()> {
    log::warn!("no windowing backend on this target; running headless");
    run(engine, &mut HeadlessPlatform::new())
}
