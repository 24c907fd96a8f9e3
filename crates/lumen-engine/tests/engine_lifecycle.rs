mod common;

use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use common::{serial, wait_until, Calls, Recorder};
use lumen_engine::core::RenderLoopError;
use lumen_engine::event::WindowEvent;
use lumen_engine::input::{ButtonState, InputEvent, Key, Modifiers};
use lumen_engine::platform::HeadlessPlatform;
use lumen_engine::{DisplayConfig, Engine, EngineConfig, EngineError, LifecycleState, StartupError};

const LONG: Duration = Duration::from_secs(10);

fn config() -> EngineConfig {
    EngineConfig::default()
        .with_title("lifecycle test")
        .with_display(DisplayConfig::new(200, 100).with_pixel_scale(2.0, 2.0))
        .with_target_fps(0)
}

// ── happy path ─────────────────────────────────────────────────────────────

#[test]
fn runs_until_the_app_stops_it() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new();
    let probe = platform.probe();
    let app = Recorder::new().stopping_after(10);
    let calls = app.calls.clone();

    engine.start(&mut platform, app).unwrap();

    assert_eq!(engine.state(), LifecycleState::Stopped);
    assert_eq!(Calls::count(&calls.setup), 1);
    assert_eq!(Calls::count(&calls.teardown), 1);
    assert_eq!(Calls::count(&calls.destroy), 1);
    assert_eq!(calls.draws(), 10);
    assert_eq!(engine.frame_count(), 10);

    assert!(probe.attached());
    assert!(probe.released());
    assert!(!probe.foreign_access());
    assert_eq!(probe.frames_presented(), 10);
}

#[test]
fn hooks_run_on_the_expected_threads() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new();
    let probe = platform.probe();
    let app = Recorder::new().stopping_after(3);
    let calls = app.calls.clone();

    engine.start(&mut platform, app).unwrap();

    let me = thread::current().id();
    assert_eq!(*calls.setup_thread.lock().unwrap(), Some(me));
    assert_eq!(*calls.destroy_thread.lock().unwrap(), Some(me));

    let render = probe.render_thread().unwrap();
    assert_ne!(render, me);
    assert!(calls.draw_threads.lock().unwrap().iter().all(|t| *t == render));
}

#[test]
fn stop_from_another_thread() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new();
    let app = Recorder::new();
    let calls = app.calls.clone();

    let watch = calls.clone();
    let remote = engine.clone();
    let stopper = thread::spawn(move || {
        assert!(wait_until(LONG, || watch.draws() >= 3));
        assert!(remote.stop());
    });

    engine.start(&mut platform, app).unwrap();
    stopper.join().unwrap();

    assert!(calls.draws() >= 3);
    assert_eq!(Calls::count(&calls.destroy), 1);
    assert_eq!(engine.state(), LifecycleState::Stopped);
}

#[test]
fn platform_exit_stops_the_engine() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new();
    let exit = platform.exit_handle();
    let app = Recorder::new();
    let calls = app.calls.clone();

    let watch = calls.clone();
    let closer = thread::spawn(move || {
        assert!(wait_until(LONG, || watch.draws() >= 1));
        exit.request();
    });

    engine.start(&mut platform, app).unwrap();
    closer.join().unwrap();
    assert_eq!(Calls::count(&calls.destroy), 1);
}

// ── startup failures ───────────────────────────────────────────────────────

#[test]
fn invalid_display_fails_before_anything_runs() {
    let _g = serial();
    let engine = Engine::new(config().with_display(DisplayConfig::new(640, 0)));
    let mut platform = HeadlessPlatform::new();
    let probe = platform.probe();
    let app = Recorder::new();
    let calls = app.calls.clone();

    let err = engine.start(&mut platform, app).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Startup(StartupError::InvalidDisplay { field: "height", .. })
    ));
    assert_eq!(Calls::count(&calls.setup), 0);
    assert!(!probe.attached());
    assert_eq!(engine.state(), LifecycleState::Unstarted);
}

#[test]
fn graphics_acquisition_failure_is_a_startup_error() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new().without_graphics();
    let app = Recorder::new();
    let calls = app.calls.clone();

    let err = engine.start(&mut platform, app).unwrap_err();
    assert!(matches!(err, EngineError::Startup(StartupError::Graphics(_))));
    assert_eq!(Calls::count(&calls.setup), 0);
    assert_eq!(engine.state(), LifecycleState::Stopped);
}

#[test]
fn setup_failure_still_destroys_the_app() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new();
    let app = Recorder::new().failing_setup();
    let calls = app.calls.clone();

    let err = engine.start(&mut platform, app).unwrap_err();
    assert!(matches!(err, EngineError::Startup(StartupError::Setup(_))));
    assert_eq!(Calls::count(&calls.setup), 1);
    assert_eq!(Calls::count(&calls.destroy), 1);
    assert_eq!(calls.draws(), 0);
    assert_eq!(engine.state(), LifecycleState::Stopped);
}

#[test]
fn delegator_bound_to_another_thread_refuses_start() {
    let _g = serial();
    let engine = Engine::new(config());
    let delegator = engine.delegator().clone();
    assert!(thread::spawn(move || delegator.bind_owner()).join().unwrap());

    let app = Recorder::new().delegating().stopping_after(2);
    let calls = app.calls.clone();
    let err = engine
        .start(&mut HeadlessPlatform::new(), app)
        .unwrap_err();
    assert!(matches!(err, EngineError::Startup(StartupError::OwnerBound)));
    assert_eq!(engine.state(), LifecycleState::Unstarted);
    assert_eq!(Calls::count(&calls.setup), 0);

    // The instance slot was not leaked.
    let fresh = Engine::new(config());
    let app = Recorder::new().delegating().stopping_after(2);
    let calls = app.calls.clone();
    fresh.start(&mut HeadlessPlatform::new(), app).unwrap();
    assert_eq!(*calls.delegated.lock().unwrap(), vec![10, 20]);
}

#[test]
fn second_start_fails_without_disturbing_the_first() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new();
    let app = Recorder::new();
    let calls = app.calls.clone();

    let watch = calls.clone();
    let remote = engine.clone();
    let intruder = thread::spawn(move || {
        assert!(wait_until(LONG, || watch.draws() >= 1));

        let second = Recorder::new();
        let second_calls = second.calls.clone();
        let err = remote
            .start(&mut HeadlessPlatform::new(), second)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Startup(StartupError::AlreadyStarted(LifecycleState::Running))
        ));
        assert_eq!(Calls::count(&second_calls.setup), 0);

        // A separate instance is refused while this one runs.
        let other = Engine::new(config());
        let err = other
            .start(&mut HeadlessPlatform::new(), Recorder::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::Startup(StartupError::InstanceActive)));
        assert_eq!(other.state(), LifecycleState::Unstarted);

        let before = watch.draws();
        assert!(wait_until(LONG, || watch.draws() > before));
        remote.stop();
    });

    engine.start(&mut platform, app).unwrap();
    intruder.join().unwrap();
    assert_eq!(Calls::count(&calls.destroy), 1);

    // Stopped is terminal.
    let err = engine
        .start(&mut HeadlessPlatform::new(), Recorder::new())
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Startup(StartupError::AlreadyStarted(LifecycleState::Stopped))
    ));
}

// ── fatal render errors ────────────────────────────────────────────────────

#[test]
fn draw_error_shuts_down_in_order() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new();
    let probe = platform.probe();
    let app = Recorder::new().failing_at(3);
    let calls = app.calls.clone();

    let err = engine.start(&mut platform, app).unwrap_err();
    assert!(matches!(err, EngineError::Render(RenderLoopError::Draw(_))));

    assert_eq!(calls.draws(), 3);
    assert_eq!(Calls::count(&calls.teardown), 1);
    assert_eq!(Calls::count(&calls.destroy), 1);
    assert!(probe.released());
    assert_eq!(engine.state(), LifecycleState::Stopped);
    // The failing frame was never counted.
    assert_eq!(engine.frame_count(), 2);
}

#[test]
fn draw_panic_is_caught() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new();
    let app = Recorder::new().panicking_at(2);
    let calls = app.calls.clone();

    match engine.start(&mut platform, app) {
        Err(EngineError::Render(RenderLoopError::Panicked(msg))) => {
            assert!(msg.contains("boom at frame 2"), "{msg}")
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(Calls::count(&calls.destroy), 1);
}

#[test]
fn graphics_failure_mid_run() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new().with_graphics_failure_at(4);
    let app = Recorder::new();
    let calls = app.calls.clone();

    let err = engine.start(&mut platform, app).unwrap_err();
    assert!(matches!(err, EngineError::Render(RenderLoopError::Graphics(_))));
    assert_eq!(calls.draws(), 4);
    assert_eq!(Calls::count(&calls.destroy), 1);
}

// ── pacing, pause and stats ────────────────────────────────────────────────

#[test]
fn paused_ticks_are_not_drawn() {
    let _g = serial();
    let engine = Engine::new(config().with_target_fps(200));
    let mut platform = HeadlessPlatform::new();
    let app = Recorder::new();
    let calls = app.calls.clone();

    let watch = calls.clone();
    let remote = engine.clone();
    let driver = thread::spawn(move || {
        assert!(wait_until(LONG, || watch.draws() >= 2));
        remote.pause();
        // Allow a draw that was already in flight to finish.
        thread::sleep(Duration::from_millis(20));
        let draws = watch.draws();
        let frames = remote.frame_count();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(watch.draws(), draws);
        assert_eq!(remote.frame_count(), frames);

        remote.resume();
        assert!(wait_until(LONG, || watch.draws() > draws + 1));
        remote.stop();
    });

    engine.start(&mut platform, app).unwrap();
    driver.join().unwrap();

    let notes = calls.notifications.lock().unwrap();
    assert!(notes.iter().any(|n| n == "Resumed"), "{notes:?}");
}

#[test]
fn input_hook_can_resume_a_paused_engine() {
    let _g = serial();
    let engine = Engine::new(config().with_target_fps(120));
    let mut platform = HeadlessPlatform::new();
    let sink = platform.sink();
    let app = Recorder::new().pausing_on_space();
    let calls = app.calls.clone();

    let tap = move || {
        for state in [ButtonState::Pressed, ButtonState::Released] {
            sink.push(InputEvent::Key {
                key: Key::Space,
                state,
                modifiers: Modifiers::default(),
                repeat: false,
            });
        }
    };

    let watch = calls.clone();
    let remote = engine.clone();
    let driver = thread::spawn(move || {
        assert!(wait_until(LONG, || watch.draws() >= 1));
        tap();
        assert!(wait_until(LONG, || remote.is_paused()));

        let ticks = watch.input_ticks.load(Ordering::SeqCst);
        assert!(wait_until(LONG, || {
            watch.input_ticks.load(Ordering::SeqCst) > ticks + 2
        }));
        tap();
        assert!(wait_until(LONG, || !remote.is_paused()));

        let draws = watch.draws();
        assert!(wait_until(LONG, || watch.draws() > draws));
        remote.stop();
    });

    engine.start(&mut platform, app).unwrap();
    driver.join().unwrap();
    assert!(!engine.is_paused());
}

#[test]
fn target_rate_bounds_the_draw_count() {
    let _g = serial();
    let engine = Engine::new(config().with_target_fps(50));
    let mut platform = HeadlessPlatform::new();
    let app = Recorder::new();
    let calls = app.calls.clone();

    let remote = engine.clone();
    let timer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        remote.stop();
    });

    engine.start(&mut platform, app).unwrap();
    timer.join().unwrap();

    // 300 ms at 20 ms per frame, plus the immediate first frame.
    assert!(calls.draws() <= 16, "drew {}", calls.draws());
    assert!(calls.draws() >= 2);
}

#[test]
fn stats_are_published() {
    let _g = serial();
    let engine = Engine::new(config().with_stats_frequency(20));
    let mut platform = HeadlessPlatform::new();
    let app = Recorder::new();
    let calls = app.calls.clone();

    let watch = calls.clone();
    let remote = engine.clone();
    let driver = thread::spawn(move || {
        assert!(wait_until(LONG, || Calls::count(&watch.stats) >= 2));
        remote.stop();
    });

    engine.start(&mut platform, app).unwrap();
    driver.join().unwrap();

    let stats = engine.stats();
    assert!(stats.frame_rate > 0.0);
    assert!(stats.min_us <= stats.avg_us && stats.avg_us <= stats.max_us);
    assert!(stats.to_string().starts_with("FPS("));
    assert_eq!(*calls.last_stats.lock().unwrap(), Some(stats));
}

// ── events and delegation ──────────────────────────────────────────────────

#[test]
fn injected_events_reach_the_draw_hook() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new();
    let probe = platform.probe();
    let sink = platform.sink();
    let app = Recorder::new();
    let calls = app.calls.clone();

    sink.push(InputEvent::Key {
        key: Key::Space,
        state: ButtonState::Pressed,
        modifiers: Modifiers::default(),
        repeat: false,
    });

    let watch = calls.clone();
    let remote = engine.clone();
    let driver = thread::spawn(move || {
        assert!(wait_until(LONG, || watch.draws() >= 2));
        sink.push(WindowEvent::Resized {
            width: 800,
            height: 400,
        });
        assert!(wait_until(LONG, || probe.resizes() == 1));
        let seen = watch.draws();
        assert!(wait_until(LONG, || watch.draws() > seen + 1));
        remote.stop();
    });

    engine.start(&mut platform, app).unwrap();
    driver.join().unwrap();

    assert_eq!(calls.space_held.lock().unwrap().first(), Some(&true));

    let viewports = calls.viewports.lock().unwrap();
    let first = viewports.first().unwrap();
    let last = viewports.last().unwrap();
    assert_eq!((first.width, first.height), (200.0, 100.0));
    assert_eq!((last.width, last.height), (400.0, 200.0));
}

#[test]
fn render_thread_can_delegate_to_the_owner() {
    let _g = serial();
    let engine = Engine::new(config());
    let mut platform = HeadlessPlatform::new();
    let app = Recorder::new().delegating().stopping_after(5);
    let calls = app.calls.clone();

    engine.start(&mut platform, app).unwrap();

    assert_eq!(*calls.delegated.lock().unwrap(), vec![10, 20, 30, 40, 50]);
    assert!(engine.delegator().is_closed());
}

#[test]
fn rendering_disabled_still_runs_the_main_loop() {
    let _g = serial();
    let engine = Engine::new(config().with_rendering(false));
    let mut platform = HeadlessPlatform::new();
    let probe = platform.probe();
    let app = Recorder::new();
    let calls = app.calls.clone();

    let remote = engine.clone();
    let worker = thread::spawn(move || {
        assert!(wait_until(LONG, || remote.is_running()));
        let owner = remote
            .delegator()
            .submit_blocking_with_result(|| Ok(thread::current().id()))
            .unwrap();
        remote.stop();
        owner
    });

    engine.start(&mut platform, app).unwrap();
    let owner = worker.join().unwrap();

    assert_eq!(owner, thread::current().id());
    assert_eq!(calls.draws(), 0);
    assert_eq!(Calls::count(&calls.setup), 1);
    assert_eq!(Calls::count(&calls.destroy), 1);
    assert!(!probe.attached());
}
