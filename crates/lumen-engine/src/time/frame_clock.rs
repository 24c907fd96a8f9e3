use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::stats::FrameStats;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Converts a rate in events per second into an interval.
///
/// A rate of zero maps to `Duration::ZERO`, which the clock treats as uncapped.
pub fn interval_for_rate(rate: u32) -> Duration {
    if rate == 0 {
        Duration::ZERO
    } else {
        Duration::from_nanos(NANOS_PER_SEC / u64::from(rate))
    }
}

/// State readable (and the pause flag writable) from any thread.
#[derive(Debug, Default)]
struct ClockShared {
    paused: AtomicBool,
    frame_count: AtomicU64,
    frame_time_nanos: AtomicU64,
    stats: RwLock<FrameStats>,
}

/// Thread-safe view of a [`FrameClock`].
///
/// Reads observe a consistent value that may lag the render thread by one frame.
#[derive(Debug, Clone)]
pub struct ClockHandle {
    shared: Arc<ClockShared>,
}

impl ClockHandle {
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Release);
    }

    /// Flips the pause flag and returns the new state.
    pub fn toggle_pause(&self) -> bool {
        !self.shared.paused.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Frames completed this session, excluding paused time.
    pub fn frame_count(&self) -> u64 {
        self.shared.frame_count.load(Ordering::Acquire)
    }

    /// Accumulated frame time this session, excluding paused time.
    pub fn frame_time(&self) -> Duration {
        Duration::from_nanos(self.shared.frame_time_nanos.load(Ordering::Acquire))
    }

    /// Last published statistics.
    pub fn stats(&self) -> FrameStats {
        *self
            .shared
            .stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn frame_rate(&self) -> f64 {
        self.stats().frame_rate
    }
}

/// Render-loop pacing clock.
///
/// Decides when a frame should be drawn for a target rate, measures how long
/// each drawn frame took, and periodically folds those measurements into a
/// published [`FrameStats`].
///
/// Two sets of accumulators are kept:
/// - session totals (`frame_count`, `frame_time`) that never reset but stop
///   advancing while paused
/// - a stats window that resets every time statistics are published
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    target_interval: Duration,
    stats_interval: Duration,

    last_draw: Instant,
    draw_elapsed: Duration,
    last_stats: Instant,

    session_time: Duration,
    session_frames: u64,

    window_time: Duration,
    window_frames: u64,
    window_min: Duration,
    window_max: Duration,

    stats: FrameStats,
    shared: Arc<ClockShared>,
}

impl FrameClock {
    /// Creates a clock starting now.
    ///
    /// `target_fps == 0` disables pacing. `stats_frequency` is refreshes per second.
    pub fn new(target_fps: u32, stats_frequency: u32) -> Self {
        Self::starting_at(Instant::now(), target_fps, stats_frequency)
    }

    /// Creates a clock with an explicit start instant.
    pub fn starting_at(now: Instant, target_fps: u32, stats_frequency: u32) -> Self {
        let mut clock = Self {
            start: now,
            target_interval: interval_for_rate(target_fps),
            stats_interval: interval_for_rate(stats_frequency.max(1)),
            last_draw: now,
            draw_elapsed: Duration::ZERO,
            last_stats: now,
            session_time: Duration::ZERO,
            session_frames: 0,
            window_time: Duration::ZERO,
            window_frames: 0,
            window_min: Duration::MAX,
            window_max: Duration::ZERO,
            stats: FrameStats::default(),
            shared: Arc::new(ClockShared::default()),
        };
        clock.init(now);
        clock
    }

    /// Resets the start epoch and every accumulator, and clears the pause flag.
    ///
    /// Handles obtained earlier stay connected to this clock.
    pub fn init(&mut self, now: Instant) {
        self.start = now;
        self.last_draw = now;
        self.draw_elapsed = Duration::ZERO;
        self.last_stats = now;
        self.session_time = Duration::ZERO;
        self.session_frames = 0;
        self.reset_window();
        self.stats = FrameStats::default();

        self.shared.paused.store(false, Ordering::Release);
        self.shared.frame_count.store(0, Ordering::Release);
        self.shared.frame_time_nanos.store(0, Ordering::Release);
        *self
            .shared
            .stats
            .write()
            .unwrap_or_else(PoisonError::into_inner) = FrameStats::default();
    }

    pub fn handle(&self) -> ClockHandle {
        ClockHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.target_interval = interval_for_rate(target_fps);
    }

    pub fn target_interval(&self) -> Duration {
        self.target_interval
    }

    pub fn is_uncapped(&self) -> bool {
        self.target_interval.is_zero()
    }

    pub fn set_stats_frequency(&mut self, stats_frequency: u32) {
        self.stats_interval = interval_for_rate(stats_frequency.max(1));
    }

    pub fn stats_interval(&self) -> Duration {
        self.stats_interval
    }

    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.shared.paused.store(false, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Returns true when a frame is due at `now`, and marks `now` as the
    /// start of that frame.
    ///
    /// Uncapped clocks are always due.
    pub fn should_draw(&mut self, now: Instant) -> bool {
        let since = now.saturating_duration_since(self.last_draw);
        if !self.is_uncapped() && since < self.target_interval {
            return false;
        }

        self.draw_elapsed = since;
        self.last_draw = now;
        true
    }

    /// Time between the two most recent due frames.
    pub fn draw_elapsed(&self) -> Duration {
        self.draw_elapsed
    }

    /// How long the render loop may idle before the next frame is due.
    pub fn time_until_next_draw(&self, now: Instant) -> Duration {
        let since = now.saturating_duration_since(self.last_draw);
        self.target_interval.saturating_sub(since)
    }

    /// Returns true when a stats window has elapsed, at least one frame was
    /// recorded in it, and the clock is not paused. On true the window is
    /// folded into a new published [`FrameStats`] and reset.
    pub fn should_update_stats(&mut self, now: Instant) -> bool {
        let since = now.saturating_duration_since(self.last_stats);
        if since < self.stats_interval || self.window_frames == 0 || self.is_paused() {
            return false;
        }

        let frames = self.window_frames;
        let avg = self.window_time.as_micros() / u128::from(frames);
        let window_secs = since.as_secs_f64();

        self.stats = FrameStats {
            frame_rate: if window_secs > 0.0 {
                frames as f64 / window_secs
            } else {
                0.0
            },
            avg_us: avg as u64,
            min_us: self.window_min.as_micros() as u64,
            max_us: self.window_max.as_micros() as u64,
        };
        *self
            .shared
            .stats
            .write()
            .unwrap_or_else(PoisonError::into_inner) = self.stats;

        self.reset_window();
        self.last_stats = now;
        true
    }

    /// Records a completed frame that finished at `actual_now`.
    ///
    /// No-op while paused.
    pub fn inc_frame(&mut self, actual_now: Instant) {
        if self.is_paused() {
            return;
        }

        let delta = actual_now.saturating_duration_since(self.last_draw);

        self.window_min = self.window_min.min(delta);
        self.window_max = self.window_max.max(delta);

        self.session_time += delta;
        self.session_frames += 1;
        self.window_time += delta;
        self.window_frames += 1;

        self.shared
            .frame_count
            .store(self.session_frames, Ordering::Release);
        self.shared.frame_time_nanos.store(
            u64::try_from(self.session_time.as_nanos()).unwrap_or(u64::MAX),
            Ordering::Release,
        );
    }

    pub fn frame_count(&self) -> u64 {
        self.session_frames
    }

    pub fn frame_time(&self) -> Duration {
        self.session_time
    }

    pub fn frame_rate(&self) -> f64 {
        self.stats.frame_rate
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Frames recorded in the current stats window.
    pub fn window_frames(&self) -> u64 {
        self.window_frames
    }

    /// Wall-clock time since `init`, unaffected by pause.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }

    fn reset_window(&mut self) {
        self.window_time = Duration::ZERO;
        self.window_frames = 0;
        self.window_min = Duration::MAX;
        self.window_max = Duration::ZERO;
    }
}
