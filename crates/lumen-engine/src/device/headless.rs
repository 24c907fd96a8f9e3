use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};

use anyhow::{bail, Result};

use super::GraphicsContext;

/// Shared view of what a [`HeadlessGraphics`] has done.
///
/// The context itself lives on the render thread; tests and demos keep a
/// clone of this to inspect it from outside.
#[derive(Debug, Default)]
pub struct GraphicsProbe {
    begun: AtomicU64,
    presented: AtomicU64,
    resizes: AtomicU64,
    attached: AtomicBool,
    released: AtomicBool,
    foreign_access: AtomicBool,
    render_thread: Mutex<Option<ThreadId>>,
}

impl GraphicsProbe {
    pub fn frames_begun(&self) -> u64 {
        self.begun.load(Ordering::Acquire)
    }

    pub fn frames_presented(&self) -> u64 {
        self.presented.load(Ordering::Acquire)
    }

    pub fn resizes(&self) -> u64 {
        self.resizes.load(Ordering::Acquire)
    }

    pub fn attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Thread the context was attached on.
    pub fn render_thread(&self) -> Option<ThreadId> {
        *self
            .render_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// True if any render-side call happened off the attached thread.
    pub fn foreign_access(&self) -> bool {
        self.foreign_access.load(Ordering::Acquire)
    }

    fn check_thread(&self) {
        let current = thread::current().id();
        if let Some(owner) = self.render_thread() {
            if owner != current {
                self.foreign_access.store(true, Ordering::Release);
            }
        }
    }
}

/// Graphics context with no GPU behind it.
///
/// Frames are counted rather than drawn. Used by the headless platform and by
/// tests, which can ask it to fail at a given frame.
#[derive(Debug)]
pub struct HeadlessGraphics {
    size: (u32, u32),
    in_frame: bool,
    clear: [f64; 4],
    fail_at: Option<u64>,
    probe: Arc<GraphicsProbe>,
}

impl HeadlessGraphics {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            in_frame: false,
            clear: [0.0, 0.0, 0.0, 1.0],
            fail_at: None,
            probe: Arc::new(GraphicsProbe::default()),
        }
    }

    /// Makes `begin_frame` fail once `frame` frames have been begun.
    pub fn failing_at(mut self, frame: u64) -> Self {
        self.fail_at = Some(frame);
        self
    }

    /// Reports into an existing probe instead of a fresh one.
    pub fn with_probe(mut self, probe: Arc<GraphicsProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn probe(&self) -> Arc<GraphicsProbe> {
        Arc::clone(&self.probe)
    }

    pub fn clear_color(&self) -> [f64; 4] {
        self.clear
    }
}

impl GraphicsContext for HeadlessGraphics {
    fn attach(&mut self) -> Result<()> {
        *self
            .probe
            .render_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        self.probe.attached.store(true, Ordering::Release);
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.probe.check_thread();
        self.size = (width, height);
        self.probe.resizes.fetch_add(1, Ordering::AcqRel);
    }

    fn begin_frame(&mut self) -> Result<bool> {
        self.probe.check_thread();
        let begun = self.probe.frames_begun();
        if self.fail_at.is_some_and(|n| begun >= n) {
            bail!("headless graphics failed at frame {begun}");
        }
        if self.size.0 == 0 || self.size.1 == 0 {
            return Ok(false);
        }
        self.in_frame = true;
        self.probe.begun.fetch_add(1, Ordering::AcqRel);
        Ok(true)
    }

    fn present(&mut self) -> Result<()> {
        self.probe.check_thread();
        if std::mem::take(&mut self.in_frame) {
            self.probe.presented.fetch_add(1, Ordering::AcqRel);
        }
        Ok(())
    }

    fn set_clear_color(&mut self, rgba: [f64; 4]) {
        self.clear = rgba;
    }

    fn release(&mut self) {
        self.probe.check_thread();
        self.in_frame = false;
        self.probe.released.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_frames_and_presents() {
        let mut gfx = HeadlessGraphics::new(64, 32);
        let probe = gfx.probe();
        gfx.attach().unwrap();

        for _ in 0..3 {
            assert!(gfx.begin_frame().unwrap());
            gfx.present().unwrap();
        }
        // Present without a frame is a no-op.
        gfx.present().unwrap();

        assert_eq!(probe.frames_begun(), 3);
        assert_eq!(probe.frames_presented(), 3);
        assert!(!probe.foreign_access());
    }

    #[test]
    fn zero_size_skips_frame() {
        let mut gfx = HeadlessGraphics::new(64, 32);
        gfx.resize(0, 32);
        assert!(!gfx.begin_frame().unwrap());
    }

    #[test]
    fn failure_injection() {
        let mut gfx = HeadlessGraphics::new(8, 8).failing_at(2);
        assert!(gfx.begin_frame().is_ok());
        assert!(gfx.begin_frame().is_ok());
        assert!(gfx.begin_frame().is_err());
    }

    #[test]
    fn access_from_another_thread_is_flagged() {
        let mut gfx = HeadlessGraphics::new(8, 8);
        let probe = gfx.probe();
        std::thread::spawn(move || {
            gfx.attach().unwrap();
            gfx
        })
        .join()
        .map(|mut gfx| gfx.resize(4, 4))
        .unwrap();
        assert!(probe.foreign_access());
    }
}
