use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::core::DisplayConfig;
use crate::device::{GraphicsProbe, HeadlessGraphics};
use crate::event::{event_queue, EventSink, EventSource, QueueSource};

use super::{ControllerPoller, Platform, PlatformControl};

/// Requests a platform-driven exit from any thread.
#[derive(Debug, Clone)]
pub struct ExitHandle(Arc<AtomicBool>);

impl ExitHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Platform without an OS window.
///
/// Events are injected through [`sink`](Self::sink); the graphics context is
/// a [`HeadlessGraphics`] reporting into [`probe`](Self::probe).
pub struct HeadlessPlatform {
    sink: EventSink,
    source: Option<QueueSource>,
    exit: Arc<AtomicBool>,
    controllers: Vec<Box<dyn ControllerPoller>>,
    probe: Arc<GraphicsProbe>,
    graphics_fail_at: Option<u64>,
    refuse_graphics: bool,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        let (sink, source) = event_queue("headless");
        Self {
            sink,
            source: Some(source),
            exit: Arc::new(AtomicBool::new(false)),
            controllers: Vec::new(),
            probe: Arc::new(GraphicsProbe::default()),
            graphics_fail_at: None,
            refuse_graphics: false,
        }
    }

    pub fn with_controller(mut self, poller: impl ControllerPoller + 'static) -> Self {
        self.controllers.push(Box::new(poller));
        self
    }

    /// The created graphics context fails once `frame` frames have begun.
    pub fn with_graphics_failure_at(mut self, frame: u64) -> Self {
        self.graphics_fail_at = Some(frame);
        self
    }

    /// Graphics context creation fails outright.
    pub fn without_graphics(mut self) -> Self {
        self.refuse_graphics = true;
        self
    }

    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    pub fn exit_handle(&self) -> ExitHandle {
        ExitHandle(Arc::clone(&self.exit))
    }

    pub fn probe(&self) -> Arc<GraphicsProbe> {
        Arc::clone(&self.probe)
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for HeadlessPlatform {
    type Graphics = HeadlessGraphics;

    fn create_graphics(&mut self, title: &str, display: &DisplayConfig) -> Result<HeadlessGraphics> {
        if self.refuse_graphics {
            bail!("no graphics device available for {title:?}");
        }
        let (w, h) = display.physical_size();
        let mut gfx = HeadlessGraphics::new(w, h).with_probe(Arc::clone(&self.probe));
        if let Some(n) = self.graphics_fail_at {
            gfx = gfx.failing_at(n);
        }
        log::debug!("headless graphics {w}x{h} for {title:?}");
        Ok(gfx)
    }

    fn event_sources(&mut self) -> Vec<Box<dyn EventSource>> {
        self.source
            .take()
            .map(|s| Box::new(s) as Box<dyn EventSource>)
            .into_iter()
            .collect()
    }

    fn poll_input(&mut self) -> Result<PlatformControl> {
        if self.exit.load(Ordering::Acquire) {
            Ok(PlatformControl::Exit)
        } else {
            Ok(PlatformControl::Continue)
        }
    }

    fn poll_controllers(&mut self) {
        for poller in &mut self.controllers {
            poller.poll(&self.sink);
        }
    }
}
