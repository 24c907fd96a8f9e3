//! Owner-thread platform integration.
//!
//! A [`Platform`] pumps OS input on the owner thread, creates the graphics
//! context handed to the render thread, and provides the event sources the
//! render thread aggregates each tick.

mod headless;
#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
mod desktop;

#[cfg(feature = "gamepad")]
mod gamepad;

use anyhow::Result;

use crate::core::DisplayConfig;
use crate::device::GraphicsContext;
use crate::event::{EventSink, EventSource};

pub use headless::{ExitHandle, HeadlessPlatform};
#[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
pub use desktop::WinitPlatform;

#[cfg(feature = "gamepad")]
pub use gamepad::GilrsControllers;

/// Result of one non-blocking input poll.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PlatformControl {
    Continue,
    /// The platform wants the engine to stop (e.g. the window was closed).
    Exit,
}

pub trait Platform {
    type Graphics: GraphicsContext;

    /// Creates the graphics context on the owner thread.
    fn create_graphics(&mut self, title: &str, display: &DisplayConfig)
    -> Result<Self::Graphics>;

    /// Sources registered with the render thread's aggregator. Called once
    /// per start.
    fn event_sources(&mut self) -> Vec<Box<dyn EventSource>>;

    /// Pumps OS input without blocking.
    fn poll_input(&mut self) -> Result<PlatformControl>;

    /// Polls auxiliary controllers for hot-plug and state changes.
    fn poll_controllers(&mut self) {}

    /// Called on the owner thread after both loops have stopped.
    fn shutdown(&mut self) {}
}

/// A controller backend polled from the owner thread.
pub trait ControllerPoller {
    fn name(&self) -> &str;

    /// Pushes every change observed since the previous call.
    fn poll(&mut self, sink: &EventSink);
}
