use std::time::Instant;

use crate::input::InputEvent;

/// Window-level notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    /// New drawable size in physical pixels.
    Resized { width: u32, height: u32 },
    ScaleFactorChanged(f64),
    Moved { x: i32, y: i32 },
    Focused(bool),
    Occluded(bool),
    CloseRequested,
}

/// Game controller hot-plug and state changes.
///
/// `id` is stable for as long as the controller stays connected.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    Connected { id: usize, name: String },
    Disconnected { id: usize },
    Button { id: usize, code: u32, pressed: bool },
    Axis { id: usize, code: u32, value: f32 },
}

impl ControllerEvent {
    pub fn controller_id(&self) -> usize {
        match self {
            Self::Connected { id, .. }
            | Self::Disconnected { id }
            | Self::Button { id, .. }
            | Self::Axis { id, .. } => *id,
        }
    }
}

/// Anything a registered event source can report.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Input(InputEvent),
    Window(WindowEvent),
    Controller(ControllerEvent),
}

impl From<InputEvent> for EngineEvent {
    fn from(ev: InputEvent) -> Self {
        Self::Input(ev)
    }
}

impl From<WindowEvent> for EngineEvent {
    fn from(ev: WindowEvent) -> Self {
        Self::Window(ev)
    }
}

impl From<ControllerEvent> for EngineEvent {
    fn from(ev: ControllerEvent) -> Self {
        Self::Controller(ev)
    }
}

/// Category used to filter a snapshot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EventKind {
    Keyboard,
    Pointer,
    Wheel,
    Text,
    Window,
    Controller,
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Input(InputEvent::ModifiersChanged(_) | InputEvent::Key { .. }) => {
                EventKind::Keyboard
            }
            Self::Input(
                InputEvent::PointerMoved { .. }
                | InputEvent::PointerButton { .. }
                | InputEvent::PointerLeft,
            ) => EventKind::Pointer,
            Self::Input(InputEvent::Wheel { .. }) => EventKind::Wheel,
            Self::Input(InputEvent::Text(_)) => EventKind::Text,
            Self::Window(_) => EventKind::Window,
            Self::Controller(_) => EventKind::Controller,
        }
    }
}

/// An event as stored in a snapshot: stamped with the tick that collected it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    /// Render-loop tick number (starts at 1).
    pub tick: u64,
    /// Timestamp of that tick.
    pub stamp: Instant,
    pub event: EngineEvent,
}

impl TimedEvent {
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}
