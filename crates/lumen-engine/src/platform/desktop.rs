use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{
    ElementState, Ime, MouseButton as WinitMouseButton, MouseScrollDelta,
    WindowEvent as WinitWindowEvent,
};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::core::DisplayConfig;
use crate::device::{GpuInit, WgpuGraphics};
use crate::event::{event_queue, EventSink, EventSource, QueueSource, WindowEvent};
use crate::input::{ButtonState, InputEvent, Key, Modifiers, MouseButton, WheelDelta};

use super::{ControllerPoller, Platform, PlatformControl};

const WINDOW_CREATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Desktop platform backed by a winit event loop and a wgpu surface.
///
/// The event loop is pumped from the owner thread with a zero timeout, so
/// input polling never blocks the main loop.
pub struct WinitPlatform {
    event_loop: EventLoop<()>,
    state: WinitState,
    source: Option<QueueSource>,
    gpu_init: GpuInit,
    controllers: Vec<Box<dyn ControllerPoller>>,
}

impl WinitPlatform {
    pub fn new() -> Result<Self> {
        Self::with_gpu_init(GpuInit::default())
    }

    pub fn with_gpu_init(gpu_init: GpuInit) -> Result<Self> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        event_loop.set_control_flow(ControlFlow::Poll);
        let (sink, source) = event_queue("winit");
        Ok(Self {
            event_loop,
            state: WinitState::new(sink),
            source: Some(source),
            gpu_init,
            controllers: Vec::new(),
        })
    }

    pub fn with_controller(mut self, poller: impl ControllerPoller + 'static) -> Self {
        self.controllers.push(Box::new(poller));
        self
    }

    /// The window, once graphics have been created.
    pub fn window(&self) -> Option<&Arc<Window>> {
        self.state.window.as_ref()
    }

    fn pump(&mut self, timeout: Duration) -> PumpStatus {
        self.event_loop
            .pump_app_events(Some(timeout), &mut self.state)
    }
}

impl Platform for WinitPlatform {
    type Graphics = WgpuGraphics;

    fn create_graphics(&mut self, title: &str, display: &DisplayConfig) -> Result<WgpuGraphics> {
        let (w, h) = display.physical_size();
        self.state.pixel_scale = (display.pixel_scale_x, display.pixel_scale_y);
        self.state.requested = Some(
            Window::default_attributes()
                .with_title(title)
                .with_inner_size(PhysicalSize::new(w, h)),
        );

        let deadline = Instant::now() + WINDOW_CREATE_TIMEOUT;
        let window = loop {
            if let Some(err) = self.state.error.take() {
                return Err(err);
            }
            if let Some(window) = &self.state.window {
                break Arc::clone(window);
            }
            if Instant::now() >= deadline {
                bail!("timed out waiting for the window");
            }
            if let PumpStatus::Exit(code) = self.pump(Duration::from_millis(16)) {
                bail!("event loop exited with code {code} before the window was created");
            }
        };

        WgpuGraphics::new(window, self.gpu_init.clone())
    }

    fn event_sources(&mut self) -> Vec<Box<dyn EventSource>> {
        self.source
            .take()
            .map(|s| Box::new(s) as Box<dyn EventSource>)
            .into_iter()
            .collect()
    }

    fn poll_input(&mut self) -> Result<PlatformControl> {
        if let PumpStatus::Exit(code) = self.pump(Duration::ZERO) {
            log::info!("winit event loop exited with code {code}");
            return Ok(PlatformControl::Exit);
        }
        if let Some(err) = self.state.error.take() {
            return Err(err);
        }
        if self.state.close_requested {
            return Ok(PlatformControl::Exit);
        }
        Ok(PlatformControl::Continue)
    }

    fn poll_controllers(&mut self) {
        for poller in &mut self.controllers {
            poller.poll(&self.state.sink);
        }
    }

    fn shutdown(&mut self) {
        self.state.window = None;
    }
}

/// Event-loop handler. Translates winit events into engine events.
struct WinitState {
    sink: EventSink,
    requested: Option<WindowAttributes>,
    window: Option<Arc<Window>>,
    pixel_scale: (f32, f32),
    modifiers: Modifiers,
    pointer: (f32, f32),
    close_requested: bool,
    error: Option<anyhow::Error>,
}

impl WinitState {
    fn new(sink: EventSink) -> Self {
        Self {
            sink,
            requested: None,
            window: None,
            pixel_scale: (1.0, 1.0),
            modifiers: Modifiers::default(),
            pointer: (0.0, 0.0),
            close_requested: false,
            error: None,
        }
    }

    fn create_pending(&mut self, event_loop: &ActiveEventLoop) {
        let Some(attrs) = self.requested.take() else {
            return;
        };
        match event_loop.create_window(attrs) {
            Ok(window) => {
                log::info!("window created: {:?}", window.inner_size());
                self.window = Some(Arc::new(window));
            }
            Err(e) => self.error = Some(anyhow!(e).context("failed to create window")),
        }
    }

    fn to_logical(&self, pos: PhysicalPosition<f64>) -> (f32, f32) {
        (
            pos.x as f32 / self.pixel_scale.0,
            pos.y as f32 / self.pixel_scale.1,
        )
    }

    fn translate(&mut self, event: &WinitWindowEvent) -> Option<crate::event::EngineEvent> {
        let ev = match event {
            WinitWindowEvent::Resized(size) => WindowEvent::Resized {
                width: size.width,
                height: size.height,
            }
            .into(),
            WinitWindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                WindowEvent::ScaleFactorChanged(*scale_factor).into()
            }
            WinitWindowEvent::Moved(pos) => WindowEvent::Moved { x: pos.x, y: pos.y }.into(),
            WinitWindowEvent::Focused(f) => WindowEvent::Focused(*f).into(),
            WinitWindowEvent::Occluded(o) => WindowEvent::Occluded(*o).into(),
            WinitWindowEvent::CloseRequested => WindowEvent::CloseRequested.into(),
            _ => return self.translate_input(event).map(Into::into),
        };
        Some(ev)
    }

    fn translate_input(&mut self, event: &WinitWindowEvent) -> Option<InputEvent> {
        match event {
            WinitWindowEvent::ModifiersChanged(m) => {
                self.modifiers = map_modifiers(m.state());
                Some(InputEvent::ModifiersChanged(self.modifiers))
            }

            WinitWindowEvent::CursorLeft { .. } => Some(InputEvent::PointerLeft),

            WinitWindowEvent::CursorMoved { position, .. } => {
                let (x, y) = self.to_logical(*position);
                self.pointer = (x, y);
                Some(InputEvent::PointerMoved { x, y })
            }

            WinitWindowEvent::MouseInput { state, button, .. } => {
                Some(InputEvent::PointerButton {
                    button: map_mouse_button(*button),
                    state: map_state(*state),
                    x: self.pointer.0,
                    y: self.pointer.1,
                    modifiers: self.modifiers,
                })
            }

            WinitWindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => WheelDelta::Line { x: *x, y: *y },
                    MouseScrollDelta::PixelDelta(p) => {
                        let (x, y) = self.to_logical(*p);
                        WheelDelta::Pixel { x, y }
                    }
                };
                Some(InputEvent::Wheel {
                    delta,
                    modifiers: self.modifiers,
                })
            }

            WinitWindowEvent::KeyboardInput { event, .. } => Some(InputEvent::Key {
                key: map_key(event.physical_key),
                state: map_state(event.state),
                modifiers: self.modifiers,
                repeat: event.repeat,
            }),

            WinitWindowEvent::Ime(Ime::Commit(text)) if !text.is_empty() => {
                Some(InputEvent::Text(text.clone()))
            }

            _ => None,
        }
    }
}

impl ApplicationHandler for WinitState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn window_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WinitWindowEvent,
    ) {
        if self.window.as_ref().map(|w| w.id()) != Some(window_id) {
            return;
        }
        if matches!(event, WinitWindowEvent::CloseRequested) {
            log::info!("window close requested");
            self.close_requested = true;
        }
        if let Some(ev) = self.translate(&event) {
            self.sink.push(ev);
        }
    }
}

fn map_state(s: ElementState) -> ButtonState {
    match s {
        ElementState::Pressed => ButtonState::Pressed,
        ElementState::Released => ButtonState::Released,
    }
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(pk: PhysicalKey) -> Key {
    let PhysicalKey::Code(code) = pk else {
        return Key::Unknown(0);
    };
    match code {
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::Tab => Key::Tab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Space => Key::Space,

        KeyCode::Insert => Key::Insert,
        KeyCode::Delete => Key::Delete,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,

        KeyCode::ArrowUp => Key::ArrowUp,
        KeyCode::ArrowDown => Key::ArrowDown,
        KeyCode::ArrowLeft => Key::ArrowLeft,
        KeyCode::ArrowRight => Key::ArrowRight,

        KeyCode::ShiftLeft | KeyCode::ShiftRight => Key::Shift,
        KeyCode::ControlLeft | KeyCode::ControlRight => Key::Control,
        KeyCode::AltLeft | KeyCode::AltRight => Key::Alt,
        KeyCode::SuperLeft | KeyCode::SuperRight => Key::Meta,

        KeyCode::KeyA => Key::A,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyC => Key::C,
        KeyCode::KeyD => Key::D,
        KeyCode::KeyE => Key::E,
        KeyCode::KeyF => Key::F,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyH => Key::H,
        KeyCode::KeyI => Key::I,
        KeyCode::KeyJ => Key::J,
        KeyCode::KeyK => Key::K,
        KeyCode::KeyL => Key::L,
        KeyCode::KeyM => Key::M,
        KeyCode::KeyN => Key::N,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::KeyQ => Key::Q,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyT => Key::T,
        KeyCode::KeyU => Key::U,
        KeyCode::KeyV => Key::V,
        KeyCode::KeyW => Key::W,
        KeyCode::KeyX => Key::X,
        KeyCode::KeyY => Key::Y,
        KeyCode::KeyZ => Key::Z,

        KeyCode::Digit0 | KeyCode::Numpad0 => Key::Digit0,
        KeyCode::Digit1 | KeyCode::Numpad1 => Key::Digit1,
        KeyCode::Digit2 | KeyCode::Numpad2 => Key::Digit2,
        KeyCode::Digit3 | KeyCode::Numpad3 => Key::Digit3,
        KeyCode::Digit4 | KeyCode::Numpad4 => Key::Digit4,
        KeyCode::Digit5 | KeyCode::Numpad5 => Key::Digit5,
        KeyCode::Digit6 | KeyCode::Numpad6 => Key::Digit6,
        KeyCode::Digit7 | KeyCode::Numpad7 => Key::Digit7,
        KeyCode::Digit8 | KeyCode::Numpad8 => Key::Digit8,
        KeyCode::Digit9 | KeyCode::Numpad9 => Key::Digit9,

        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::F3 => Key::F3,
        KeyCode::F4 => Key::F4,
        KeyCode::F5 => Key::F5,
        KeyCode::F6 => Key::F6,
        KeyCode::F7 => Key::F7,
        KeyCode::F8 => Key::F8,
        KeyCode::F9 => Key::F9,
        KeyCode::F10 => Key::F10,
        KeyCode::F11 => Key::F11,
        KeyCode::F12 => Key::F12,

        other => Key::Unknown(other as u32),
    }
}
