use anyhow::{anyhow, Result};
use gilrs::{EventType, Gilrs};

use crate::event::{ControllerEvent, EventSink};

use super::ControllerPoller;

/// Game controller poller backed by gilrs.
pub struct GilrsControllers {
    gilrs: Gilrs,
}

impl GilrsControllers {
    pub fn new() -> Result<Self> {
        let gilrs = Gilrs::new().map_err(|e| anyhow!("gilrs init failed: {e}"))?;
        for (id, pad) in gilrs.gamepads() {
            log::info!("controller {} present: {}", usize::from(id), pad.name());
        }
        Ok(Self { gilrs })
    }
}

impl ControllerPoller for GilrsControllers {
    fn name(&self) -> &str {
        "gilrs"
    }

    fn poll(&mut self, sink: &EventSink) {
        while let Some(ev) = self.gilrs.next_event() {
            let id = usize::from(ev.id);
            let out = match ev.event {
                EventType::Connected => {
                    let name = self.gilrs.gamepad(ev.id).name().to_string();
                    log::info!("controller {id} connected: {name}");
                    ControllerEvent::Connected { id, name }
                }
                EventType::Disconnected => {
                    log::info!("controller {id} disconnected");
                    ControllerEvent::Disconnected { id }
                }
                EventType::ButtonPressed(_, code) => ControllerEvent::Button {
                    id,
                    code: code.into_u32(),
                    pressed: true,
                },
                EventType::ButtonReleased(_, code) => ControllerEvent::Button {
                    id,
                    code: code.into_u32(),
                    pressed: false,
                },
                EventType::AxisChanged(_, value, code) => ControllerEvent::Axis {
                    id,
                    code: code.into_u32(),
                    value,
                },
                _ => continue,
            };
            sink.push(out);
        }
    }
}
