use std::collections::HashSet;

use crate::event::{EngineEvent, EventSnapshot, WindowEvent};

use super::types::{ButtonState, InputEvent, Key, Modifiers, MouseButton};

/// Held input state, advanced once per drawn tick from the tick's snapshot.
///
/// The persistent part (held keys/buttons, pointer, modifiers, focus) carries
/// across ticks. The transition sets only describe the most recent snapshot.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    /// Pointer position in logical pixels.
    pub pointer_pos: Option<(f32, f32)>,

    pub keys_down: HashSet<Key>,
    pub buttons_down: HashSet<MouseButton>,

    pub keys_pressed: HashSet<Key>,
    pub keys_released: HashSet<Key>,
    pub buttons_pressed: HashSet<MouseButton>,
    pub buttons_released: HashSet<MouseButton>,
    /// Text committed during the tick, concatenated.
    pub text: String,
}

impl InputState {
    /// Clears per-tick transitions and folds in every event of `snapshot`.
    pub fn apply_snapshot(&mut self, snapshot: &EventSnapshot) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.text.clear();

        for timed in snapshot.iter() {
            match &timed.event {
                EngineEvent::Input(ev) => self.apply_input(ev),
                EngineEvent::Window(WindowEvent::Focused(f)) => self.set_focus(*f),
                _ => {}
            }
        }
    }

    fn set_focus(&mut self, focused: bool) {
        self.focused = focused;
        if !focused {
            // Releases may never arrive once focus is gone.
            self.keys_down.clear();
            self.buttons_down.clear();
        }
    }

    fn apply_input(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::ModifiersChanged(m) => self.modifiers = *m,

            InputEvent::Key {
                key,
                state,
                modifiers,
                ..
            } => {
                self.modifiers = *modifiers;
                match state {
                    ButtonState::Pressed => {
                        if self.keys_down.insert(*key) {
                            self.keys_pressed.insert(*key);
                        }
                    }
                    ButtonState::Released => {
                        if self.keys_down.remove(key) {
                            self.keys_released.insert(*key);
                        }
                    }
                }
            }

            InputEvent::PointerMoved { x, y } => self.pointer_pos = Some((*x, *y)),

            InputEvent::PointerLeft => self.pointer_pos = None,

            InputEvent::PointerButton {
                button,
                state,
                x,
                y,
                modifiers,
            } => {
                self.pointer_pos = Some((*x, *y));
                self.modifiers = *modifiers;
                match state {
                    ButtonState::Pressed => {
                        if self.buttons_down.insert(*button) {
                            self.buttons_pressed.insert(*button);
                        }
                    }
                    ButtonState::Released => {
                        if self.buttons_down.remove(button) {
                            self.buttons_released.insert(*button);
                        }
                    }
                }
            }

            InputEvent::Wheel { modifiers, .. } => self.modifiers = *modifiers,

            InputEvent::Text(t) => self.text.push_str(t),
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{event_queue, EventAggregator};
    use std::time::Instant;

    fn key(k: Key, state: ButtonState) -> InputEvent {
        InputEvent::Key {
            key: k,
            state,
            modifiers: Modifiers::default(),
            repeat: false,
        }
    }

    #[test]
    fn press_and_release_across_ticks() {
        let (sink, source) = event_queue("q");
        let mut agg = EventAggregator::new();
        agg.register(Box::new(source));
        let mut input = InputState::default();

        sink.push(key(Key::W, ButtonState::Pressed));
        input.apply_snapshot(agg.aggregate(Instant::now()));
        assert!(input.key_down(Key::W));
        assert!(input.key_pressed(Key::W));

        input.apply_snapshot(agg.aggregate(Instant::now()));
        assert!(input.key_down(Key::W));
        assert!(!input.key_pressed(Key::W));

        sink.push(key(Key::W, ButtonState::Released));
        input.apply_snapshot(agg.aggregate(Instant::now()));
        assert!(!input.key_down(Key::W));
        assert!(input.keys_released.contains(&Key::W));
    }

    #[test]
    fn focus_loss_clears_held_input() {
        let (sink, source) = event_queue("q");
        let mut agg = EventAggregator::new();
        agg.register(Box::new(source));
        let mut input = InputState::default();

        sink.push(key(Key::Space, ButtonState::Pressed));
        sink.push(InputEvent::PointerButton {
            button: MouseButton::Left,
            state: ButtonState::Pressed,
            x: 3.0,
            y: 4.0,
            modifiers: Modifiers::default(),
        });
        sink.push(WindowEvent::Focused(false));
        input.apply_snapshot(agg.aggregate(Instant::now()));

        assert!(input.keys_down.is_empty());
        assert!(input.buttons_down.is_empty());
        assert_eq!(input.pointer_pos, Some((3.0, 4.0)));
    }

    #[test]
    fn text_is_per_tick() {
        let (sink, source) = event_queue("q");
        let mut agg = EventAggregator::new();
        agg.register(Box::new(source));
        let mut input = InputState::default();

        sink.push(InputEvent::Text("he".into()));
        sink.push(InputEvent::Text("llo".into()));
        input.apply_snapshot(agg.aggregate(Instant::now()));
        assert_eq!(input.text, "hello");

        input.apply_snapshot(agg.aggregate(Instant::now()));
        assert!(input.text.is_empty());
    }
}
