//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Platforms translate native events into [`InputEvent`]s; the render loop
//! folds each tick's snapshot into an [`InputState`].

mod state;
mod types;

pub use state::InputState;
pub use types::{ButtonState, InputEvent, Key, Modifiers, MouseButton, WheelDelta};
