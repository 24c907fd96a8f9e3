//! Lumen engine crate.
//!
//! Runtime core of a real-time visual engine: a paced render loop on its own
//! thread, an owner thread that polls the platform and runs delegated work,
//! and per-tick event aggregation feeding the draw hook.

pub mod coords;
pub mod core;
pub mod delegate;
pub mod device;
pub mod event;
pub mod input;
pub mod logging;
pub mod platform;
pub mod time;

pub use crate::core::{
    App, DisplayConfig, Engine, EngineConfig, EngineError, FrameCtx, LifecycleState, StartupError,
};
pub use crate::delegate::{DelegateError, Delegator};
