//! Engine core: configuration, lifecycle, client contract and the two loops.
//!
//! The owner thread runs [`Engine::start`], which spawns the render thread and
//! then polls the platform and drains delegated work until the engine stops.

mod app;
mod config;
mod ctx;
mod engine;
mod error;
mod lifecycle;
mod main_loop;
mod notify;
mod render_loop;

pub use app::App;
pub use config::{DisplayConfig, EngineConfig};
pub use ctx::FrameCtx;
pub use engine::Engine;
pub use error::{ConfigError, EngineError, RenderLoopError, StartupError};
pub use lifecycle::LifecycleState;
