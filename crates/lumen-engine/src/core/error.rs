use thiserror::Error;

use super::LifecycleState;

/// Raised by `Engine::start` before any thread is spawned.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("engine already started (state: {0})")]
    AlreadyStarted(LifecycleState),

    #[error("another engine instance is running in this process")]
    InstanceActive,

    #[error("delegator is already bound to another owner thread")]
    OwnerBound,

    #[error("invalid display {field}: {value} (must be finite and > 0)")]
    InvalidDisplay { field: &'static str, value: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("graphics context acquisition failed")]
    Graphics(#[source] anyhow::Error),

    #[error("setup hook failed")]
    Setup(#[source] anyhow::Error),

    #[error("failed to spawn render thread")]
    SpawnRenderThread(#[source] std::io::Error),
}

/// Fatal to the render thread; triggers orderly shutdown of both loops.
#[derive(Debug, Error)]
pub enum RenderLoopError {
    #[error("draw hook failed")]
    Draw(#[source] anyhow::Error),

    #[error("graphics call failed")]
    Graphics(#[source] anyhow::Error),

    #[error("render loop panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error(transparent)]
    Render(#[from] RenderLoopError),

    #[error("platform failure")]
    Platform(#[source] anyhow::Error),
}

impl EngineError {
    pub fn is_startup(&self) -> bool {
        matches!(self, Self::Startup(_))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(String),
}

/// Formats an error and its sources as `outer: inner: ...`.
pub(crate) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}
