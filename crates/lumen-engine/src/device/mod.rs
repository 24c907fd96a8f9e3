//! Graphics contexts.
//!
//! A [`GraphicsContext`] is created by the platform on the owner thread and
//! then confined to the render thread until it is released.

mod context;
mod gpu;
mod headless;
mod init;
mod surface;

pub use context::GraphicsContext;
pub use gpu::{GpuFrame, WgpuGraphics};
pub use headless::{GraphicsProbe, HeadlessGraphics};
pub use init::GpuInit;
pub use surface::SurfaceErrorAction;
