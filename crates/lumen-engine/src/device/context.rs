use anyhow::Result;

/// A graphics context owned by the render thread.
///
/// The platform creates the context on the owner thread. [`detach`] runs there
/// once, right before the context moves to the render thread; every other
/// method runs only on the render thread.
///
/// [`detach`]: GraphicsContext::detach
pub trait GraphicsContext: Send + 'static {
    /// Releases owner-thread bindings (e.g. a current GL context).
    fn detach(&mut self) -> Result<()> {
        Ok(())
    }

    /// First call on the render thread.
    fn attach(&mut self) -> Result<()> {
        Ok(())
    }

    /// Drawable size in physical pixels.
    fn size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32);

    /// Acquires the next frame. `Ok(false)` skips drawing for this tick.
    fn begin_frame(&mut self) -> Result<bool>;

    /// Submits and presents the frame acquired by `begin_frame`.
    fn present(&mut self) -> Result<()>;

    /// Background color used by the next acquired frame.
    fn set_clear_color(&mut self, rgba: [f64; 4]) {
        let _ = rgba;
    }

    /// Last call on the render thread.
    fn release(&mut self) {}
}
