/// Render geometry for one drawn tick, in logical pixels.
///
/// Logical size is the physical surface size divided by the configured pixel
/// scale on each axis.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Derives the viewport from a physical surface size and pixel scale.
    ///
    /// Non-positive scales fall back to 1.0.
    pub fn from_surface(physical: (u32, u32), scale_x: f32, scale_y: f32) -> Self {
        let sx = if scale_x > 0.0 && scale_x.is_finite() { scale_x } else { 1.0 };
        let sy = if scale_y > 0.0 && scale_y.is_finite() { scale_y } else { 1.0 };
        Self {
            width: physical.0 as f32 / sx,
            height: physical.1 as f32 / sy,
            scale_x: sx,
            scale_y: sy,
        }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Width over height, or 0 for a degenerate viewport.
    pub fn aspect(self) -> f32 {
        if self.is_valid() {
            self.width / self.height
        } else {
            0.0
        }
    }

    /// Physical pixel size covered by this viewport.
    pub fn physical(self) -> (u32, u32) {
        (
            (self.width * self.scale_x).round() as u32,
            (self.height * self.scale_y).round() as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_size_divides_by_scale() {
        let vp = Viewport::from_surface((1280, 720), 2.0, 2.0);
        assert_eq!(vp.width, 640.0);
        assert_eq!(vp.height, 360.0);
        assert_eq!(vp.physical(), (1280, 720));
    }

    #[test]
    fn bad_scale_falls_back_to_one() {
        let vp = Viewport::from_surface((100, 50), 0.0, f32::NAN);
        assert_eq!(vp, Viewport::new(100.0, 50.0));
        assert_eq!(vp.aspect(), 2.0);
    }

    #[test]
    fn zero_surface_is_invalid() {
        let vp = Viewport::from_surface((0, 720), 1.0, 1.0);
        assert!(!vp.is_valid());
        assert_eq!(vp.aspect(), 0.0);
    }
}
