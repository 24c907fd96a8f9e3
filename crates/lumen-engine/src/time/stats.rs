use std::fmt;

/// Frame statistics published at each stats refresh.
///
/// Frame times are in microseconds. `frame_rate` is the number of frames
/// completed during the last refresh window divided by the window length.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub frame_rate: f64,
    pub avg_us: u64,
    pub min_us: u64,
    pub max_us: u64,
}

impl FrameStats {
    /// Telemetry line, e.g. `FPS(60) SPF(Avg: 812 us, Min: 640 us, Max: 1203 us)`.
    pub fn telemetry(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FPS({:.0}) SPF(Avg: {} us, Min: {} us, Max: {} us)",
            self.frame_rate, self.avg_us, self.min_us, self.max_us
        )
    }
}
