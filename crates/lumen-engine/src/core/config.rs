use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ConfigError, StartupError};

/// Screen size and pixel scale. Every field must be finite and > 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub pixel_scale_x: f32,
    pub pixel_scale_y: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            pixel_scale_x: 1.0,
            pixel_scale_y: 1.0,
        }
    }
}

impl DisplayConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_pixel_scale(mut self, x: f32, y: f32) -> Self {
        self.pixel_scale_x = x;
        self.pixel_scale_y = y;
        self
    }

    /// Physical surface size implied by the logical size and pixel scale.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width as f32 * self.pixel_scale_x).round() as u32,
            (self.height as f32 * self.pixel_scale_y).round() as u32,
        )
    }

    pub fn validate(&self) -> Result<(), StartupError> {
        let dims = [("width", self.width as f64), ("height", self.height as f64)];
        let scales = [
            ("pixel_scale_x", self.pixel_scale_x as f64),
            ("pixel_scale_y", self.pixel_scale_y as f64),
        ];
        for (field, value) in dims.into_iter().chain(scales) {
            if !(value.is_finite() && value > 0.0) {
                return Err(StartupError::InvalidDisplay { field, value });
            }
        }
        Ok(())
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub title: String,
    pub display: DisplayConfig,
    /// Frames per second; 0 = uncapped.
    pub target_fps: u32,
    /// Statistics refreshes per second.
    pub stats_frequency: u32,
    /// How long a notification stays visible.
    pub notification_secs: f64,
    /// When false no graphics context is acquired and no render thread runs.
    pub rendering: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            display: DisplayConfig::default(),
            target_fps: 60,
            stats_frequency: 4,
            notification_secs: 2.0,
            rendering: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    pub fn with_stats_frequency(mut self, hz: u32) -> Self {
        self.stats_frequency = hz;
        self
    }

    pub fn with_notification_secs(mut self, secs: f64) -> Self {
        self.notification_secs = secs;
        self
    }

    pub fn with_rendering(mut self, enabled: bool) -> Self {
        self.rendering = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), StartupError> {
        self.display.validate()?;
        if self.stats_frequency == 0 {
            return Err(StartupError::InvalidConfig(
                "stats_frequency must be > 0".into(),
            ));
        }
        if !(self.notification_secs.is_finite() && self.notification_secs >= 0.0) {
            return Err(StartupError::InvalidConfig(format!(
                "notification_secs must be finite and >= 0, got {}",
                self.notification_secs
            )));
        }
        Ok(())
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies `LUMEN_TARGET_FPS`, `LUMEN_STATS_FREQUENCY` and
    /// `LUMEN_RENDERING` when set and parseable.
    pub fn apply_env_overrides(&mut self) {
        if let Some(fps) = env_parse("LUMEN_TARGET_FPS") {
            self.target_fps = fps;
        }
        if let Some(hz) = env_parse("LUMEN_STATS_FREQUENCY") {
            self.stats_frequency = hz;
        }
        if let Some(on) = env_parse("LUMEN_RENDERING") {
            self.rendering = on;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring unparseable {key}={raw:?}");
            None
        }
    }
}
