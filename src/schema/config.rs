//! Configuration types for APNG generation.

use serde::{Deserialize, Serialize};

/// Lowest accepted frame rate.
pub const MIN_FPS: u32 = 1;
/// Highest accepted frame rate.
pub const MAX_FPS: u32 = 60;
/// Quality at which quantization is skipped entirely.
pub const LOSSLESS_QUALITY: u8 = 100;

fn default_fps() -> u32 {
    15
}

fn default_quality() -> u8 {
    80
}

/// Top-level animation configuration.
///
/// Values normally arrive from a settings form or a JSON file; call
/// [`AnimationConfig::validate`] before using them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Playback rate in frames per second (1-60).
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Number of times the animation plays. 0 loops forever.
    #[serde(default)]
    pub loops: u32,
    /// Color precision to retain (0-100). 100 is lossless.
    #[serde(default = "default_quality")]
    pub quality: u8,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            loops: 0,
            quality: default_quality(),
        }
    }
}

impl AnimationConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_FPS..=MAX_FPS).contains(&self.fps) {
            return Err(ConfigError::InvalidFrameRate(self.fps));
        }
        if self.quality > LOSSLESS_QUALITY {
            return Err(ConfigError::InvalidQuality(self.quality));
        }
        Ok(())
    }

    /// Display duration applied to every frame, `round(1000 / fps)`.
    ///
    /// Every frame shares this delay; per-frame timing is not supported.
    pub fn frame_delay_ms(&self) -> u32 {
        let fps = self.fps.max(MIN_FPS);
        (1000 + fps / 2) / fps
    }

    /// Length of one pass through `frame_count` frames.
    pub fn total_duration_ms(&self, frame_count: usize) -> u64 {
        self.frame_delay_ms() as u64 * frame_count as u64
    }

    /// True when the animation repeats forever.
    pub fn is_infinite(&self) -> bool {
        self.loops == 0
    }

    /// True when quantization leaves pixels untouched.
    pub fn is_lossless(&self) -> bool {
        self.quality >= LOSSLESS_QUALITY
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Frame rate must be between 1 and 60 fps, got {0}")]
    InvalidFrameRate(u32),
    #[error("Quality must be between 0 and 100, got {0}")]
    InvalidQuality(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnimationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fps, 15);
        assert_eq!(config.loops, 0);
        assert_eq!(config.quality, 80);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let config = AnimationConfig {
            fps: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrameRate(0)));

        let config = AnimationConfig {
            fps: 61,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidFrameRate(61)));

        let config = AnimationConfig {
            quality: 101,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidQuality(101)));
    }

    #[test]
    fn test_frame_delay_rounds_to_nearest() {
        let delay = |fps| AnimationConfig { fps, ..Default::default() }.frame_delay_ms();
        assert_eq!(delay(10), 100);
        assert_eq!(delay(15), 67); // 66.67
        assert_eq!(delay(24), 42); // 41.67
        assert_eq!(delay(30), 33); // 33.33
        assert_eq!(delay(60), 17); // 16.67
        assert_eq!(delay(1), 1000);
    }

    #[test]
    fn test_total_duration() {
        let config = AnimationConfig {
            fps: 10,
            ..Default::default()
        };
        assert_eq!(config.total_duration_ms(25), 2500);
    }

    #[test]
    fn test_json_defaults_fill_missing_fields() {
        let config: AnimationConfig = serde_json::from_str(r#"{"loops": 3}"#).unwrap();
        assert_eq!(config.fps, 15);
        assert_eq!(config.loops, 3);
        assert_eq!(config.quality, 80);
        assert!(!config.is_infinite());
    }
}
