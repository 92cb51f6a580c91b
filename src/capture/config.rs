//! Capture session configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::image_pipeline::ConversionConfig;

/// Sensor subwindow requested for every exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FrameRegion {
    /// Left-most pixel
    pub x0: u32,
    /// Top-most pixel
    pub y0: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for FrameRegion {
    fn default() -> Self {
        Self {
            x0: 880,
            y0: 0,
            width: 2180,
            height: 2180,
        }
    }
}

impl FrameRegion {
    /// An even origin keeps the subframe on the sensor's mosaic phase.
    pub fn is_bayer_aligned(&self) -> bool {
        self.x0 % 2 == 0 && self.y0 % 2 == 0
    }

    pub fn log_alignment_warnings(&self) {
        if self.x0 % 2 != 0 {
            warn!(x0 = self.x0, "Left-most pixel is not divisible by 2, the Bayer phase of the subframe shifts");
        }
        if self.y0 % 2 != 0 {
            warn!(y0 = self.y0, "Top-most pixel is not divisible by 2, the Bayer phase of the subframe shifts");
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            warn!(
                width = self.width,
                height = self.height,
                "Odd frame size, delivered frames cannot be debayered"
            );
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid exposure time: {0}s")]
    InvalidExposure(f64),
    #[error("invalid frame region: {0}x{1}")]
    InvalidRegion(u32, u32),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Settings of one unattended capture run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Exposure time requested for every frame
    pub exposure_seconds: f64,
    pub region: FrameRegion,
    /// Store the delivered FITS bytes untouched instead of converting them
    pub raw: bool,
    /// Reuse one output file name (`frame.<ext>`) instead of a
    /// timestamped name per exposure
    pub override_output: bool,
    /// Keep the raw bytes of frames that fail conversion
    pub raw_fallback: bool,
    pub output_dir: PathBuf,
    pub conversion: ConversionConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            exposure_seconds: 1.0,
            region: FrameRegion::default(),
            raw: false,
            override_output: false,
            raw_fallback: true,
            output_dir: PathBuf::from("images"),
            conversion: ConversionConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.exposure_seconds.is_finite() || self.exposure_seconds <= 0.0 {
            return Err(ConfigError::InvalidExposure(self.exposure_seconds));
        }
        if self.region.width == 0 || self.region.height == 0 {
            return Err(ConfigError::InvalidRegion(self.region.width, self.region.height));
        }
        Ok(())
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: SessionConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::{DebayerStrategy, OutputFormat};

    #[test]
    fn test_default_config_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.region.is_bayer_aligned());
    }

    #[test]
    fn test_invalid_exposure() {
        let config = SessionConfig {
            exposure_seconds: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidExposure(_))));

        let config = SessionConfig {
            exposure_seconds: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidExposure(_))));
    }

    #[test]
    fn test_zero_region_invalid() {
        let mut config = SessionConfig::default();
        config.region.height = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRegion(2180, 0))));
    }

    #[test]
    fn test_odd_origin_not_aligned() {
        let region = FrameRegion { x0: 841, ..Default::default() };
        assert!(!region.is_bayer_aligned());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(
            &path,
            r#"
            exposure_seconds = 0.5
            override_output = true
            output_dir = "/tmp/frames"

            [region]
            x0 = 0
            y0 = 0
            width = 640
            height = 480

            [conversion]
            strategy = "interpolate"
            output_format = "tiff"
            "#,
        )
        .unwrap();

        let config = SessionConfig::from_file(&path).unwrap();
        assert_eq!(config.exposure_seconds, 0.5);
        assert!(config.override_output);
        assert!(!config.raw);
        assert!(config.raw_fallback);
        assert_eq!(config.region.width, 640);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/frames"));
        assert_eq!(config.conversion.strategy, DebayerStrategy::Interpolate);
        assert_eq!(config.conversion.output_format, OutputFormat::Tiff);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "exposure_seconds = -1.0\n").unwrap();

        assert!(matches!(
            SessionConfig::from_file(&path),
            Err(ConfigError::InvalidExposure(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SessionConfig::from_file("/nonexistent/session.toml"),
            Err(ConfigError::FileReadError(_))
        ));
    }
}
