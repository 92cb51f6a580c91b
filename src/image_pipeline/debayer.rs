//! Debayering module for converting Bayer mosaic frames to 8-bit RGB
//!
//! Two strategies are available and must be picked explicitly:
//! [`DebayerStrategy::Decimate`] halves the resolution and takes one sample
//! per channel from each 2x2 cell, [`DebayerStrategy::Interpolate`] keeps the
//! resolution and interpolates the missing channels at every pixel.

pub mod decimate;
pub mod interpolate;
pub mod scale;
pub mod types;

use tracing::debug;

use crate::image_pipeline::common::config::ConversionConfig;
use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::raw::types::{CfaPattern, RawFrame};

pub use scale::BitDepthScale;
pub use types::{DebayerStrategy, DebayeredImage, GreenSample, InterpolationMethod};

/// Stateless raw frame to RGB converter.
///
/// Holds only its settings, so a single instance can be shared between
/// threads and reused for every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Debayerer {
    pub strategy: DebayerStrategy,
    pub interpolation: InterpolationMethod,
    pub green: GreenSample,
    /// Overrides the frame's declared phase
    pub cfa: Option<CfaPattern>,
    /// Overrides the frame's declared bit depth
    pub bit_depth: Option<u32>,
}

impl Debayerer {
    pub fn new(strategy: DebayerStrategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            strategy: config.strategy,
            interpolation: config.interpolation,
            green: config.green,
            cfa: config.cfa,
            bit_depth: config.bit_depth,
        }
    }

    /// Converts one frame.
    ///
    /// Fails with [`ConversionError::InvalidDimensions`] for an empty frame,
    /// with [`ConversionError::ShapeError`] when either dimension is odd or
    /// the sample count does not match them, and with
    /// [`ConversionError::BitDepthError`] when the bit depth is outside
    /// `1..=32`.
    pub fn process(&self, frame: &RawFrame) -> Result<DebayeredImage> {
        if frame.width == 0 || frame.height == 0 {
            return Err(ConversionError::InvalidDimensions(frame.width, frame.height));
        }
        if frame.width % 2 != 0 || frame.height % 2 != 0 || frame.data.len() != frame.pixel_count() {
            return Err(ConversionError::ShapeError {
                width: frame.width,
                height: frame.height,
            });
        }

        let bits = self.bit_depth.unwrap_or(frame.bits_per_sample);
        let scale = BitDepthScale::new(bits)?;
        let cfa = self.cfa.or(frame.cfa).unwrap_or_default();

        debug!(
            width = frame.width,
            height = frame.height,
            bits,
            %cfa,
            strategy = ?self.strategy,
            "Debayering frame"
        );

        match self.strategy {
            DebayerStrategy::Decimate => Ok(decimate::decimate(frame, cfa, self.green, scale)),
            DebayerStrategy::Interpolate => {
                interpolate::interpolate(frame, cfa, self.interpolation, scale)
            }
        }
    }
}
