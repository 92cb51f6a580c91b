//! Conversion configuration types

use serde::Deserialize;

use crate::image_pipeline::debayer::types::{DebayerStrategy, GreenSample, InterpolationMethod};
use crate::image_pipeline::raw::types::CfaPattern;

/// Encoded image format written by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// 8-bit RGB PNG (default)
    #[default]
    Png,
    /// 8-bit RGB TIFF
    Tiff,
}

impl OutputFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Tiff => "tiff",
        }
    }
}

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    #[default]
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

/// Configuration for raw frame to RGB conversion
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Decimate to half resolution or interpolate at full resolution
    pub strategy: DebayerStrategy,
    /// Interpolation kernel, only used by [`DebayerStrategy::Interpolate`]
    pub interpolation: InterpolationMethod,
    /// Which green sample of a cell feeds the G channel when decimating
    pub green: GreenSample,
    /// Forces the mosaic phase, ignoring whatever the container declares
    pub cfa: Option<CfaPattern>,
    /// Forces the sample bit depth, ignoring whatever the container declares
    pub bit_depth: Option<u32>,
    /// Encoded output format
    pub output_format: OutputFormat,
    /// Compression method, TIFF output only
    pub compression: TiffCompression,
    /// Predictor value for TIFF compression (2 for horizontal differencing)
    pub predictor: Option<u16>,
    /// Whether to validate frame dimensions before debayering
    pub validate_dimensions: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            strategy: DebayerStrategy::Decimate,
            interpolation: InterpolationMethod::Bilinear,
            green: GreenSample::First,
            cfa: None,
            bit_depth: None,
            output_format: OutputFormat::Png,
            compression: TiffCompression::None,
            predictor: None,
            validate_dimensions: true,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    strategy: Option<DebayerStrategy>,
    interpolation: Option<InterpolationMethod>,
    green: Option<GreenSample>,
    cfa: Option<Option<CfaPattern>>,
    bit_depth: Option<Option<u32>>,
    output_format: Option<OutputFormat>,
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    validate_dimensions: Option<bool>,
}

impl ConversionConfigBuilder {
    pub fn strategy(mut self, strategy: DebayerStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn interpolation(mut self, method: InterpolationMethod) -> Self {
        self.interpolation = Some(method);
        self
    }

    pub fn green(mut self, green: GreenSample) -> Self {
        self.green = Some(green);
        self
    }

    pub fn cfa(mut self, cfa: Option<CfaPattern>) -> Self {
        self.cfa = Some(cfa);
        self
    }

    pub fn bit_depth(mut self, bits: Option<u32>) -> Self {
        self.bit_depth = Some(bits);
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            strategy: self.strategy.unwrap_or(default.strategy),
            interpolation: self.interpolation.unwrap_or(default.interpolation),
            green: self.green.unwrap_or(default.green),
            cfa: self.cfa.unwrap_or(default.cfa),
            bit_depth: self.bit_depth.unwrap_or(default.bit_depth),
            output_format: self.output_format.unwrap_or(default.output_format),
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
        }
    }
}
