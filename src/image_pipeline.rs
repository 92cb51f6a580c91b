//! Image processing pipeline module
//!
//! Raw sensor frames go through four stages: a reader decodes the capture
//! container, the frame is validated, the debayerer turns the Bayer mosaic
//! into 8-bit RGB, and a writer encodes the result.

pub mod raw;
pub mod debayer;
pub mod output;
pub mod conversions;
pub mod common;

pub use common::{
    ConversionConfig,
    ConversionConfigBuilder,
    ConversionError,
    OutputFormat,
    Result,
    TiffCompression,
};

pub use raw::{
    CfaPattern,
    FitsReader,
    RawFrame,
    RawFrameReader,
    RawLoaderReader,
    encode_fits,
};

pub use debayer::{
    BitDepthScale,
    DebayerStrategy,
    DebayeredImage,
    Debayerer,
    GreenSample,
    InterpolationMethod,
};

pub use output::{
    FormatWriter,
    ImageWriter,
    PngWriter,
    StandardTiffWriter,
};

pub use conversions::RawToRgbPipeline;
