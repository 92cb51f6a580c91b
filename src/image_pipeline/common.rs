//! Common utilities module
//!
//! This module contains the error type and the conversion configuration
//! shared across the image pipeline.

pub mod error;
pub mod config;

pub use error::{ConversionError, Result};
pub use config::{ConversionConfig, ConversionConfigBuilder, OutputFormat, TiffCompression};
