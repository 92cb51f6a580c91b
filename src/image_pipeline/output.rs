//! Image writing module
//!
//! Encodes debayered frames as 8-bit RGB PNG or TIFF files.

mod writer;
mod png_writer;
mod standard_tiff_writer;

pub use writer::ImageWriter;
pub use png_writer::PngWriter;
pub use standard_tiff_writer::StandardTiffWriter;

use crate::image_pipeline::common::config::{ConversionConfig, OutputFormat};
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::debayer::types::DebayeredImage;
use std::io::Write;

/// Writer picked at runtime from [`ConversionConfig::output_format`]
pub enum FormatWriter {
    Png(PngWriter),
    Tiff(StandardTiffWriter),
}

impl FormatWriter {
    pub fn for_format(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Png => FormatWriter::Png(PngWriter),
            OutputFormat::Tiff => FormatWriter::Tiff(StandardTiffWriter),
        }
    }
}

impl ImageWriter for FormatWriter {
    fn write_rgb(&self, image: &DebayeredImage, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        match self {
            FormatWriter::Png(writer) => writer.write_rgb(image, output, config),
            FormatWriter::Tiff(writer) => writer.write_rgb(image, output, config),
        }
    }
}
