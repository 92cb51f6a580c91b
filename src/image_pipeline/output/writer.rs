use std::io::Write;
use crate::image_pipeline::common::config::ConversionConfig;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::debayer::types::DebayeredImage;

/// Encodes a debayered image into a viewable raster format.
pub trait ImageWriter {
    fn write_rgb(&self, image: &DebayeredImage, output: &mut dyn Write, config: &ConversionConfig) -> Result<()>;
}
