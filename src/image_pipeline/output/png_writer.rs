use std::io::Write;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tracing::debug;

use crate::image_pipeline::common::config::ConversionConfig;
use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::debayer::types::DebayeredImage;
use crate::image_pipeline::output::writer::ImageWriter;

pub struct PngWriter;

impl ImageWriter for PngWriter {
    fn write_rgb(&self, image: &DebayeredImage, output: &mut dyn Write, _config: &ConversionConfig) -> Result<()> {
        debug!("Encoding PNG image: {}x{}", image.width, image.height);

        // The encoder panics on a short buffer
        if image.data.len() != image.width * image.height * 3 {
            return Err(ConversionError::EncodeError(format!(
                "expected {} RGB bytes for {}x{}, got {}",
                image.width * image.height * 3,
                image.width,
                image.height,
                image.data.len()
            )));
        }

        PngEncoder::new(output)
            .write_image(
                &image.data,
                image.width as u32,
                image.height as u32,
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| ConversionError::EncodeError(e.to_string()))?;

        debug!("PNG encoding complete");
        Ok(())
    }
}
