use std::io::{Cursor, Write};

use tiff::encoder::colortype::RGB8;
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::image_pipeline::common::config::{ConversionConfig, TiffCompression};
use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::debayer::types::DebayeredImage;
use crate::image_pipeline::output::writer::ImageWriter;

/// Single-strip RGB8 TIFF output.
pub struct StandardTiffWriter;

fn compression(setting: TiffCompression) -> Compression {
    match setting {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
    }
}

/// Maps the TIFF `Predictor` tag value (1 = none, 2 = horizontal).
fn predictor(value: u16) -> Result<Predictor> {
    match value {
        1 => Ok(Predictor::None),
        2 => Ok(Predictor::Horizontal),
        other => Err(ConversionError::UnsupportedFormat(format!(
            "TIFF predictor {other}, expected 1 or 2"
        ))),
    }
}

impl ImageWriter for StandardTiffWriter {
    fn write_rgb(&self, image: &DebayeredImage, output: &mut dyn Write, config: &ConversionConfig) -> Result<()> {
        let _span = tracing::debug_span!(
            "tiff_encode",
            width = image.width,
            height = image.height,
            compression = ?config.compression
        )
        .entered();

        let expected = image.width * image.height * 3;
        if image.data.len() != expected {
            return Err(ConversionError::EncodeError(format!(
                "expected {} RGB bytes for {}x{}, got {}",
                expected,
                image.width,
                image.height,
                image.data.len()
            )));
        }

        // The encoder seeks back to patch offsets, so it writes to memory first
        let mut buffer = Vec::with_capacity(expected + 1024);
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(|e| ConversionError::EncodeError(e.to_string()))?
            .with_compression(compression(config.compression));
        if let Some(value) = config.predictor {
            encoder = encoder.with_predictor(predictor(value)?);
        }

        encoder
            .write_image::<RGB8>(image.width as u32, image.height as u32, &image.data)
            .map_err(|e| ConversionError::EncodeError(e.to_string()))?;

        output.write_all(&buffer)?;
        debug!(bytes = buffer.len(), "TIFF encoding complete");
        Ok(())
    }
}
