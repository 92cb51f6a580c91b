use tracing::{info, instrument};
use std::io::Write;
use std::path::Path;

use crate::image_pipeline::{
    common::config::ConversionConfig,
    common::error::{ConversionError, Result},
    debayer::{Debayerer, DebayeredImage},
    output::{FormatWriter, ImageWriter},
    raw::{FitsReader, RawFrame, RawFrameReader},
};

/// Raw capture to 8-bit RGB image conversion: read, validate, debayer, encode.
pub struct RawToRgbPipeline<R: RawFrameReader, W: ImageWriter> {
    reader: R,
    writer: W,
    config: ConversionConfig,
}

impl RawToRgbPipeline<FitsReader, FormatWriter> {
    /// FITS input, writer chosen by `config.output_format`.
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            reader: FitsReader,
            writer: FormatWriter::for_format(config.output_format),
            config,
        }
    }
}

impl<R: RawFrameReader> RawToRgbPipeline<R, FormatWriter> {
    pub fn with_reader(reader: R, config: ConversionConfig) -> Self {
        Self {
            reader,
            writer: FormatWriter::for_format(config.output_format),
            config,
        }
    }
}

impl<R: RawFrameReader, W: ImageWriter> RawToRgbPipeline<R, W> {
    pub fn with_custom(reader: R, writer: W, config: ConversionConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(ConversionError::InvalidDimensions(width, height));
        }

        if width % 2 != 0 || height % 2 != 0 {
            return Err(ConversionError::ShapeError { width, height });
        }

        Ok(())
    }

    /// Validates and debayers an already decoded frame.
    pub fn convert_frame(&self, frame: &RawFrame) -> Result<DebayeredImage> {
        {
            let _span = tracing::info_span!("validate_dimensions",
                width = frame.width,
                height = frame.height
            ).entered();
            self.validate_dimensions(frame.width, frame.height)?;
        }

        let _span = tracing::info_span!("debayer", strategy = ?self.config.strategy).entered();
        Debayerer::from_config(&self.config).process(frame)
    }

    fn decode_and_debayer(&self, input_data: &[u8]) -> Result<DebayeredImage> {
        let raw_frame = {
            let _span = tracing::info_span!("decode_raw").entered();
            self.reader.read_raw(input_data)?
        };

        self.convert_frame(&raw_frame)
    }

    fn encode(&self, image: &DebayeredImage, output: &mut dyn Write) -> Result<()> {
        let _span = tracing::info_span!("encode_image", format = ?self.config.output_format).entered();
        self.writer.write_rgb(image, output, &self.config)
    }

    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn convert(&self, input_data: &[u8], output: &mut dyn Write) -> Result<()> {
        info!("Starting raw to RGB conversion");

        let image = self.decode_and_debayer(input_data)?;
        self.encode(&image, output)?;

        info!(
            width = image.width,
            height = image.height,
            "Conversion complete"
        );
        Ok(())
    }

    /// Converts a file on disk.
    ///
    /// The output file is only created once the frame has been debayered,
    /// so a rejected frame leaves nothing behind.
    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<()> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Converting file"
        );

        let input_data = {
            let _span = tracing::info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                ConversionError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        self.convert_bytes_to_file(&input_data, output_path)
    }

    /// Converts in-memory capture bytes into an image file.
    pub fn convert_bytes_to_file(&self, input_data: &[u8], output_path: &Path) -> Result<()> {
        let image = self.decode_and_debayer(input_data)?;

        let mut encoded = Vec::new();
        self.encode(&image, &mut encoded)?;

        {
            let _span = tracing::info_span!("write_output_file").entered();
            std::fs::write(output_path, &encoded).map_err(|e| {
                ConversionError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?;
        }

        info!(
            width = image.width,
            height = image.height,
            output = %output_path.display(),
            "Conversion complete"
        );
        Ok(())
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }
}
