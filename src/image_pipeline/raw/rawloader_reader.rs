//! RAW image reader implementation using the rawloader library.
//!
//! Lets the pipeline debayer camera RAW files (ARW, CR2, NEF, DNG, ...)
//! alongside FITS captures. Only single-component Bayer sensors are
//! accepted; X-Trans and linear RAWs are rejected.

use std::io::Cursor;

use rawloader::RawImageData as RawloaderImageData;
use tracing::debug;

use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::raw::reader::RawFrameReader;
use crate::image_pipeline::raw::types::{CfaPattern, RawFrame};

/// RAW image reader that uses the rawloader library for decoding.
pub struct RawLoaderReader;

/// Default bit depth when no white level information is available from the RAW file.
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

/// The bit width of the u16 data type, used for calculating actual bits per sample.
const U16_BITS: u32 = 16;

impl RawFrameReader for RawLoaderReader {
    /// Decodes a camera RAW file.
    ///
    /// The bit depth is derived from the sensor white level (4095 -> 12 bits,
    /// 16383 -> 14 bits) and the mosaic phase from the decoder's CFA name.
    fn read_raw(&self, data: &[u8]) -> Result<RawFrame> {
        debug!("Decoding camera RAW, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| ConversionError::DecodeError(e.to_string()))?;

        if decoded.cpp != 1 {
            return Err(ConversionError::UnsupportedFormat(format!(
                "{} components per pixel, expected a single Bayer channel",
                decoded.cpp
            )));
        }

        let cfa = match decoded.cfa.name.as_str() {
            "" => None,
            name => Some(name.parse::<CfaPattern>()?),
        };

        let samples: Vec<u32> = match decoded.data {
            RawloaderImageData::Integer(values) => values.into_iter().map(u32::from).collect(),
            RawloaderImageData::Float(values) => values
                .into_iter()
                .map(|v| (v.clamp(0.0, 1.0) * u16::MAX as f32) as u32)
                .collect(),
        };

        let max_white_level = decoded.whitelevels.iter().max().copied().unwrap_or(u16::MAX);
        let bits_per_sample = if max_white_level == 0 {
            DEFAULT_BITS_PER_SAMPLE
        } else {
            U16_BITS - max_white_level.leading_zeros()
        };

        debug!(
            width = decoded.width,
            height = decoded.height,
            bits_per_sample,
            cfa = ?cfa,
            "Decoded camera RAW"
        );

        Ok(RawFrame {
            width: decoded.width,
            height: decoded.height,
            data: samples,
            bits_per_sample,
            cfa,
        })
    }
}
