//! Raw frame data types

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::image_pipeline::common::error::ConversionError;

/// Phase of the 2x2 Bayer color filter mosaic, read row by row from the
/// top-left sample of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CfaPattern {
    /// Row 0: R G, row 1: G B
    #[default]
    Rggb,
    /// Row 0: B G, row 1: G R
    Bggr,
    /// Row 0: G R, row 1: B G
    Grbg,
    /// Row 0: G B, row 1: R G
    Gbrg,
}

/// Positions `(row, col)` of each color inside one 2x2 mosaic cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellLayout {
    pub red: (usize, usize),
    pub blue: (usize, usize),
    /// Green sample sharing the odd row of the cell
    pub green_odd_row: (usize, usize),
    /// Green sample sharing the even row of the cell
    pub green_even_row: (usize, usize),
}

impl CfaPattern {
    pub fn layout(&self) -> CellLayout {
        match self {
            CfaPattern::Rggb => CellLayout {
                red: (0, 0),
                blue: (1, 1),
                green_odd_row: (1, 0),
                green_even_row: (0, 1),
            },
            CfaPattern::Bggr => CellLayout {
                red: (1, 1),
                blue: (0, 0),
                green_odd_row: (1, 0),
                green_even_row: (0, 1),
            },
            CfaPattern::Grbg => CellLayout {
                red: (0, 1),
                blue: (1, 0),
                green_odd_row: (1, 1),
                green_even_row: (0, 0),
            },
            CfaPattern::Gbrg => CellLayout {
                red: (1, 0),
                blue: (0, 1),
                green_odd_row: (1, 1),
                green_even_row: (0, 0),
            },
        }
    }

    /// Phase seen by a frame whose origin is moved `x` columns right and
    /// `y` rows down on the same sensor (e.g. a subframe or the FITS
    /// `XBAYROFF`/`YBAYROFF` keywords).
    pub fn shifted(self, x: i64, y: i64) -> Self {
        let mut pattern = self;
        if x.rem_euclid(2) == 1 {
            pattern = match pattern {
                CfaPattern::Rggb => CfaPattern::Grbg,
                CfaPattern::Grbg => CfaPattern::Rggb,
                CfaPattern::Bggr => CfaPattern::Gbrg,
                CfaPattern::Gbrg => CfaPattern::Bggr,
            };
        }
        if y.rem_euclid(2) == 1 {
            pattern = match pattern {
                CfaPattern::Rggb => CfaPattern::Gbrg,
                CfaPattern::Gbrg => CfaPattern::Rggb,
                CfaPattern::Bggr => CfaPattern::Grbg,
                CfaPattern::Grbg => CfaPattern::Bggr,
            };
        }
        pattern
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CfaPattern::Rggb => "RGGB",
            CfaPattern::Bggr => "BGGR",
            CfaPattern::Grbg => "GRBG",
            CfaPattern::Gbrg => "GBRG",
        }
    }
}

impl fmt::Display for CfaPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CfaPattern {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RGGB" => Ok(CfaPattern::Rggb),
            "BGGR" => Ok(CfaPattern::Bggr),
            "GRBG" => Ok(CfaPattern::Grbg),
            "GBRG" => Ok(CfaPattern::Gbrg),
            other => Err(ConversionError::UnsupportedFormat(format!("Bayer pattern {other}"))),
        }
    }
}

/// Single-channel raw sensor readout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Width of the frame in pixels
    pub width: usize,
    /// Height of the frame in pixels
    pub height: usize,
    /// Row-major samples (single channel Bayer mosaic)
    pub data: Vec<u32>,
    /// Significant bits per sample (16 for the observed cameras)
    pub bits_per_sample: u32,
    /// Mosaic phase declared by the container, if any
    pub cfa: Option<CfaPattern>,
}

impl RawFrame {
    pub fn new(width: usize, height: usize, data: Vec<u32>, bits_per_sample: u32) -> Self {
        Self {
            width,
            height,
            data,
            bits_per_sample,
            cfa: None,
        }
    }

    pub fn with_cfa(mut self, cfa: CfaPattern) -> Self {
        self.cfa = Some(cfa);
        self
    }

    #[inline]
    pub fn sample(&self, row: usize, col: usize) -> u32 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}
