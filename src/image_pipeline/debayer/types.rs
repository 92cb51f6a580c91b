//! Types for debayering operations

use serde::Deserialize;

/// RGB image data after debayering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebayeredImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// 8-bit RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u8>,
}

impl DebayeredImage {
    /// RGB triple at `(row, col)`
    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        let i = (row * self.width + col) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
    }
}

/// How a mosaic is turned into color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebayerStrategy {
    /// One RGB pixel per 2x2 cell, output is half the input resolution
    #[default]
    Decimate,
    /// Full resolution demosaic, every pixel gets all three channels
    Interpolate,
}

/// Interpolation kernel used by [`DebayerStrategy::Interpolate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    #[serde(rename = "nearest")]
    NearestNeighbour,
    #[default]
    Bilinear,
}

/// Which of the two green samples of a cell feeds the G channel when
/// decimating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GreenSample {
    /// Green in the odd row of the cell (G1, the capture client's choice)
    #[default]
    First,
    /// Green in the even row of the cell (G2)
    Second,
    /// Floor of the mean of both greens
    Mean,
}
