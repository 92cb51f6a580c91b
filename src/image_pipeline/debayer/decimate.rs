//! Half-resolution debayering: one RGB pixel per 2x2 mosaic cell.
//!
//! No interpolation happens, each output channel is a single rescaled
//! sample of its cell.

use tracing::debug;

use super::scale::BitDepthScale;
use super::types::{DebayeredImage, GreenSample};
use crate::image_pipeline::raw::types::{CfaPattern, RawFrame};

/// Caller must have checked that both dimensions are even and that the
/// sample count matches.
pub fn decimate(
    frame: &RawFrame,
    cfa: CfaPattern,
    green: GreenSample,
    scale: BitDepthScale,
) -> DebayeredImage {
    let out_width = frame.width / 2;
    let out_height = frame.height / 2;
    let layout = cfa.layout();
    debug!(out_width, out_height, %cfa, ?green, "Decimating mosaic");

    let at = |row: usize, col: usize, (dy, dx): (usize, usize)| {
        scale.apply(frame.sample(2 * row + dy, 2 * col + dx))
    };

    let mut data = Vec::with_capacity(out_width * out_height * 3);
    for row in 0..out_height {
        for col in 0..out_width {
            let g = match green {
                GreenSample::First => at(row, col, layout.green_odd_row),
                GreenSample::Second => at(row, col, layout.green_even_row),
                GreenSample::Mean => {
                    let g1 = at(row, col, layout.green_odd_row) as u16;
                    let g2 = at(row, col, layout.green_even_row) as u16;
                    ((g1 + g2) / 2) as u8
                }
            };
            data.extend_from_slice(&[at(row, col, layout.red), g, at(row, col, layout.blue)]);
        }
    }

    DebayeredImage {
        width: out_width,
        height: out_height,
        data,
    }
}
