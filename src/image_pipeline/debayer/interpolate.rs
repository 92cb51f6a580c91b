use std::io::Cursor;

use bayer::{BayerDepth, CFA, Demosaic, RasterDepth, RasterMut};
use tracing::info;

use super::scale::BitDepthScale;
use super::types::{DebayeredImage, InterpolationMethod};
use crate::image_pipeline::common::error::{ConversionError, Result};
use crate::image_pipeline::raw::types::{CfaPattern, RawFrame};

fn bayer_cfa(cfa: CfaPattern) -> CFA {
    match cfa {
        CfaPattern::Rggb => CFA::RGGB,
        CfaPattern::Bggr => CFA::BGGR,
        CfaPattern::Grbg => CFA::GRBG,
        CfaPattern::Gbrg => CFA::GBRG,
    }
}

fn bayer_demosaic(method: InterpolationMethod) -> Demosaic {
    match method {
        InterpolationMethod::NearestNeighbour => Demosaic::NearestNeighbour,
        InterpolationMethod::Bilinear => Demosaic::Linear,
    }
}

/// Full resolution demosaic.
///
/// Samples are first rescaled to 8 bits, then every pixel gets its missing
/// channels interpolated from its neighbours, so the output keeps the
/// frame's dimensions.
pub fn interpolate(
    frame: &RawFrame,
    cfa: CfaPattern,
    method: InterpolationMethod,
    scale: BitDepthScale,
) -> Result<DebayeredImage> {
    let width = frame.width;
    let height = frame.height;
    info!("Starting CPU demosaic for image {}x{}", width, height);

    let bayer_bytes = scale.apply_all(&frame.data);
    let mut output_buf = vec![0u8; width * height * 3];
    let mut cursor = Cursor::new(&bayer_bytes[..]);

    info!("Running demosaic with CFA={}, algo={:?}", cfa, method);

    {
        let mut output_raster = RasterMut::new(width, height, RasterDepth::Depth8, &mut output_buf);
        bayer::run_demosaic(
            &mut cursor,
            BayerDepth::Depth8,
            bayer_cfa(cfa),
            bayer_demosaic(method),
            &mut output_raster,
        )
        .map_err(|e| ConversionError::DebayerError(format!("{:?}", e)))?;
    }

    Ok(DebayeredImage {
        width,
        height,
        data: output_buf,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(width: usize, height: usize, value: u32) -> RawFrame {
        RawFrame::new(width, height, vec![value; width * height], 16)
    }

    #[test]
    fn test_keeps_full_resolution() {
        let frame = uniform(8, 6, 65535);
        let image = interpolate(
            &frame,
            CfaPattern::Rggb,
            InterpolationMethod::Bilinear,
            BitDepthScale::new(16).unwrap(),
        )
        .unwrap();

        assert_eq!((image.width, image.height), (8, 6));
        assert_eq!(image.data.len(), 8 * 6 * 3);
        assert!(image.data.iter().all(|&v| v == 255));
    }

    #[test]
    fn test_uniform_frame_stays_uniform_for_every_pattern() {
        let frame = uniform(8, 8, 32767);
        for cfa in [CfaPattern::Rggb, CfaPattern::Bggr, CfaPattern::Grbg, CfaPattern::Gbrg] {
            for method in [InterpolationMethod::NearestNeighbour, InterpolationMethod::Bilinear] {
                let image = interpolate(&frame, cfa, method, BitDepthScale::new(16).unwrap()).unwrap();
                assert!(
                    image.data.iter().all(|&v| v == 127),
                    "cfa={cfa} method={method:?}"
                );
            }
        }
    }

    /// Frame with only the sites at `site` (row, col within each 2x2 cell) lit.
    fn lit_sites(width: usize, height: usize, site: (usize, usize)) -> RawFrame {
        let data = (0..height)
            .flat_map(|row| {
                (0..width).map(move |col| if (row % 2, col % 2) == site { 65535 } else { 0 })
            })
            .collect();
        RawFrame::new(width, height, data, 16)
    }

    /// Pixels away from the frame border, where every neighbour is real.
    fn interior(image: &DebayeredImage) -> impl Iterator<Item = [u8; 3]> + '_ {
        (2..image.height - 2)
            .flat_map(move |row| (2..image.width - 2).map(move |col| image.pixel(row, col)))
    }

    #[test]
    fn test_lit_sites_land_in_their_channel() {
        let scale = BitDepthScale::new(16).unwrap();
        for cfa in [CfaPattern::Rggb, CfaPattern::Bggr, CfaPattern::Grbg, CfaPattern::Gbrg] {
            let layout = cfa.layout();
            for method in [InterpolationMethod::NearestNeighbour, InterpolationMethod::Bilinear] {
                let red = interpolate(&lit_sites(8, 8, layout.red), cfa, method, scale).unwrap();
                let (row, col) = layout.red;
                assert_eq!(red.pixel(row + 2, col + 2), [255, 0, 0], "cfa={cfa} method={method:?}");
                assert!(
                    interior(&red).all(|[r, g, b]| r >= g && r >= b),
                    "red not dominant for cfa={cfa} method={method:?}"
                );

                let blue = interpolate(&lit_sites(8, 8, layout.blue), cfa, method, scale).unwrap();
                let (row, col) = layout.blue;
                assert_eq!(blue.pixel(row + 2, col + 2), [0, 0, 255], "cfa={cfa} method={method:?}");
                assert!(
                    interior(&blue).all(|[r, g, b]| b >= r && b >= g),
                    "blue not dominant for cfa={cfa} method={method:?}"
                );
            }
        }
    }
}
