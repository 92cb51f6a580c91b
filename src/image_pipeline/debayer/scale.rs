//! Linear rescaling of D-bit sensor samples to 8 bits

use crate::image_pipeline::common::error::{ConversionError, Result};

/// Maps `[0, 2^D - 1]` onto `[0, 255]` as `floor(in * 255 / (2^D - 1))`.
///
/// Samples above `2^D - 1` saturate to 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitDepthScale {
    max_in: u64,
}

impl BitDepthScale {
    pub const MAX_BITS: u32 = 32;

    pub fn new(bits: u32) -> Result<Self> {
        if bits == 0 || bits > Self::MAX_BITS {
            return Err(ConversionError::BitDepthError(bits));
        }
        Ok(Self {
            max_in: (1u64 << bits) - 1,
        })
    }

    #[inline]
    pub fn apply(&self, sample: u32) -> u8 {
        let sample = (sample as u64).min(self.max_in);
        (sample * u8::MAX as u64 / self.max_in) as u8
    }

    pub fn apply_all(&self, samples: &[u32]) -> Vec<u8> {
        samples.iter().map(|&s| self.apply(s)).collect()
    }
}
