use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raw::types::RawFrame;

/// Decodes container bytes delivered by a capture source into a [`RawFrame`].
pub trait RawFrameReader {
    fn read_raw(&self, data: &[u8]) -> Result<RawFrame>;
}
