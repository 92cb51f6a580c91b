//! Capture source abstraction.
//!
//! The device-control client lives outside this crate. It only has to
//! accept frame region and exposure requests; everything it reports back
//! arrives as [`CaptureEvent`]s.

use std::collections::VecDeque;

use thiserror::Error;

use super::config::{ConfigError, FrameRegion};
use super::events::CaptureEvent;
use crate::image_pipeline::{CfaPattern, RawFrame, encode_fits};

/// Errors that can occur while driving a capture source.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture source error: {0}")]
    SourceError(String),
    #[error("invalid session config: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Requests accepted by a capture source.
pub trait CaptureSource {
    /// Selects the sensor subwindow used by subsequent exposures.
    fn set_frame_region(&mut self, region: FrameRegion) -> Result<(), CaptureError>;

    /// Starts one exposure; the frame is delivered later as a
    /// [`CaptureEvent::Blob`].
    fn request_exposure(&mut self, seconds: f64) -> Result<(), CaptureError>;
}

/// Frame size used until a region is set.
const DEFAULT_MOCK_SIZE: u32 = 64;

/// In-process capture source that answers every exposure request with a
/// synthetic 16-bit RGGB frame encoded as FITS.
#[derive(Debug, Default)]
pub struct MockCaptureSource {
    region: Option<FrameRegion>,
    pending: VecDeque<f64>,
    exposures_requested: u64,
    sequence: u64,
}

impl MockCaptureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(&self) -> Option<FrameRegion> {
        self.region
    }

    pub fn exposures_requested(&self) -> u64 {
        self.exposures_requested
    }

    /// Exposures requested but not yet delivered.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Completes the oldest pending exposure.
    pub fn next_event(&mut self) -> Option<CaptureEvent> {
        let seconds = self.pending.pop_front()?;
        self.sequence += 1;

        let region = self.region.unwrap_or(FrameRegion {
            x0: 0,
            y0: 0,
            width: DEFAULT_MOCK_SIZE,
            height: DEFAULT_MOCK_SIZE,
        });
        let (width, height) = (region.width as usize, region.height as usize);

        // Brightness grows with exposure and sequence, saturating at 16 bits
        let gain = (seconds * 1000.0) as u64 + self.sequence;
        let data: Vec<u32> = (0..width * height)
            .map(|i| ((i as u64 * gain) % 65536) as u32)
            .collect();
        let frame = RawFrame::new(width, height, data, 16)
            .with_cfa(CfaPattern::Rggb.shifted(region.x0 as i64, region.y0 as i64));

        tracing::debug!(sequence = self.sequence, width, height, "Mock exposure complete");

        match encode_fits(&frame) {
            Ok(data) => Some(CaptureEvent::Blob {
                name: format!("CCD1-{}", self.sequence),
                data,
            }),
            Err(e) => {
                tracing::error!("Mock frame encoding failed: {}", e);
                None
            }
        }
    }
}

impl CaptureSource for MockCaptureSource {
    fn set_frame_region(&mut self, region: FrameRegion) -> Result<(), CaptureError> {
        if region.width == 0 || region.height == 0 {
            return Err(CaptureError::SourceError(format!(
                "frame region {}x{} is empty",
                region.width, region.height
            )));
        }
        self.region = Some(region);
        Ok(())
    }

    fn request_exposure(&mut self, seconds: f64) -> Result<(), CaptureError> {
        self.exposures_requested += 1;
        self.pending.push_back(seconds);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::{FitsReader, RawFrameReader};

    #[test]
    fn test_no_event_without_request() {
        let mut source = MockCaptureSource::new();
        assert!(source.next_event().is_none());
    }

    #[test]
    fn test_delivers_fits_for_region() {
        let mut source = MockCaptureSource::new();
        source
            .set_frame_region(FrameRegion { x0: 1, y0: 0, width: 8, height: 6 })
            .unwrap();
        source.request_exposure(0.5).unwrap();

        let Some(CaptureEvent::Blob { name, data }) = source.next_event() else {
            panic!("expected a blob");
        };
        assert_eq!(name, "CCD1-1");

        let frame = FitsReader.read_raw(&data).unwrap();
        assert_eq!((frame.width, frame.height), (8, 6));
        assert_eq!(frame.cfa, Some(CfaPattern::Grbg));
        assert_eq!(source.pending(), 0);
    }

    #[test]
    fn test_rejects_empty_region() {
        let mut source = MockCaptureSource::new();
        let region = FrameRegion { width: 0, ..Default::default() };
        assert!(matches!(
            source.set_frame_region(region),
            Err(CaptureError::SourceError(_))
        ));
    }
}
