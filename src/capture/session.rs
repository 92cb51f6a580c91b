use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, error, info, instrument, warn};

use super::config::SessionConfig;
use super::events::CaptureEvent;
use super::source::{CaptureError, CaptureSource};
use crate::image_pipeline::{FitsReader, FormatWriter, ImageWriter, RawFrameReader, RawToRgbPipeline};

/// Outcome counters of a capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames written in the configured output format
    pub saved: u64,
    /// Frames that failed conversion and were kept as raw FITS
    pub stored_raw: u64,
    /// Frames lost entirely
    pub failed: u64,
}

/// State of one capture run, owned by whoever pumps the source's events.
///
/// Exactly one exposure is in flight at a time: the next one is requested
/// after the previous frame has been handled, whether or not handling it
/// succeeded.
pub struct CaptureSession<S: CaptureSource, R: RawFrameReader = FitsReader, W: ImageWriter = FormatWriter> {
    source: S,
    pipeline: RawToRgbPipeline<R, W>,
    config: SessionConfig,
    exposure_started: Option<DateTime<Local>>,
    exposure_in_flight: bool,
    stats: SessionStats,
}

impl<S: CaptureSource> CaptureSession<S> {
    /// Session converting FITS frames with `config.conversion`.
    pub fn new(source: S, config: SessionConfig) -> Result<Self, CaptureError> {
        let pipeline = RawToRgbPipeline::new(config.conversion.clone());
        Self::with_pipeline(source, pipeline, config)
    }
}

impl<S: CaptureSource, R: RawFrameReader, W: ImageWriter> CaptureSession<S, R, W> {
    pub fn with_pipeline(
        source: S,
        pipeline: RawToRgbPipeline<R, W>,
        config: SessionConfig,
    ) -> Result<Self, CaptureError> {
        config.validate()?;
        config.region.log_alignment_warnings();
        std::fs::create_dir_all(&config.output_dir)?;

        info!(
            output_dir = %config.output_dir.display(),
            exposure = config.exposure_seconds,
            raw = config.raw,
            "Capture session ready"
        );

        Ok(Self {
            source,
            pipeline,
            config,
            exposure_started: None,
            exposure_in_flight: false,
            stats: SessionStats::default(),
        })
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Handles events until the iterator ends (e.g. the sending side of a
    /// channel is dropped). Only capture source errors stop the run.
    pub fn run<I>(&mut self, events: I) -> Result<SessionStats, CaptureError>
    where
        I: IntoIterator<Item = CaptureEvent>,
    {
        for event in events {
            self.handle_event(event)?;
        }
        info!(
            saved = self.stats.saved,
            stored_raw = self.stats.stored_raw,
            failed = self.stats.failed,
            "Capture session finished"
        );
        Ok(self.stats)
    }

    /// Reacts to one event. Returns the path written for a delivered frame.
    pub fn handle_event(&mut self, event: CaptureEvent) -> Result<Option<PathBuf>, CaptureError> {
        match event {
            CaptureEvent::Connection { connected } => {
                info!(connected, "Capture source connection changed");
                Ok(None)
            }
            CaptureEvent::FrameProperty => {
                info!(region = ?self.config.region, "Set new frame parameters");
                self.source.set_frame_region(self.config.region)?;
                Ok(None)
            }
            CaptureEvent::ExposureProperty => {
                if self.exposure_in_flight {
                    debug!("Exposure already in flight, not starting another");
                } else {
                    self.take_exposure()?;
                }
                Ok(None)
            }
            CaptureEvent::Temperature { celsius } => {
                info!(celsius, "Chip temperature");
                Ok(None)
            }
            CaptureEvent::Blob { name, data } => {
                self.exposure_in_flight = false;
                let saved = self.persist(&name, &data);
                self.take_exposure()?;
                Ok(saved)
            }
        }
    }

    fn take_exposure(&mut self) -> Result<(), CaptureError> {
        self.exposure_started = Some(Local::now());
        self.source.request_exposure(self.config.exposure_seconds)?;
        self.exposure_in_flight = true;
        debug!(seconds = self.config.exposure_seconds, "Exposure requested");
        Ok(())
    }

    fn output_basename(&self) -> String {
        if self.config.override_output {
            return "frame".to_string();
        }
        let started = self.exposure_started.unwrap_or_else(Local::now);
        format!(
            "frame_{}_exp_{:?}s",
            started.format("%Y%m%d_%H%M%S%.3f"),
            self.config.exposure_seconds
        )
    }

    /// Writes one delivered frame. Never fails: problems are logged and
    /// counted so the capture loop keeps going.
    #[instrument(skip(self, data), fields(bytes = data.len()))]
    fn persist(&mut self, name: &str, data: &[u8]) -> Option<PathBuf> {
        let basename = self.output_basename();
        let raw_path = self.config.output_dir.join(format!("{basename}.fit"));

        if self.config.raw {
            return match write_raw(&raw_path, data) {
                Ok(()) => {
                    self.stats.saved += 1;
                    Some(raw_path)
                }
                Err(e) => {
                    error!(error = %e, "Failed to store raw frame");
                    self.stats.failed += 1;
                    None
                }
            };
        }

        let extension = self.pipeline.config().output_format.extension();
        let path = self.config.output_dir.join(format!("{basename}.{extension}"));
        let error = match self.pipeline.convert_bytes_to_file(data, &path) {
            Ok(()) => {
                self.stats.saved += 1;
                return Some(path);
            }
            Err(e) => e,
        };

        warn!(error = %error, "Frame conversion failed");
        if !self.config.raw_fallback {
            self.stats.failed += 1;
            return None;
        }

        match write_raw(&raw_path, data) {
            Ok(()) => {
                info!(path = %raw_path.display(), "Stored unconverted frame");
                self.stats.stored_raw += 1;
                Some(raw_path)
            }
            Err(e) => {
                error!(error = %e, "Failed to store raw fallback");
                self.stats.failed += 1;
                None
            }
        }
    }
}

fn write_raw(path: &Path, data: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::config::FrameRegion;
    use crate::capture::source::MockCaptureSource;
    use crate::image_pipeline::{RawFrame, encode_fits};

    fn config_in(dir: &Path) -> SessionConfig {
        SessionConfig {
            exposure_seconds: 0.5,
            region: FrameRegion { x0: 0, y0: 0, width: 8, height: 6 },
            output_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    fn blob(frame: &RawFrame) -> CaptureEvent {
        CaptureEvent::Blob {
            name: "CCD1".to_string(),
            data: encode_fits(frame).unwrap(),
        }
    }

    fn start(session: &mut CaptureSession<MockCaptureSource>) {
        session.handle_event(CaptureEvent::Connection { connected: true }).unwrap();
        session.handle_event(CaptureEvent::FrameProperty).unwrap();
        session.handle_event(CaptureEvent::ExposureProperty).unwrap();
    }

    #[test]
    fn test_properties_drive_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = CaptureSession::new(MockCaptureSource::new(), config_in(dir.path())).unwrap();
        start(&mut session);

        assert_eq!(session.source().region().map(|r| r.width), Some(8));
        assert_eq!(session.source().exposures_requested(), 1);

        // a repeated exposure property must not start a second exposure
        session.handle_event(CaptureEvent::ExposureProperty).unwrap();
        session.handle_event(CaptureEvent::Temperature { celsius: -10.5 }).unwrap();
        assert_eq!(session.source().exposures_requested(), 1);
    }

    #[test]
    fn test_frames_saved_with_timestamped_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = CaptureSession::new(MockCaptureSource::new(), config_in(dir.path())).unwrap();
        start(&mut session);

        let event = session.source_mut().next_event().unwrap();
        let path = session.handle_event(event).unwrap().unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("frame_"), "{name}");
        assert!(name.ends_with("_exp_0.5s.png"), "{name}");

        let image = image::open(&path).unwrap();
        assert_eq!((image.width(), image.height()), (4, 3));
        assert_eq!(session.source().exposures_requested(), 2);
        assert_eq!(session.stats().saved, 1);
    }

    #[test]
    fn test_override_reuses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            override_output: true,
            ..config_in(dir.path())
        };
        let mut session = CaptureSession::new(MockCaptureSource::new(), config).unwrap();
        start(&mut session);

        for _ in 0..3 {
            let event = session.source_mut().next_event().unwrap();
            let path = session.handle_event(event).unwrap().unwrap();
            assert_eq!(path, dir.path().join("frame.png"));
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(session.stats().saved, 3);
    }

    #[test]
    fn test_raw_mode_stores_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            raw: true,
            override_output: true,
            ..config_in(dir.path())
        };
        let mut session = CaptureSession::new(MockCaptureSource::new(), config).unwrap();

        let frame = RawFrame::new(4, 4, vec![1234; 16], 16);
        let event = blob(&frame);
        let CaptureEvent::Blob { data, .. } = &event else { unreachable!() };
        let expected = data.clone();

        let path = session.handle_event(event).unwrap().unwrap();
        assert_eq!(path, dir.path().join("frame.fit"));
        assert_eq!(std::fs::read(&path).unwrap(), expected);
    }

    #[test]
    fn test_bad_frame_falls_back_to_raw_and_keeps_capturing() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            override_output: true,
            ..config_in(dir.path())
        };
        let mut session = CaptureSession::new(MockCaptureSource::new(), config).unwrap();

        let odd = RawFrame::new(4, 5, vec![0; 20], 16);
        let path = session.handle_event(blob(&odd)).unwrap().unwrap();

        assert_eq!(path, dir.path().join("frame.fit"));
        assert!(!dir.path().join("frame.png").exists());
        assert_eq!(session.source().exposures_requested(), 1);
        assert_eq!(
            session.stats(),
            SessionStats { saved: 0, stored_raw: 1, failed: 0 }
        );
    }

    #[test]
    fn test_bad_frame_discarded_without_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            raw_fallback: false,
            ..config_in(dir.path())
        };
        let mut session = CaptureSession::new(MockCaptureSource::new(), config).unwrap();

        let event = CaptureEvent::Blob {
            name: "CCD1".to_string(),
            data: b"not a fits file".to_vec(),
        };
        assert_eq!(session.handle_event(event).unwrap(), None);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(session.source().exposures_requested(), 1);
        assert_eq!(session.stats().failed, 1);
    }

    #[test]
    fn test_oversized_header_keeps_capturing() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            override_output: true,
            ..config_in(dir.path())
        };
        let mut session = CaptureSession::new(MockCaptureSource::new(), config).unwrap();

        let mut data = Vec::new();
        for card in [
            "SIMPLE  =                    T",
            "BITPIX  =                   16",
            "NAXIS   =                    2",
            "NAXIS1  =           4294967296",
            "NAXIS2  =           4294967296",
            "END",
        ] {
            data.extend_from_slice(format!("{card:<80}").as_bytes());
        }
        data.resize(2880, b' ');

        let event = CaptureEvent::Blob { name: "CCD1".to_string(), data };
        let path = session.handle_event(event).unwrap().unwrap();

        assert_eq!(path, dir.path().join("frame.fit"));
        assert_eq!(session.stats().stored_raw, 1);
        assert_eq!(session.source().exposures_requested(), 1);
    }

    #[test]
    fn test_run_over_channel() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = CaptureSession::new(MockCaptureSource::new(), config_in(dir.path())).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(CaptureEvent::Connection { connected: true }).unwrap();
        tx.send(blob(&RawFrame::new(4, 4, vec![65535; 16], 16))).unwrap();
        tx.send(blob(&RawFrame::new(3, 4, vec![0; 12], 16))).unwrap();
        tx.send(blob(&RawFrame::new(4, 4, vec![0; 16], 16))).unwrap();
        drop(tx);

        let stats = session.run(rx).unwrap();
        assert_eq!(stats, SessionStats { saved: 2, stored_raw: 1, failed: 0 });
        assert_eq!(session.source().exposures_requested(), 3);
    }

    struct FailingSource;

    impl CaptureSource for FailingSource {
        fn set_frame_region(&mut self, _region: FrameRegion) -> Result<(), CaptureError> {
            Ok(())
        }

        fn request_exposure(&mut self, _seconds: f64) -> Result<(), CaptureError> {
            Err(CaptureError::SourceError("device gone".to_string()))
        }
    }

    #[test]
    fn test_source_error_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = CaptureSession::new(FailingSource, config_in(dir.path())).unwrap();

        let result = session.run([CaptureEvent::FrameProperty, CaptureEvent::ExposureProperty]);
        assert!(matches!(result, Err(CaptureError::SourceError(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            exposure_seconds: -2.0,
            ..config_in(dir.path())
        };
        assert!(matches!(
            CaptureSession::new(MockCaptureSource::new(), config),
            Err(CaptureError::ConfigError(_))
        ));
    }
}
