//! Capture session handling.
//!
//! A capture source (an INDI camera driver or similar) reports property
//! changes and delivers exposures as [`CaptureEvent`]s. The
//! [`CaptureSession`] reacts to them one at a time: it pushes the frame
//! region, requests exposures, and persists every delivered frame before
//! asking for the next one.

mod config;
mod events;
mod session;
mod source;

pub use config::{ConfigError, FrameRegion, SessionConfig};
pub use events::CaptureEvent;
pub use session::{CaptureSession, SessionStats};
pub use source::{CaptureError, CaptureSource, MockCaptureSource};
