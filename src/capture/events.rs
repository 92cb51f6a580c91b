//! Events delivered by a capture source.

/// Notifications from the capture source, decoupled from any particular
/// device-control protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// The source connected to or lost its device
    Connection { connected: bool },
    /// The exposure control became available
    ExposureProperty,
    /// The frame region control became available
    FrameProperty,
    /// Sensor temperature report
    Temperature { celsius: f64 },
    /// A finished exposure, as container bytes (FITS for INDI cameras)
    Blob { name: String, data: Vec<u8> },
}
