pub mod data;

pub use data::{
    Calibration, CalibrationMode, EulerAngles, Matrix4, Measurement, PixelFrame, Quaternion, Unit,
    Vector3,
};

use std::error::Error as StdError;
use std::fmt;

use chrono::{DateTime, Utc};

// --- Standard Error Type ---
#[derive(Debug)]
pub enum AttitudeError {
    /// Error originating from the serial device
    Serial(serialport::Error),
    /// I/O error on the transport
    Io(std::io::Error),
    /// Error reading or writing the configuration store
    Config(String),
    /// Error delivering data to the telemetry sink
    Publish(String),
    /// Error producing the rendered orientation frame
    Render(String),
    /// Pixel frame violating the sink contract
    Frame(String),
}

impl fmt::Display for AttitudeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttitudeError::Serial(e) => write!(f, "Serial error: {}", e),
            AttitudeError::Io(e) => write!(f, "I/O error: {}", e),
            AttitudeError::Config(s) => write!(f, "Config error: {}", s),
            AttitudeError::Publish(s) => write!(f, "Publish error: {}", s),
            AttitudeError::Render(s) => write!(f, "Render error: {}", s),
            AttitudeError::Frame(s) => write!(f, "Frame error: {}", s),
        }
    }
}

impl StdError for AttitudeError {}

impl From<serialport::Error> for AttitudeError {
    fn from(error: serialport::Error) -> Self {
        AttitudeError::Serial(error)
    }
}

impl From<std::io::Error> for AttitudeError {
    fn from(error: std::io::Error) -> Self {
        AttitudeError::Io(error)
    }
}

/// Line-oriented transport to the sensor.
///
/// `read_line` is non-blocking: it drains whatever bytes the transport has
/// already buffered and hands back at most one complete line, stripped of
/// its CR/LF terminator. A tick with no complete line pending gets `None`.
pub trait LineTransport {
    fn read_line(&mut self) -> Result<Option<String>, AttitudeError>;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), AttitudeError>;
}

/// Key-value configuration store read each tick and written back on
/// calibration events.
///
/// Missing keys resolve to the caller-supplied default; a present but
/// unparseable integer is an error.
pub trait ConfigStore {
    fn get_str(&self, key: &str, default: &str) -> Result<String, AttitudeError>;

    fn get_i32(&self, key: &str, default: i32) -> Result<i32, AttitudeError>;

    fn set_str(&mut self, key: &str, value: &str) -> Result<(), AttitudeError>;

    fn set_i32(&mut self, key: &str, value: i32) -> Result<(), AttitudeError>;
}

/// Downstream telemetry publisher (named scalar time series and RGB pixel
/// frames).
pub trait TelemetrySink {
    /// Drop any buffered history for the named stream.
    fn clear(&mut self, name: &str) -> Result<(), AttitudeError>;

    fn publish_scalar(
        &mut self,
        name: &str,
        timestamp: DateTime<Utc>,
        value: f64,
        unit: Unit,
    ) -> Result<(), AttitudeError>;

    fn publish_frame(&mut self, name: &str, frame: &PixelFrame) -> Result<(), AttitudeError>;
}

/// Renderer consuming a 4x4 orientation transform and producing one square
/// RGB image of `side_length() ^ 2` pixels.
pub trait OrientationRenderer {
    fn side_length(&self) -> u32;

    fn render(&mut self, transform: &Matrix4) -> Result<Vec<u8>, AttitudeError>;
}
