use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display as StrumDisplay};

/// 4x4 homogeneous transform, row-major.
pub type Matrix4 = [[f64; 4]; 4];

// --- Basic Types ---
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3 { x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction, or `None` for the zero vector.
    pub fn normalized(&self) -> Option<Vector3> {
        let n = self.norm();
        if n > 0.0 {
            Some(Vector3::new(self.x / n, self.y / n, self.z / n))
        } else {
            None
        }
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector3(x={}, y={}, z={})", self.x, self.y, self.z)
    }
}

/// Orientation as a unit quaternion, WXYZ order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    /// Identity rotation.
    pub const IDENTITY: Quaternion = Quaternion {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Quaternion { w, x, y, z }
    }

    pub fn norm(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Scaled to unit norm. The zero quaternion has no direction; it maps
    /// to the identity rotation.
    pub fn normalized(&self) -> Quaternion {
        let n = self.norm();
        if n > 0.0 {
            Quaternion::new(self.w / n, self.x / n, self.y / n, self.z / n)
        } else {
            Quaternion::IDENTITY
        }
    }

    pub fn conjugate(&self) -> Quaternion {
        Quaternion::new(self.w, -self.x, -self.y, -self.z)
    }

    /// Rotate a vector by this quaternion (q v q*).
    pub fn rotate(&self, v: Vector3) -> Vector3 {
        let p = Quaternion::new(0.0, v.x, v.y, v.z);
        let r = *self * p * self.conjugate();
        Vector3::new(r.x, r.y, r.z)
    }

    /// Yaw-pitch-roll extraction in the aerospace Z-Y-X convention.
    ///
    /// The pitch term is clamped to `[-1, 1]` before `asin` so numerical
    /// drift near the +/-90 degree singularity cannot produce NaN.
    pub fn to_euler_zyx(&self, degrees: bool) -> EulerAngles {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));
        let pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0).asin();
        let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
        if degrees {
            EulerAngles {
                roll: roll.to_degrees(),
                pitch: pitch.to_degrees(),
                yaw: yaw.to_degrees(),
            }
        } else {
            EulerAngles { roll, pitch, yaw }
        }
    }

    /// Equivalent 4x4 homogeneous rotation matrix, bottom row `(0,0,0,1)`.
    pub fn to_matrix4(&self) -> Matrix4 {
        let (w, x, y, z) = (self.w, self.x, self.y, self.z);
        [
            [
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y - z * w),
                2.0 * (x * z + y * w),
                0.0,
            ],
            [
                2.0 * (x * y + z * w),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z - x * w),
                0.0,
            ],
            [
                2.0 * (x * z - y * w),
                2.0 * (y * z + x * w),
                1.0 - 2.0 * (x * x + y * y),
                0.0,
            ],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Quaternion;

    /// Hamilton product.
    fn mul(self, rhs: Quaternion) -> Quaternion {
        Quaternion::new(
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        )
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quaternion(w={}, x={}, y={}, z={})",
            self.w, self.x, self.y, self.z
        )
    }
}

/// Orientation as Euler angles. Radians unless produced with `degrees = true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl fmt::Display for EulerAngles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EulerAngles(roll={}, pitch={}, yaw={})",
            self.roll, self.pitch, self.yaw
        )
    }
}

/// One decoded sensor sample: magnetometer and accelerometer triples in
/// raw device units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub mag: Vector3,
    pub acc: Vector3,
}

impl Measurement {
    pub fn new(mag: Vector3, acc: Vector3) -> Self {
        Measurement { mag, acc }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Measurement(mag={}, acc={})", self.mag, self.acc)
    }
}

/// Magnetometer calibration parameters.
///
/// `center`/`scale` are the device's raw offset and gain triples and
/// `radius` its field-magnitude reference; this side of the wire only
/// transports and compares them. `is_constant` distinguishes
/// operator-configured constants from a snapshot the device reported after
/// running its own calibration routine (a report is always a constant
/// snapshot, never the live tracking mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calibration {
    pub is_constant: bool,
    pub center: [i32; 3],
    pub scale: [i32; 3],
    pub radius: i32,
}

impl Calibration {
    pub fn new(is_constant: bool, center: [i32; 3], scale: [i32; 3], radius: i32) -> Self {
        Calibration {
            is_constant,
            center,
            scale,
            radius,
        }
    }
}

impl fmt::Display for Calibration {
    /// Same field order as the wire format the firmware emits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Calibration: {}, {}, {}, {}, {}, {}, {} (constant={})",
            self.center[0],
            self.center[1],
            self.center[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
            self.radius,
            self.is_constant
        )
    }
}

/// Calibration intent as stored in the configuration store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, AsRefStr)]
pub enum CalibrationMode {
    #[strum(serialize = "constant")]
    Constant,
    #[strum(serialize = "device")]
    DeviceTracking,
}

impl CalibrationMode {
    /// `"constant"` selects constant calibration; anything else is read as
    /// a device-tracking (recalibration) request.
    pub fn from_value(value: &str) -> Self {
        if value == CalibrationMode::Constant.as_ref() {
            CalibrationMode::Constant
        } else {
            if value != CalibrationMode::DeviceTracking.as_ref() {
                log::debug!("calibration_type {:?} read as a device-tracking request", value);
            }
            CalibrationMode::DeviceTracking
        }
    }
}

/// Unit tag attached to published scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, AsRefStr)]
pub enum Unit {
    #[strum(serialize = "rad")]
    Radian,
    #[strum(serialize = "deg")]
    Degree,
}

/// A square RGB frame for the pixel-stream side of the telemetry sink.
///
/// The sink contract requires `bytes.len() == side_length^2 * 3`; the
/// constructors reject anything else so a malformed frame never reaches a
/// publish call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFrame {
    pub offset: u32,
    pub side_length: u32,
    pub bytes: Vec<u8>,
}

impl PixelFrame {
    pub fn new(offset: u32, side_length: u32, bytes: Vec<u8>) -> Result<Self, crate::AttitudeError> {
        let expected = side_length as usize * side_length as usize * 3;
        if bytes.len() != expected {
            return Err(crate::AttitudeError::Frame(format!(
                "expected {} bytes for side length {}, got {}",
                expected,
                side_length,
                bytes.len()
            )));
        }
        Ok(PixelFrame {
            offset,
            side_length,
            bytes,
        })
    }

    /// Build a frame from raw RGB bytes, deriving the side length. The
    /// pixel count must be a perfect square.
    pub fn from_rgb(offset: u32, bytes: Vec<u8>) -> Result<Self, crate::AttitudeError> {
        if bytes.len() % 3 != 0 {
            return Err(crate::AttitudeError::Frame(format!(
                "{} bytes is not a whole number of RGB pixels",
                bytes.len()
            )));
        }
        let pixels = bytes.len() / 3;
        let side = (pixels as f64).sqrt().round() as usize;
        if side * side != pixels {
            return Err(crate::AttitudeError::Frame(format!(
                "{} pixels is not a perfect square",
                pixels
            )));
        }
        Ok(PixelFrame {
            offset,
            side_length: side as u32,
            bytes,
        })
    }
}
