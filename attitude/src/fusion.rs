//! Accelerometer + magnetometer orientation fusion.

use attitude_traits::{EulerAngles, Matrix4, Measurement, Quaternion, Vector3};
use log::warn;

/// Horizontal reference the heading factor aligns against: local magnetic
/// north. Yaw is relative to magnetic, not true, north.
const NORTH_REF: (f64, f64) = (1.0, 0.0);

/// Owns the running orientation quaternion and refreshes it from each
/// accepted sample pair.
///
/// Every update is an absolute estimate computed from a single
/// accelerometer + magnetometer pair; no rate data is integrated, so a
/// skipped sample simply leaves the previous attitude in place.
pub struct OrientationEstimator {
    q: Quaternion,
}

impl OrientationEstimator {
    pub fn new() -> Self {
        OrientationEstimator {
            q: Quaternion::IDENTITY,
        }
    }

    pub fn quaternion(&self) -> Quaternion {
        self.q
    }

    /// Fuse one sample. Returns `false`, leaving the attitude untouched,
    /// when either vector is zero: a zero reading carries no direction and
    /// usually means a disconnected sensor.
    pub fn update(&mut self, measurement: &Measurement) -> bool {
        let Some(acc) = measurement.acc.normalized() else {
            warn!("Zero accelerometer reading, skipping update");
            return false;
        };
        let Some(mag) = measurement.mag.normalized() else {
            warn!("Zero magnetometer reading, skipping update");
            return false;
        };
        self.q = factored_quaternion(acc, mag);
        true
    }

    pub fn euler_zyx(&self, degrees: bool) -> EulerAngles {
        self.q.to_euler_zyx(degrees)
    }

    pub fn matrix4(&self) -> Matrix4 {
        self.q.to_matrix4()
    }
}

impl Default for OrientationEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Factored quaternion estimation from one unit accelerometer vector and
/// one unit magnetometer vector.
///
/// The attitude is built from three single-axis factors: elevation (pitch)
/// from the accelerometer's x component, roll from its y/z components, and
/// azimuth from the magnetometer rotated into the earth frame and projected
/// onto the horizontal plane, aligned against [`NORTH_REF`].
fn factored_quaternion(acc: Vector3, mag: Vector3) -> Quaternion {
    // Elevation factor.
    let sin_theta = acc.x.clamp(-1.0, 1.0);
    let cos_theta = (1.0 - sin_theta * sin_theta).sqrt();
    let (sin_half, cos_half) = half_angle(sin_theta, cos_theta);
    let q_elevation = Quaternion::new(cos_half, 0.0, sin_half, 0.0);

    // Roll factor; the division is undefined when the board points
    // straight up or down, where roll is unobservable anyway.
    let (sin_phi, cos_phi) = if cos_theta == 0.0 {
        (0.0, 0.0)
    } else {
        (-acc.y / cos_theta, -acc.z / cos_theta)
    };
    let (sin_half, cos_half) = half_angle(sin_phi, cos_phi);
    let q_roll = Quaternion::new(cos_half, sin_half, 0.0, 0.0);

    let q_tilt = (q_elevation * q_roll).normalized();

    // Azimuth factor.
    let earth_mag = q_tilt.rotate(mag);
    let horizontal = (earth_mag.x * earth_mag.x + earth_mag.y * earth_mag.y).sqrt();
    if horizontal == 0.0 {
        warn!("Magnetic field parallel to gravity, heading unobservable");
        return q_tilt;
    }
    let mx = earth_mag.x / horizontal;
    let my = earth_mag.y / horizontal;
    let (nx, ny) = NORTH_REF;
    let cos_psi = mx * nx + my * ny;
    let sin_psi = mx * ny - my * nx;
    let (sin_half, cos_half) = half_angle(sin_psi, cos_psi);
    let q_azimuth = Quaternion::new(cos_half, 0.0, 0.0, sin_half);

    (q_azimuth * q_tilt).normalized()
}

/// Half-angle sine/cosine from full-angle sine/cosine. The half-angle sine
/// takes its sign from the full-angle sine; both radicands are clamped at
/// zero against rounding just past the unit circle.
fn half_angle(sin_full: f64, cos_full: f64) -> (f64, f64) {
    if sin_full == 0.0 && cos_full <= -1.0 {
        // Exactly 180 degrees; pick the positive half-angle.
        return (1.0, 0.0);
    }
    let sin_half = sign(sin_full) * ((1.0 - cos_full) / 2.0).max(0.0).sqrt();
    let cos_half = ((1.0 + cos_full) / 2.0).max(0.0).sqrt();
    (sin_half, cos_half)
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn sample(mag: (f64, f64, f64), acc: (f64, f64, f64)) -> Measurement {
        Measurement::new(
            Vector3::new(mag.0, mag.1, mag.2),
            Vector3::new(acc.0, acc.1, acc.2),
        )
    }

    #[test]
    fn test_level_north_facing_sample_is_identity() {
        let mut estimator = OrientationEstimator::new();
        assert!(estimator.update(&sample((100.0, 0.0, 0.0), (0.0, 0.0, -1000.0))));

        let q = estimator.quaternion();
        assert_relative_eq!(q.w, 1.0, epsilon = 1e-12);
        assert_relative_eq!(q.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.z, 0.0, epsilon = 1e-12);

        let e = estimator.euler_zyx(false);
        assert_relative_eq!(e.yaw, 0.0, epsilon = 1e-12);
        assert_relative_eq!(e.pitch, 0.0, epsilon = 1e-12);
        assert_relative_eq!(e.roll, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_update_produces_unit_quaternion() {
        let mut estimator = OrientationEstimator::new();
        assert!(estimator.update(&sample((300.0, 120.0, -500.0), (200.0, -400.0, -900.0))));
        assert_relative_eq!(estimator.quaternion().norm(), 1.0, epsilon = 1e-9);

        assert!(estimator.update(&sample((-80.0, 15.0, 3.0), (0.0, 1000.0, 0.0))));
        assert_relative_eq!(estimator.quaternion().norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_accelerometer_skips_update() {
        let mut estimator = OrientationEstimator::new();
        assert!(!estimator.update(&sample((100.0, 0.0, 0.0), (0.0, 0.0, 0.0))));
        assert_eq!(estimator.quaternion(), Quaternion::IDENTITY);
    }

    #[test]
    fn test_zero_magnetometer_skips_update() {
        let mut estimator = OrientationEstimator::new();
        // Seed a non-identity attitude first so "unchanged" is observable.
        assert!(estimator.update(&sample((300.0, 120.0, -500.0), (200.0, -400.0, -900.0))));
        let before = estimator.quaternion();

        assert!(!estimator.update(&sample((0.0, 0.0, 0.0), (0.0, 0.0, -1000.0))));
        assert_eq!(estimator.quaternion(), before);
    }

    #[test]
    fn test_straight_up_pitch_is_quarter_turn() {
        let mut estimator = OrientationEstimator::new();
        assert!(estimator.update(&sample((0.0, 0.0, 100.0), (1000.0, 0.0, 0.0))));
        let e = estimator.euler_zyx(false);
        assert_relative_eq!(e.pitch, FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn test_face_down_roll_is_half_turn() {
        let mut estimator = OrientationEstimator::new();
        assert!(estimator.update(&sample((100.0, 0.0, 0.0), (0.0, 0.0, 1000.0))));
        let e = estimator.euler_zyx(false);
        assert_relative_eq!(e.roll.abs(), PI, epsilon = 1e-9);
        assert_relative_eq!(e.pitch, 0.0, epsilon = 1e-9);
        assert_relative_eq!(e.yaw, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_field_parallel_to_gravity_keeps_tilt() {
        let mut estimator = OrientationEstimator::new();
        // Level board, field pointing straight down: heading is
        // unobservable but the output must stay well defined.
        assert!(estimator.update(&sample((0.0, 0.0, 100.0), (0.0, 0.0, -1000.0))));
        let q = estimator.quaternion();
        assert!(q.norm().is_finite());
        let e = estimator.euler_zyx(false);
        assert_relative_eq!(e.pitch, 0.0, epsilon = 1e-9);
        assert_relative_eq!(e.roll, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_yaw_quarter_turn() {
        // Level board with the field along -y: body x points magnetic
        // east, so yaw is -90 degrees (or +90, depending on winding).
        let mut estimator = OrientationEstimator::new();
        assert!(estimator.update(&sample((0.0, 100.0, 0.0), (0.0, 0.0, -1000.0))));
        let e = estimator.euler_zyx(false);
        assert_relative_eq!(e.yaw.abs(), FRAC_PI_2, epsilon = 1e-9);
        assert_relative_eq!(e.pitch, 0.0, epsilon = 1e-9);
        assert_relative_eq!(e.roll, 0.0, epsilon = 1e-9);
    }
}
