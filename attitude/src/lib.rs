//! Orientation streaming for serial compass telemetry.
//!
//! Ties the [`serial_lsm303`] driver to a telemetry sink: ASCII lines in,
//! reconciled calibration state plus fused attitude (Euler angles and a
//! rendered orientation frame) out, at a fixed tick cadence.

pub mod config;
pub mod fusion;
pub mod pipeline;
pub mod reconcile;
pub mod render;
pub mod sink;

pub use fusion::OrientationEstimator;
pub use pipeline::{AttitudeStreamer, DEFAULT_TICK};
pub use reconcile::CalibrationReconciler;
