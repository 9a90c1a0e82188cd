//! The fixed-cadence tick loop tying transport, parser, reconciler,
//! estimator, renderer and sink together.
//!
//! Data flows strictly forward; all coordination state lives here. One
//! tick handles at most one line, and nothing a single bad frame can do
//! will stop the loop: per-line failures are logged and the next tick
//! carries on with the previous attitude.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use attitude_traits::{
    AttitudeError, ConfigStore, LineTransport, Measurement, OrientationRenderer, PixelFrame,
    TelemetrySink, Unit,
};
use chrono::Utc;
use log::{debug, info, warn};
use serial_lsm303::{parse_line, Frame};

use crate::fusion::OrientationEstimator;
use crate::reconcile::CalibrationReconciler;

pub const DEFAULT_TICK: Duration = Duration::from_millis(10);

/// Stream names on the telemetry sink.
pub mod streams {
    pub const FRAME_BUFFER: &str = "frame_buffer";
    pub const YAW: &str = "yaw";
    pub const PITCH: &str = "pitch";
    pub const ROLL: &str = "roll";
}

pub struct AttitudeStreamer<T, C, S, R> {
    transport: T,
    config: C,
    sink: S,
    renderer: R,
    estimator: OrientationEstimator,
    reconciler: CalibrationReconciler,
    degrees: bool,
    last_sample: Option<Instant>,
    running: Arc<AtomicBool>,
}

impl<T, C, S, R> AttitudeStreamer<T, C, S, R>
where
    T: LineTransport,
    C: ConfigStore,
    S: TelemetrySink,
    R: OrientationRenderer,
{
    /// `degrees` selects the unit of the published angle streams; the
    /// estimator itself always works in radians.
    pub fn new(transport: T, config: C, sink: S, renderer: R, degrees: bool) -> Self {
        AttitudeStreamer {
            transport,
            config,
            sink,
            renderer,
            estimator: OrientationEstimator::new(),
            reconciler: CalibrationReconciler::new(),
            degrees,
            last_sample: None,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn estimator(&self) -> &OrientationEstimator {
        &self.estimator
    }

    /// Handle to request a cooperative stop of [`run`](Self::run).
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// One scheduling tick: reconcile configured calibration, then pull
    /// and dispatch at most one line.
    pub fn tick(&mut self) -> Result<(), AttitudeError> {
        self.reconciler
            .observe_desired(&mut self.config, &mut self.transport)?;

        let line = match self.transport.read_line()? {
            Some(line) => line,
            None => return Ok(()),
        };
        match parse_line(&line) {
            Some(Frame::Measurement(measurement)) => self.publish_measurement(&measurement)?,
            Some(Frame::Calibration(report)) => self
                .reconciler
                .observe_device_report(&mut self.config, &report)?,
            None => {}
        }
        Ok(())
    }

    fn publish_measurement(&mut self, measurement: &Measurement) -> Result<(), AttitudeError> {
        let now = Instant::now();
        if let Some(previous) = self.last_sample.replace(now) {
            // Instrumentation only; the fusion step is stateless per sample.
            debug!(
                "sample interval: {:.1} ms",
                now.duration_since(previous).as_secs_f64() * 1e3
            );
        }

        if !self.estimator.update(measurement) {
            // Degenerate sample, already warned; hold the last output.
            return Ok(());
        }

        let angles = self.estimator.euler_zyx(self.degrees);
        let timestamp = Utc::now();

        let pixels = self.renderer.render(&self.estimator.matrix4())?;
        let frame = PixelFrame::from_rgb(0, pixels)?;
        self.sink.publish_frame(streams::FRAME_BUFFER, &frame)?;

        let unit = if self.degrees { Unit::Degree } else { Unit::Radian };
        self.sink
            .publish_scalar(streams::YAW, timestamp, angles.yaw, unit)?;
        self.sink
            .publish_scalar(streams::PITCH, timestamp, angles.pitch, unit)?;
        self.sink
            .publish_scalar(streams::ROLL, timestamp, angles.roll, unit)?;
        Ok(())
    }

    /// Drive ticks at the given cadence until the stop flag clears.
    ///
    /// Startup clears the output streams; after that every tick error is
    /// absorbed and logged, never fatal.
    pub fn run(&mut self, interval: Duration) -> Result<(), AttitudeError> {
        info!("Starting attitude stream");
        self.sink.clear(streams::FRAME_BUFFER)?;
        self.sink.clear(streams::YAW)?;
        self.sink.clear(streams::PITCH)?;
        self.sink.clear(streams::ROLL)?;

        while self.running.load(Ordering::SeqCst) {
            let started = Instant::now();
            if let Err(e) = self.tick() {
                warn!("tick failed: {}", e);
            }
            if let Some(remaining) = interval.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }
        }
        info!("Attitude stream stopped");
        Ok(())
    }
}
