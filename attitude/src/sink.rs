//! Telemetry sink stand-ins.

use attitude_traits::{AttitudeError, PixelFrame, TelemetrySink, Unit};
use chrono::{DateTime, Utc};

/// Sink that emits telemetry as structured trace events.
///
/// Useful for headless runs and debugging; deployments swap in whatever
/// telemetry client they publish to.
#[derive(Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn clear(&mut self, name: &str) -> Result<(), AttitudeError> {
        tracing::debug!(stream = name, "clearing stream");
        Ok(())
    }

    fn publish_scalar(
        &mut self,
        name: &str,
        timestamp: DateTime<Utc>,
        value: f64,
        unit: Unit,
    ) -> Result<(), AttitudeError> {
        tracing::debug!(stream = name, %timestamp, value, unit = %unit, "scalar");
        Ok(())
    }

    fn publish_frame(&mut self, name: &str, frame: &PixelFrame) -> Result<(), AttitudeError> {
        tracing::trace!(
            stream = name,
            side_length = frame.side_length,
            bytes = frame.bytes.len(),
            "frame"
        );
        Ok(())
    }
}
