//! Reconciliation of configured calibration intent with device state.
//!
//! Device-tracking mode is edge-triggered: configuring it asks the sensor
//! to run its on-device calibration routine once, after which the mode flag
//! is flipped straight back to `constant`. The device answers later (the
//! routine involves physically waving the board around) with a
//! `Calibration:` report that is written back to the store, closing the
//! loop without ever blocking a tick.

use attitude_traits::{
    AttitudeError, Calibration, CalibrationMode, ConfigStore, LineTransport,
};
use log::{info, warn};
use serial_lsm303::RECALIBRATE_COMMAND;

use crate::config::{defaults, keys};

pub struct CalibrationReconciler {
    last: Option<Calibration>,
    /// A recalibration command has been sent and no report has come back
    /// yet. The mode flag is already reset by then, so a request raced
    /// into that window would otherwise vanish without a trace.
    pending: bool,
}

impl CalibrationReconciler {
    pub fn new() -> Self {
        CalibrationReconciler {
            last: None,
            pending: false,
        }
    }

    /// Compare the externally configured calibration against the last
    /// accepted one. On change, adopt it; a device-tracking request
    /// additionally sends the recalibration command and resets the stored
    /// mode to `constant` (one-shot trigger, not a persistent state).
    pub fn observe_desired<C, T>(&mut self, store: &mut C, transport: &mut T) -> Result<(), AttitudeError>
    where
        C: ConfigStore,
        T: LineTransport,
    {
        let desired = read_desired(store)?;
        if self.last.as_ref() == Some(&desired) {
            return Ok(());
        }
        info!("Updated calibration: {}", desired);
        self.last = Some(desired);

        if !desired.is_constant {
            if self.pending {
                warn!("recalibration requested while a previous request is still outstanding");
            }
            transport.write_all(RECALIBRATE_COMMAND)?;
            self.pending = true;
            store.set_str(keys::CALIBRATION_TYPE, CalibrationMode::Constant.as_ref())?;
        }
        Ok(())
    }

    /// Absorb a calibration report from the device: all seven numeric
    /// fields go back into the store unchanged and the mode is forced to
    /// `constant`, making the device's answer the new configured state.
    pub fn observe_device_report<C>(&mut self, store: &mut C, report: &Calibration) -> Result<(), AttitudeError>
    where
        C: ConfigStore,
    {
        info!("Device reported calibration: {}", report);
        store.set_i32(keys::CENTER_X, report.center[0])?;
        store.set_i32(keys::CENTER_Y, report.center[1])?;
        store.set_i32(keys::CENTER_Z, report.center[2])?;
        store.set_i32(keys::SCALE_X, report.scale[0])?;
        store.set_i32(keys::SCALE_Y, report.scale[1])?;
        store.set_i32(keys::SCALE_Z, report.scale[2])?;
        store.set_i32(keys::RADIUS, report.radius)?;
        store.set_str(keys::CALIBRATION_TYPE, CalibrationMode::Constant.as_ref())?;

        self.pending = false;
        self.last = Some(*report);
        Ok(())
    }
}

impl Default for CalibrationReconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the candidate calibration from the store's current values.
fn read_desired<C: ConfigStore>(store: &C) -> Result<Calibration, AttitudeError> {
    let mode = CalibrationMode::from_value(&store.get_str(keys::CALIBRATION_TYPE, defaults::CALIBRATION_TYPE)?);
    Ok(Calibration {
        is_constant: mode == CalibrationMode::Constant,
        center: [
            store.get_i32(keys::CENTER_X, defaults::CENTER[0])?,
            store.get_i32(keys::CENTER_Y, defaults::CENTER[1])?,
            store.get_i32(keys::CENTER_Z, defaults::CENTER[2])?,
        ],
        scale: [
            store.get_i32(keys::SCALE_X, defaults::SCALE[0])?,
            store.get_i32(keys::SCALE_Y, defaults::SCALE[1])?,
            store.get_i32(keys::SCALE_Z, defaults::SCALE[2])?,
        ],
        radius: store.get_i32(keys::RADIUS, defaults::RADIUS)?,
    })
}
