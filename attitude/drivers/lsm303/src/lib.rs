//! Serial driver for LSM303 compass boards streaming ASCII telemetry.
//!
//! The firmware emits CR/LF-terminated `Measurement:` and `Calibration:`
//! lines at a fixed rate and accepts a one-shot `SCAL` command that starts
//! its on-device calibration routine.

pub mod frame;

pub use frame::{parse_line, Frame};

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::time::Duration;

use attitude_traits::{AttitudeError, LineTransport};
use log::{info, warn};
use serialport::SerialPort;

/// Command understood by the firmware: run the on-device calibration
/// routine and report the result as a `Calibration:` line.
pub const RECALIBRATE_COMMAND: &[u8] = b"SCAL\r";

pub const DEFAULT_PORT: &str = "/dev/ttyACM0";
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Reads are gated on `bytes_to_read`, so this only bounds a transfer that
/// stalls mid-chunk.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// No firmware line comes close to this; a run of bytes without a
/// terminator is dropped instead of growing the buffer without bound.
const MAX_LINE_BYTES: usize = 1024;

/// Accumulates raw transport bytes and splits off complete lines with the
/// CR/LF terminator removed. Bytes that are not valid UTF-8 are replaced,
/// which is harmless here: such a line matches neither grammar and is
/// skipped downstream.
#[derive(Debug, Default)]
pub struct LineBuffer {
    partial: Vec<u8>,
    lines: VecDeque<String>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            if byte == b'\n' {
                let line = String::from_utf8_lossy(&self.partial)
                    .trim_end_matches('\r')
                    .to_string();
                self.lines.push_back(line);
                self.partial.clear();
            } else {
                self.partial.push(byte);
                if self.partial.len() > MAX_LINE_BYTES {
                    warn!(
                        "dropping {} buffered bytes with no line terminator",
                        self.partial.len()
                    );
                    self.partial.clear();
                }
            }
        }
    }

    pub fn pop_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

pub struct Lsm303 {
    port: Box<dyn SerialPort>,
    buffer: LineBuffer,
}

impl Lsm303 {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, AttitudeError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()?;
        info!("Successfully opened {}", port_name);
        Ok(Lsm303 {
            port,
            buffer: LineBuffer::new(),
        })
    }

    /// Pull every byte the port already holds into the line buffer. A
    /// quiet port returns immediately instead of waiting out the read
    /// timeout.
    fn fill_buffer(&mut self) -> Result<(), AttitudeError> {
        while self.port.bytes_to_read()? > 0 {
            let mut chunk = [0u8; 256];
            let n = self.port.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            self.buffer.push_bytes(&chunk[..n]);
        }
        Ok(())
    }
}

impl LineTransport for Lsm303 {
    fn read_line(&mut self) -> Result<Option<String>, AttitudeError> {
        self.fill_buffer()?;
        Ok(self.buffer.pop_line())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), AttitudeError> {
        self.port.write_all(bytes)?;
        Ok(())
    }
}
