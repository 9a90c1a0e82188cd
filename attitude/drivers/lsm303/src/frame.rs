//! Text frame grammars for the compass firmware's telemetry stream.
//!
//! The firmware interleaves two line kinds on the same wire:
//!
//! ```text
//! Measurement: <mag_x>, <mag_y>, <mag_z>, <acc_x>, <acc_y>, <acc_z>
//! Calibration: <center_x>, <center_y>, <center_z>, <scale_x>, <scale_y>, <scale_z>, <radius>
//! ```
//!
//! plus arbitrary diagnostic text that must be ignored, not treated as an
//! error.

use attitude_traits::{Calibration, Measurement, Vector3};
use log::warn;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// The firmware writes ", " between fields but hand-typed test strings
// often drop the space, so the separator tolerates any run of whitespace.
static MEASUREMENT_RE: Lazy<Regex> = Lazy::new(|| {
    let num = r"(-?\d+(?:\.\d+)?)";
    let sep = r",\s*";
    Regex::new(&format!(
        "Measurement: {num}{sep}{num}{sep}{num}{sep}{num}{sep}{num}{sep}{num}"
    ))
    .expect("measurement pattern compiles")
});

static CALIBRATION_RE: Lazy<Regex> = Lazy::new(|| {
    let int = r"(-?\d+)";
    let sep = r",\s*";
    // Radius is non-negative by construction.
    Regex::new(&format!(
        r"Calibration: {int}{sep}{int}{sep}{int}{sep}{int}{sep}{int}{sep}{int}{sep}(\d+)"
    ))
    .expect("calibration pattern compiles")
});

/// One classified telemetry line.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Measurement(Measurement),
    Calibration(Calibration),
}

/// Classify and decode one line (CR/LF already stripped).
///
/// Unrecognized lines yield `None`; a line that matches a grammar's shape
/// but fails numeric conversion is logged and falls through to the next
/// grammar. This never panics and never returns an error: the stream
/// carries diagnostic text that must not stall the pipeline.
pub fn parse_line(line: &str) -> Option<Frame> {
    if let Some(caps) = MEASUREMENT_RE.captures(line) {
        match decode_measurement(&caps) {
            Some(measurement) => return Some(Frame::Measurement(measurement)),
            None => warn!("Error parsing line: {}", line),
        }
    }
    if let Some(caps) = CALIBRATION_RE.captures(line) {
        match decode_calibration(&caps) {
            Some(calibration) => return Some(Frame::Calibration(calibration)),
            None => warn!("Error parsing line: {}", line),
        }
    }
    None
}

fn decode_measurement(caps: &Captures) -> Option<Measurement> {
    let mut fields = [0.0f64; 6];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = caps[i + 1].parse().ok()?;
    }
    Some(Measurement::new(
        Vector3::new(fields[0], fields[1], fields[2]),
        Vector3::new(fields[3], fields[4], fields[5]),
    ))
}

fn decode_calibration(caps: &Captures) -> Option<Calibration> {
    let mut fields = [0i32; 7];
    for (i, field) in fields.iter_mut().enumerate() {
        *field = caps[i + 1].parse().ok()?;
    }
    // A device report is a concrete snapshot, not the live tracking mode.
    Some(Calibration::new(
        true,
        [fields[0], fields[1], fields[2]],
        [fields[3], fields[4], fields[5]],
        fields[6],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_field_order() {
        let frame = parse_line("Measurement: 1.5, -2, 3.25, -4.5, 5, -6.75").unwrap();
        match frame {
            Frame::Measurement(m) => {
                assert_eq!(m.mag, Vector3::new(1.5, -2.0, 3.25));
                assert_eq!(m.acc, Vector3::new(-4.5, 5.0, -6.75));
            }
            other => panic!("expected measurement, got {:?}", other),
        }
    }

    #[test]
    fn test_measurement_integral_fields_without_separator_spaces() {
        let frame = parse_line("Measurement: 100,0,0,0,0,-1000").unwrap();
        match frame {
            Frame::Measurement(m) => {
                assert_eq!(m.mag.x, 100.0);
                assert_eq!(m.acc.z, -1000.0);
            }
            other => panic!("expected measurement, got {:?}", other),
        }
    }

    #[test]
    fn test_calibration_field_order_and_constant_tag() {
        let frame =
            parse_line("Calibration: 20962, 34322, -23924, 1203, 1177, 1133, 48098").unwrap();
        match frame {
            Frame::Calibration(c) => {
                assert!(c.is_constant);
                assert_eq!(c.center, [20962, 34322, -23924]);
                assert_eq!(c.scale, [1203, 1177, 1133]);
                assert_eq!(c.radius, 48098);
            }
            other => panic!("expected calibration, got {:?}", other),
        }
    }

    #[test]
    fn test_unrecognized_lines_are_skipped() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("Calibration done, entering busy loop"), None);
        assert_eq!(parse_line("Measurement: 1, 2, 3"), None);
        assert_eq!(parse_line("Measurement: a, b, c, d, e, f"), None);
    }

    #[test]
    fn test_negative_radius_is_rejected() {
        assert_eq!(parse_line("Calibration: 1, 2, 3, 4, 5, 6, -7"), None);
    }

    #[test]
    fn test_calibration_overflow_falls_through() {
        // Matches the calibration shape but 99999999999 does not fit an
        // i32, so the line decodes to nothing rather than panicking.
        assert_eq!(
            parse_line("Calibration: 99999999999, 2, 3, 4, 5, 6, 7"),
            None
        );
    }

    #[test]
    fn test_grammars_are_mutually_exclusive() {
        let frame = parse_line("Measurement: 1.5, 2.5, 3.5, 4.5, 5.5, 6.5").unwrap();
        assert!(matches!(frame, Frame::Measurement(_)));

        let frame = parse_line("Calibration: 1, 2, 3, 4, 5, 6, 7").unwrap();
        assert!(matches!(frame, Frame::Calibration(_)));
    }
}
