//! Minimal software renderer for the orientation boundary.
//!
//! Draws the three rotated body axes as colored segments over a dark
//! background, orthographically projected. A stand-in for the external
//! visualization engine, which consumes the same 4x4 transform; it exists
//! so the pixel-frame contract can be exercised end to end without a GPU.

use attitude_traits::{AttitudeError, Matrix4, OrientationRenderer};

pub const DEFAULT_SIDE_LENGTH: u32 = 400;

const BACKGROUND: [u8; 3] = [12, 12, 16];
/// Body x/y/z axes in red/green/blue.
const AXES: [([f64; 3], [u8; 3]); 3] = [
    ([1.0, 0.0, 0.0], [230, 70, 70]),
    ([0.0, 1.0, 0.0], [70, 230, 70]),
    ([0.0, 0.0, 1.0], [70, 110, 230]),
];
/// Axis length as a fraction of the half frame.
const AXIS_SCALE: f64 = 0.9;

pub struct AxesRenderer {
    side: u32,
}

impl AxesRenderer {
    pub fn new(side_length: u32) -> Self {
        AxesRenderer { side: side_length }
    }
}

impl Default for AxesRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SIDE_LENGTH)
    }
}

impl OrientationRenderer for AxesRenderer {
    fn side_length(&self) -> u32 {
        self.side
    }

    fn render(&mut self, transform: &Matrix4) -> Result<Vec<u8>, AttitudeError> {
        let side = self.side as usize;
        if side == 0 {
            return Err(AttitudeError::Render("side length must be positive".to_string()));
        }

        let mut rgb = Vec::with_capacity(side * side * 3);
        for _ in 0..side * side {
            rgb.extend_from_slice(&BACKGROUND);
        }

        for (axis, color) in AXES {
            let tip = rotate(transform, axis);
            draw_segment(&mut rgb, side, tip, color);
        }
        Ok(rgb)
    }
}

/// Apply the rotation part of the homogeneous transform.
fn rotate(m: &Matrix4, v: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (row, slot) in out.iter_mut().enumerate() {
        *slot = m[row][0] * v[0] + m[row][1] * v[1] + m[row][2] * v[2];
    }
    out
}

/// Draw a segment from the frame center towards `tip`, dropping the z
/// component (orthographic view down the z axis, +y up on screen).
fn draw_segment(rgb: &mut [u8], side: usize, tip: [f64; 3], color: [u8; 3]) {
    let center = (side as f64 - 1.0) / 2.0;
    let scale = AXIS_SCALE * center;
    let steps = side.max(2);
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = (center + t * tip[0] * scale).round();
        let y = (center - t * tip[1] * scale).round();
        if x < 0.0 || y < 0.0 || x >= side as f64 || y >= side as f64 {
            continue;
        }
        let index = (y as usize * side + x as usize) * 3;
        rgb[index..index + 3].copy_from_slice(&color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attitude_traits::{PixelFrame, Quaternion};

    #[test]
    fn test_render_fills_contract_sized_buffer() {
        let mut renderer = AxesRenderer::new(64);
        let bytes = renderer.render(&Quaternion::IDENTITY.to_matrix4()).unwrap();
        assert_eq!(bytes.len(), 64 * 64 * 3);

        let frame = PixelFrame::from_rgb(0, bytes).unwrap();
        assert_eq!(frame.side_length, 64);
    }

    #[test]
    fn test_render_draws_something() {
        let mut renderer = AxesRenderer::new(32);
        let bytes = renderer.render(&Quaternion::IDENTITY.to_matrix4()).unwrap();
        let touched = bytes
            .chunks_exact(3)
            .filter(|px| *px != BACKGROUND)
            .count();
        assert!(touched > 0);
    }

    #[test]
    fn test_zero_side_is_rejected() {
        let mut renderer = AxesRenderer::new(0);
        assert!(renderer.render(&Quaternion::IDENTITY.to_matrix4()).is_err());
    }
}
