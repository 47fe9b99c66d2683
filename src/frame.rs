//! Camera frames as seen by the recognition pipeline.
//!
//! A `Frame` is opaque to everything except the landmark source and image
//! classifiers: it carries packed RGB bytes, dimensions, the rotation reported
//! by the camera, and a capture sequence number used to order results.

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

pub struct Frame {
    /// Packed RGB8, row-major.
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Clockwise rotation (0, 90, 180, 270) that turns the buffer upright.
    pub rotation_degrees: u16,
    /// Monotonic capture sequence assigned by the frame source.
    pub sequence: u64,
    capture_instant: Instant,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            rotation_degrees: 0,
            sequence,
            capture_instant: Instant::now(),
        })
    }

    /// Black frame; used by synthetic sources and tests.
    pub fn blank(width: u32, height: u32, sequence: u64) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 3],
            width,
            height,
            rotation_degrees: 0,
            sequence,
            capture_instant: Instant::now(),
        }
    }

    pub fn with_rotation(mut self, degrees: u16) -> Self {
        self.rotation_degrees = degrees % 360;
        self
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn age(&self) -> Duration {
        self.capture_instant.elapsed()
    }

    /// Dimensions after applying `rotation_degrees`.
    pub fn oriented_size(&self) -> (u32, u32) {
        match self.rotation_degrees {
            90 | 270 => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }

    /// RGB at `(x, y)` of the upright image, in `oriented_size` coordinates.
    pub fn upright_rgb(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let (ow, oh) = self.oriented_size();
        if x >= ow || y >= oh {
            return None;
        }
        let (w, h) = (self.width, self.height);
        let (sx, sy) = match self.rotation_degrees {
            90 => (y, h - 1 - x),
            180 => (w - 1 - x, h - 1 - y),
            270 => (w - 1 - y, x),
            _ => (x, y),
        };
        let idx = (sy as usize * w as usize + sx as usize) * 3;
        let px = self.data.get(idx..idx + 3)?;
        Some([px[0], px[1], px[2]])
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rotation_degrees", &self.rotation_degrees)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}
