//! Frame and energy image types.

use dynso_common::error::{DynsoError, DynsoResult};
use image::{GrayImage, ImageBuffer, Luma};

/// One grayscale capture, 8 bits per sample.
pub type Frame = GrayImage;

/// Non-negative per-pixel motion energy, same dimensions as the frames it
/// was derived from.
pub type EnergyImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Fail with `DimensionMismatch` unless `frame` has the session size.
pub fn ensure_dimensions(expected: (u32, u32), frame: &Frame) -> DynsoResult<()> {
    let actual = frame.dimensions();
    if actual != expected {
        return Err(DynsoError::dimension_mismatch(expected, actual));
    }
    Ok(())
}

/// Dense per-pixel velocity field between two frames.
#[derive(Debug, Clone)]
pub struct FlowField {
    width: u32,
    height: u32,
    vx: Vec<f32>,
    vy: Vec<f32>,
}

impl FlowField {
    /// Build a field from row-major velocity planes.
    ///
    /// Returns `None` when a plane does not hold `width * height` samples.
    pub fn from_planes(width: u32, height: u32, vx: Vec<f32>, vy: Vec<f32>) -> Option<Self> {
        let len = width as usize * height as usize;
        if vx.len() != len || vy.len() != len {
            return None;
        }
        Some(Self {
            width,
            height,
            vx,
            vy,
        })
    }

    /// Build a field from planes already sized to `width * height`.
    pub(crate) fn from_parts(width: u32, height: u32, vx: Vec<f32>, vy: Vec<f32>) -> Self {
        debug_assert_eq!(vx.len(), width as usize * height as usize);
        debug_assert_eq!(vy.len(), vx.len());
        Self {
            width,
            height,
            vx,
            vy,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Velocity at a pixel, or `None` outside the field.
    pub fn at(&self, x: u32, y: u32) -> Option<(f32, f32)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.width as usize + x as usize;
        Some((self.vx[idx], self.vy[idx]))
    }

    /// Iterate `(vx, vy)` pairs in row-major order.
    pub fn vectors(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.vx.iter().copied().zip(self.vy.iter().copied())
    }
}
