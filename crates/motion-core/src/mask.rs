//! Spatial weighting mask.
//!
//! A 5x5 hand-authored kernel is stretched to the frame size once per
//! session with bilinear interpolation. Energy images are divided by it,
//! so high kernel values suppress motion and low values let it through.
//! Every mask value is at least 1, which keeps the divide safe.

use dynso_common::config::{MaskEmphasis, MaskKernel};
use image::imageops::{self, FilterType};
use image::Luma;

use crate::frame::EnergyImage;

const KERNEL_SIDE: u32 = 5;

#[rustfmt::skip]
const CONE: [f32; 25] = [
    1.0, 1.0, 2.0, 1.0, 1.0,
    1.0, 2.0, 3.0, 2.0, 1.0,
    2.0, 3.0, 4.0, 3.0, 2.0,
    1.0, 2.0, 3.0, 2.0, 1.0,
    1.0, 1.0, 2.0, 1.0, 1.0,
];

#[rustfmt::skip]
const PYRAMID: [f32; 25] = [
    1.0, 1.0, 1.0, 1.0, 1.0,
    1.0, 2.0, 2.0, 2.0, 1.0,
    1.0, 2.0, 3.0, 2.0, 1.0,
    1.0, 2.0, 2.0, 2.0, 1.0,
    1.0, 1.0, 1.0, 1.0, 1.0,
];

/// Per-pixel divisor plane, fixed for a session.
#[derive(Debug, Clone)]
pub struct SpatialMask {
    plane: EnergyImage,
}

impl SpatialMask {
    /// Build the mask for frames of `dimensions`.
    pub fn new(kernel: MaskKernel, emphasis: MaskEmphasis, dimensions: (u32, u32)) -> Self {
        let values = oriented_kernel(kernel, emphasis);
        let peak = values.iter().copied().fold(f32::MIN, f32::max);

        // Resampling clamps float samples to [0, 1], so stretch a
        // normalized kernel and scale it back afterwards.
        let small = EnergyImage::from_fn(KERNEL_SIDE, KERNEL_SIDE, |x, y| {
            Luma([values[(y * KERNEL_SIDE + x) as usize] / peak])
        });
        let (width, height) = dimensions;
        let mut plane = imageops::resize(&small, width, height, FilterType::Triangle);
        for value in plane.iter_mut() {
            *value = (*value * peak).max(1.0);
        }

        tracing::debug!(
            ?kernel,
            ?emphasis,
            width,
            height,
            "Built spatial mask"
        );
        Self { plane }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.plane.dimensions()
    }

    /// Divisor at a pixel, or `None` outside the mask.
    pub fn value(&self, x: u32, y: u32) -> Option<f32> {
        let (w, h) = self.plane.dimensions();
        if x >= w || y >= h {
            return None;
        }
        Some(self.plane.get_pixel(x, y)[0])
    }

    /// Smallest and largest divisor in the plane.
    pub fn range(&self) -> (f32, f32) {
        self.plane
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }

    /// Divide `energy` by the mask in place.
    pub fn apply(&self, energy: &mut EnergyImage) {
        debug_assert_eq!(energy.dimensions(), self.plane.dimensions());
        for (e, m) in energy.iter_mut().zip(self.plane.iter()) {
            *e /= *m;
        }
    }
}

/// Kernel values, inverted when the centre should be favoured.
fn oriented_kernel(kernel: MaskKernel, emphasis: MaskEmphasis) -> [f32; 25] {
    let base = match kernel {
        MaskKernel::Cone => CONE,
        MaskKernel::Pyramid => PYRAMID,
    };
    match emphasis {
        MaskEmphasis::Edges => base,
        MaskEmphasis::Center => {
            let lo = base.iter().copied().fold(f32::MAX, f32::min);
            let hi = base.iter().copied().fold(f32::MIN, f32::max);
            base.map(|v| hi + lo - v)
        }
    }
}
