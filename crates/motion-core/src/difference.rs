//! Frame differencing: two consecutive frames in, one motion-energy image out.

use dynso_common::config::{DifferenceStrategy, FlowCombine};
use dynso_common::error::DynsoResult;
use image::imageops;

use crate::flow::LucasKanade;
use crate::frame::{ensure_dimensions, EnergyImage, FlowField, Frame};

/// Produces motion-energy images for a fixed frame size.
#[derive(Debug, Clone)]
pub struct FrameDifferencer {
    strategy: DifferenceStrategy,
    mirror: bool,
    dimensions: (u32, u32),
}

impl FrameDifferencer {
    pub fn new(strategy: DifferenceStrategy, mirror: bool, dimensions: (u32, u32)) -> Self {
        Self {
            strategy,
            mirror,
            dimensions,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// Check a frame against the session size. Run once per session, not per frame.
    pub fn ensure_compatible(&self, frame: &Frame) -> DynsoResult<()> {
        ensure_dimensions(self.dimensions, frame)
    }

    /// Motion energy between `previous` and `current`, mirrored if configured.
    ///
    /// Both frames must have the session dimensions.
    pub fn difference(&self, current: &Frame, previous: &Frame) -> EnergyImage {
        let mut energy = match self.strategy {
            DifferenceStrategy::Absolute => absolute_difference(current, previous),
            DifferenceStrategy::Brightening => brightening_difference(current, previous),
            DifferenceStrategy::FlowMagnitude { combine, window } => {
                let flow = LucasKanade::new(window).estimate(previous, current);
                flow_energy(&flow, combine)
            }
        };
        if self.mirror {
            imageops::flip_horizontal_in_place(&mut energy);
        }
        energy
    }
}

/// `|current - previous|` per pixel.
pub fn absolute_difference(current: &Frame, previous: &Frame) -> EnergyImage {
    zip_pixels(current, previous, |c, p| c.abs_diff(p) as f32)
}

/// `max(current - previous, 0)` per pixel.
pub fn brightening_difference(current: &Frame, previous: &Frame) -> EnergyImage {
    zip_pixels(current, previous, |c, p| c.saturating_sub(p) as f32)
}

/// Fold a flow field into per-pixel energy.
pub fn flow_energy(flow: &FlowField, combine: FlowCombine) -> EnergyImage {
    let (w, h) = flow.dimensions();
    let mut energy = EnergyImage::new(w, h);
    for (out, (vx, vy)) in energy.iter_mut().zip(flow.vectors()) {
        let (ax, ay) = (vx.abs(), vy.abs());
        *out = match combine {
            FlowCombine::Product => ax * ay,
            FlowCombine::WeightedMean { x_weight } => {
                let wx = x_weight as f32;
                wx * ax + (1.0 - wx) * ay
            }
        };
    }
    energy
}

fn zip_pixels(current: &Frame, previous: &Frame, op: impl Fn(u8, u8) -> f32) -> EnergyImage {
    let (w, h) = current.dimensions();
    let mut energy = EnergyImage::new(w, h);
    for (out, (&c, &p)) in energy
        .iter_mut()
        .zip(current.as_raw().iter().zip(previous.as_raw()))
    {
        *out = op(c, p);
    }
    energy
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn frame(width: u32, height: u32, values: &[u8]) -> Frame {
        Frame::from_raw(width, height, values.to_vec()).unwrap()
    }

    #[test]
    fn absolute_difference_is_symmetric() {
        let a = frame(2, 1, &[10, 200]);
        let b = frame(2, 1, &[30, 50]);
        let ab = absolute_difference(&a, &b);
        let ba = absolute_difference(&b, &a);
        assert_eq!(ab.as_raw(), &vec![20.0, 150.0]);
        assert_eq!(ab.as_raw(), ba.as_raw());
    }

    #[test]
    fn brightening_ignores_darkening() {
        let current = frame(2, 1, &[10, 200]);
        let previous = frame(2, 1, &[30, 50]);
        let energy = brightening_difference(&current, &previous);
        assert_eq!(energy.as_raw(), &vec![0.0, 150.0]);
    }

    #[test]
    fn mirror_flips_left_and_right() {
        let previous = frame(4, 1, &[0, 0, 0, 0]);
        let current = frame(4, 1, &[255, 0, 0, 0]);

        let plain = FrameDifferencer::new(DifferenceStrategy::Absolute, false, (4, 1));
        let mirrored = FrameDifferencer::new(DifferenceStrategy::Absolute, true, (4, 1));

        assert_eq!(plain.difference(&current, &previous).get_pixel(0, 0), &Luma([255.0]));
        let flipped = mirrored.difference(&current, &previous);
        assert_eq!(flipped.get_pixel(0, 0), &Luma([0.0]));
        assert_eq!(flipped.get_pixel(3, 0), &Luma([255.0]));
    }

    #[test]
    fn flow_energy_combines_components() {
        let field = FlowField::from_planes(2, 1, vec![2.0, -3.0], vec![-4.0, 0.5]).unwrap();

        let product = flow_energy(&field, FlowCombine::Product);
        assert_eq!(product.as_raw(), &vec![8.0, 1.5]);

        let mean = flow_energy(&field, FlowCombine::WeightedMean { x_weight: 0.5 });
        assert_eq!(mean.as_raw(), &vec![3.0, 1.75]);
    }

    #[test]
    fn compatibility_check_catches_resized_frames() {
        let differencer = FrameDifferencer::new(DifferenceStrategy::Absolute, true, (4, 3));
        assert!(differencer.ensure_compatible(&Frame::new(4, 3)).is_ok());
        assert!(differencer.ensure_compatible(&Frame::new(3, 4)).is_err());
    }

    #[test]
    fn flow_strategy_is_still_on_static_frames() {
        let still = Frame::from_fn(12, 12, |x, y| Luma([((x * x + y * y) / 2) as u8]));
        let differencer = FrameDifferencer::new(
            DifferenceStrategy::FlowMagnitude {
                combine: FlowCombine::WeightedMean { x_weight: 0.5 },
                window: 5,
            },
            true,
            (12, 12),
        );
        let energy = differencer.difference(&still, &still);
        assert!(energy.pixels().all(|p| p[0] == 0.0));
    }
}
