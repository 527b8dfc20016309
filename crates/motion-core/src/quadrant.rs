//! Quadrant partitioning and per-quadrant energy sums.

use serde::{Deserialize, Serialize};

use crate::frame::EnergyImage;

/// One of the four axis-aligned regions of a frame.
///
/// Declaration order is also the tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Quadrant {
    /// All quadrants in priority order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UpLeft,
        Quadrant::UpRight,
        Quadrant::DownLeft,
        Quadrant::DownRight,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Quadrant holding pixel `(x, y)` for the given split point.
    pub fn locate(x: u32, y: u32, mid_x: u32, mid_y: u32) -> Self {
        match (x < mid_x, y < mid_y) {
            (true, true) => Quadrant::UpLeft,
            (false, true) => Quadrant::UpRight,
            (true, false) => Quadrant::DownLeft,
            (false, false) => Quadrant::DownRight,
        }
    }

    /// Half-open pixel bounds `(x0, y0, x1, y1)` of this quadrant in a
    /// `width` x `height` image.
    pub fn bounds(self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let (mid_x, mid_y) = (width / 2, height / 2);
        match self {
            Quadrant::UpLeft => (0, 0, mid_x, mid_y),
            Quadrant::UpRight => (mid_x, 0, width, mid_y),
            Quadrant::DownLeft => (0, mid_y, mid_x, height),
            Quadrant::DownRight => (mid_x, mid_y, width, height),
        }
    }
}

/// Summed motion energy per quadrant, indexed by [`Quadrant::index`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QuadrantEnergies(pub [f64; 4]);

impl QuadrantEnergies {
    pub fn new(up_left: f64, up_right: f64, down_left: f64, down_right: f64) -> Self {
        Self([up_left, up_right, down_left, down_right])
    }

    pub fn get(&self, quadrant: Quadrant) -> f64 {
        self.0[quadrant.index()]
    }

    /// Largest energy.
    pub fn highest(&self) -> f64 {
        self.0.iter().copied().fold(0.0, f64::max)
    }

    /// Quadrant with the largest energy; ties go to the earlier quadrant.
    pub fn winner(&self) -> Quadrant {
        let mut best = Quadrant::UpLeft;
        for quadrant in Quadrant::ALL {
            if self.get(quadrant) > self.get(best) {
                best = quadrant;
            }
        }
        best
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// Sum the energy image over each quadrant.
pub fn aggregate(energy: &EnergyImage) -> QuadrantEnergies {
    let (width, height) = energy.dimensions();
    let (mid_x, mid_y) = (width / 2, height / 2);

    let mut sums = [0.0f64; 4];
    for (x, y, pixel) in energy.enumerate_pixels() {
        sums[Quadrant::locate(x, y, mid_x, mid_y).index()] += pixel[0] as f64;
    }
    QuadrantEnergies(sums)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn aggregate_sums_each_region() {
        // 4x2: left half 1.0, right half 10.0; bottom row doubled.
        let energy = EnergyImage::from_fn(4, 2, |x, y| {
            let base = if x < 2 { 1.0 } else { 10.0 };
            Luma([base * (y + 1) as f32])
        });
        let sums = aggregate(&energy);
        assert_eq!(sums, QuadrantEnergies::new(2.0, 20.0, 4.0, 40.0));
        assert_eq!(sums.winner(), Quadrant::DownRight);
    }

    #[test]
    fn odd_sizes_give_the_extra_row_and_column_to_the_far_quadrants() {
        let energy = EnergyImage::from_pixel(5, 3, Luma([1.0]));
        let sums = aggregate(&energy);
        // mid_x = 2, mid_y = 1
        assert_eq!(sums, QuadrantEnergies::new(2.0, 3.0, 4.0, 6.0));
        assert_eq!(sums.total(), 15.0);
    }

    #[test]
    fn winner_breaks_ties_by_priority() {
        assert_eq!(QuadrantEnergies::new(5.0, 5.0, 5.0, 5.0).winner(), Quadrant::UpLeft);
        assert_eq!(QuadrantEnergies::new(1.0, 7.0, 7.0, 2.0).winner(), Quadrant::UpRight);
        assert_eq!(QuadrantEnergies::new(0.0, 0.0, 3.0, 3.0).winner(), Quadrant::DownLeft);
        assert_eq!(QuadrantEnergies::default().winner(), Quadrant::UpLeft);
    }

    #[test]
    fn bounds_match_locate() {
        let (w, h) = (7, 5);
        for quadrant in Quadrant::ALL {
            let (x0, y0, x1, y1) = quadrant.bounds(w, h);
            for y in y0..y1 {
                for x in x0..x1 {
                    assert_eq!(Quadrant::locate(x, y, w / 2, h / 2), quadrant);
                }
            }
        }
    }

    #[test]
    fn tiny_images_do_not_panic() {
        let one = EnergyImage::from_pixel(1, 1, Luma([3.0]));
        assert_eq!(aggregate(&one), QuadrantEnergies::new(0.0, 0.0, 0.0, 3.0));
        let empty = EnergyImage::new(0, 0);
        assert_eq!(aggregate(&empty), QuadrantEnergies::default());
    }
}
