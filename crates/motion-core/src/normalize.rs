//! Quadrant energies to normalized weights.
//!
//! Two policies are supported, chosen once per session:
//! - **Ratio:** every quadrant is scaled against the loudest one and floored.
//! - **Accumulator:** the loudest quadrant gets a unit impulse and every
//!   quadrant then decays by half, giving a built-in temporal smoothing.
//!
//! Neither policy ever divides by a zero energy. A frame without significant
//! motion maps to a uniform weight of 1.0 so no channel goes quiet.

use dynso_common::config::WeightPolicy;
use serde::{Deserialize, Serialize};

use crate::quadrant::{Quadrant, QuadrantEnergies};

/// Per-quadrant weights in `[0, 1]`, indexed by [`Quadrant::index`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightVector(pub [f64; 4]);

impl WeightVector {
    pub fn new(up_left: f64, up_right: f64, down_left: f64, down_right: f64) -> Self {
        Self([up_left, up_right, down_left, down_right])
    }

    pub fn uniform(value: f64) -> Self {
        Self([value; 4])
    }

    pub fn get(&self, quadrant: Quadrant) -> f64 {
        self.0[quadrant.index()]
    }

    pub fn as_array(&self) -> [f64; 4] {
        self.0
    }
}

/// Ratio policy as a pure function.
///
/// With `highest > threshold`, each weight is `energy / highest`, rounded to
/// four decimals when above `floor` and raised to `floor` otherwise. At or
/// below the threshold every weight is 1.0.
pub fn ratio_weights(energies: &QuadrantEnergies, floor: f64, threshold: f64) -> WeightVector {
    let highest = energies.highest();
    if !highest.is_finite() || highest <= threshold {
        return WeightVector::uniform(1.0);
    }
    WeightVector(energies.0.map(|energy| {
        let w = energy / highest;
        if w > floor {
            round4(w)
        } else {
            floor
        }
    }))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Stateful normalizer for either policy.
///
/// The accumulator state lives here, owned by the pipeline, rather than in
/// anything shared between sessions.
#[derive(Debug, Clone)]
pub struct WeightNormalizer {
    policy: WeightPolicy,
    floor: f64,
    threshold: f64,
    accumulated: [f64; 4],
}

impl WeightNormalizer {
    pub fn new(policy: WeightPolicy, floor: f64, threshold: f64) -> Self {
        Self {
            policy,
            floor,
            threshold,
            accumulated: [0.0; 4],
        }
    }

    pub fn policy(&self) -> WeightPolicy {
        self.policy
    }

    /// Normalize one frame's energies.
    pub fn normalize(&mut self, energies: &QuadrantEnergies) -> WeightVector {
        match self.policy {
            WeightPolicy::Ratio => ratio_weights(energies, self.floor, self.threshold),
            WeightPolicy::Accumulator => self.accumulate(energies),
        }
    }

    /// Raw accumulator state, before flooring.
    pub fn accumulated(&self) -> WeightVector {
        WeightVector(self.accumulated)
    }

    pub fn reset(&mut self) {
        self.accumulated = [0.0; 4];
    }

    fn accumulate(&mut self, energies: &QuadrantEnergies) -> WeightVector {
        let highest = energies.highest();
        let moving = highest.is_finite() && highest > self.threshold;
        if moving {
            self.accumulated[energies.winner().index()] += 1.0;
        }
        for weight in &mut self.accumulated {
            *weight /= 2.0;
        }

        if !moving {
            tracing::trace!(highest, "No significant motion; uniform weights");
            return WeightVector::uniform(1.0);
        }
        WeightVector(self.accumulated.map(|w| w.clamp(self.floor, 1.0)))
    }
}
