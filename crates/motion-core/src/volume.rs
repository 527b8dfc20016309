//! Weights to playback volumes.

use dynso_common::config::StereoDivisor;
use serde::{Deserialize, Serialize};

use crate::normalize::WeightVector;
use crate::quadrant::Quadrant;

/// Channel layout reported by the audio side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelTopology {
    /// One independent channel per quadrant.
    Quad,
    /// A single stereo channel; quadrants fold into left and right.
    Stereo,
}

impl ChannelTopology {
    /// Topology implied by the number of sounds given to the player.
    pub fn from_sound_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(Self::Stereo),
            4 => Some(Self::Quad),
            _ => None,
        }
    }

    pub fn channel_count(self) -> usize {
        match self {
            Self::Quad => 4,
            Self::Stereo => 1,
        }
    }
}

/// Volumes ready for the playback collaborator, all within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topology", rename_all = "snake_case")]
pub enum VolumeVector {
    Quad { volumes: [f32; 4] },
    Stereo { left: f32, right: f32 },
}

/// Maps weights to volumes for a channel topology.
#[derive(Debug, Clone, Copy)]
pub struct VolumeMapper {
    divisor: StereoDivisor,
    floor: f64,
}

impl VolumeMapper {
    pub fn new(divisor: StereoDivisor, floor: f64) -> Self {
        Self { divisor, floor }
    }

    pub fn map(&self, weights: &WeightVector, topology: ChannelTopology) -> VolumeVector {
        match topology {
            ChannelTopology::Quad => VolumeVector::Quad {
                volumes: weights.0.map(|w| unit(w) as f32),
            },
            ChannelTopology::Stereo => {
                let (left, right) = self.fold_stereo(weights);
                VolumeVector::Stereo {
                    left: left as f32,
                    right: right as f32,
                }
            }
        }
    }

    fn fold_stereo(&self, weights: &WeightVector) -> (f64, f64) {
        let left = weights.get(Quadrant::UpLeft) + weights.get(Quadrant::DownLeft);
        let right = weights.get(Quadrant::UpRight) + weights.get(Quadrant::DownRight);

        let floor = self.floor.clamp(0.0, 1.0);
        let divisor = match self.divisor {
            StereoDivisor::Fixed { divisor } => divisor,
            StereoDivisor::LouderSide => left.max(right),
        };
        if !(divisor.is_finite() && divisor > f64::EPSILON) {
            return (floor, floor);
        }

        (
            unit(left / divisor).max(floor),
            unit(right / divisor).max(floor),
        )
    }
}

/// Clamp into `[0, 1]`, sending NaN to 0.
fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
