//! Read-only weight snapshot for external inspection.

use serde::{Deserialize, Serialize};

use crate::normalize::WeightVector;
use crate::quadrant::Quadrant;

/// Weights as `{"up": {"left", "right"}, "down": {"left", "right"}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSnapshot {
    pub up: SidePair,
    pub down: SidePair,
}

/// Left/right pair for one row of quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SidePair {
    pub left: f64,
    pub right: f64,
}

impl From<&WeightVector> for WeightSnapshot {
    fn from(weights: &WeightVector) -> Self {
        Self {
            up: SidePair {
                left: weights.get(Quadrant::UpLeft),
                right: weights.get(Quadrant::UpRight),
            },
            down: SidePair {
                left: weights.get(Quadrant::DownLeft),
                right: weights.get(Quadrant::DownRight),
            },
        }
    }
}

impl WeightSnapshot {
    /// Single-line JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_nests_rows_and_sides() {
        let snapshot = WeightSnapshot::from(&WeightVector::new(1.0, 0.1, 0.25, 0.5));
        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(value["up"]["left"], 1.0);
        assert_eq!(value["up"]["right"], 0.1);
        assert_eq!(value["down"]["left"], 0.25);
        assert_eq!(value["down"]["right"], 0.5);
    }

    #[test]
    fn pretty_json_round_trips() {
        let snapshot = WeightSnapshot::from(&WeightVector::uniform(1.0));
        let parsed: WeightSnapshot =
            serde_json::from_str(&snapshot.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, snapshot);
    }
}
