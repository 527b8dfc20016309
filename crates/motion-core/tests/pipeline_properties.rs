use dynso_common::config::StereoDivisor;
use dynso_motion_core::normalize::ratio_weights;
use dynso_motion_core::quadrant::aggregate;
use dynso_motion_core::{
    ChannelTopology, EnergyImage, Quadrant, QuadrantEnergies, VolumeMapper, VolumeVector,
    WeightHistory, WeightVector,
};
use image::Luma;
use proptest::prelude::*;

fn energy_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![Just(0.0), 0.0..2.0f64, 0.0..1.0e7f64]
}

proptest! {
    #[test]
    fn ratio_weights_stay_within_floor_and_one(
        ul in energy_strategy(),
        ur in energy_strategy(),
        dl in energy_strategy(),
        dr in energy_strategy(),
    ) {
        let energies = QuadrantEnergies::new(ul, ur, dl, dr);
        let weights = ratio_weights(&energies, 0.1, 1.0);
        for w in weights.as_array() {
            prop_assert!((0.1..=1.0).contains(&w), "weight {w} out of range");
        }
        if energies.highest() > 1.0 {
            prop_assert_eq!(weights.get(energies.winner()), 1.0);
        }
    }

    #[test]
    fn equal_energies_always_give_uniform_weights(e in energy_strategy()) {
        let weights = ratio_weights(&QuadrantEnergies::new(e, e, e, e), 0.1, 1.0);
        prop_assert_eq!(weights, WeightVector::uniform(1.0));
    }

    #[test]
    fn history_keeps_exactly_the_last_insertions(
        capacity in 1usize..16,
        values in proptest::collection::vec(0.0..1.0f64, 0..64),
    ) {
        let mut history = WeightHistory::new(capacity);
        for v in &values {
            history.push(*v);
        }
        let kept: Vec<f64> = history.iter().collect();
        prop_assert_eq!(kept.len(), capacity);

        let tail_start = values.len().saturating_sub(capacity);
        let tail = &values[tail_start..];
        prop_assert_eq!(&kept[capacity - tail.len()..], tail);
        prop_assert!(kept[..capacity - tail.len()].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn quadrants_partition_every_pixel_once(width in 1u32..40, height in 1u32..40) {
        let mut owners = vec![0u8; (width * height) as usize];
        for quadrant in Quadrant::ALL {
            let (x0, y0, x1, y1) = quadrant.bounds(width, height);
            for y in y0..y1 {
                for x in x0..x1 {
                    owners[(y * width + x) as usize] += 1;
                }
            }
        }
        prop_assert!(owners.iter().all(|&n| n == 1));

        let ones = EnergyImage::from_pixel(width, height, Luma([1.0]));
        prop_assert_eq!(aggregate(&ones).total(), (width * height) as f64);
    }

    #[test]
    fn volumes_never_leave_the_unit_range(
        weights in proptest::array::uniform4(0.0..50.0f64),
        fixed in 0.1..8.0f64,
        use_fixed in any::<bool>(),
    ) {
        let divisor = if use_fixed {
            StereoDivisor::Fixed { divisor: fixed }
        } else {
            StereoDivisor::LouderSide
        };
        let mapper = VolumeMapper::new(divisor, 0.1);
        let weights = WeightVector(weights);

        match mapper.map(&weights, ChannelTopology::Quad) {
            VolumeVector::Quad { volumes } => {
                prop_assert!(volumes.iter().all(|v| (0.0..=1.0).contains(v)));
            }
            other => prop_assert!(false, "unexpected {other:?}"),
        }
        match mapper.map(&weights, ChannelTopology::Stereo) {
            VolumeVector::Stereo { left, right } => {
                prop_assert!((0.1..=1.0).contains(&left), "left {left}");
                prop_assert!((0.1..=1.0).contains(&right), "right {right}");
            }
            other => prop_assert!(false, "unexpected {other:?}"),
        }
    }
}

#[test]
fn constant_history_mean_converges_after_capacity_pushes() {
    let mut history = WeightHistory::new(10);
    for _ in 0..10 {
        history.push(0.7);
    }
    assert!((history.mean() - 0.7).abs() < 1e-12);
}
