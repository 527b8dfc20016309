//! The full per-frame pipeline.
//!
//! ```text
//! (current, previous) ─▶ differencer ─▶ mask ─▶ quadrants ─▶ normalizer ─▶ smoother
//!                                                                             │
//!                                              volume mapper ◀── latest weights
//! ```
//!
//! All session state (mask plane, accumulator, weight history) is owned
//! here and lives as long as the pipeline.

use dynso_common::config::{PipelineConfig, WeightPolicy};
use dynso_common::error::{DynsoError, DynsoResult};

use crate::difference::FrameDifferencer;
use crate::frame::{EnergyImage, Frame};
use crate::mask::SpatialMask;
use crate::normalize::{WeightNormalizer, WeightVector};
use crate::quadrant::{aggregate, QuadrantEnergies};
use crate::smooth::TemporalSmoother;
use crate::snapshot::WeightSnapshot;
use crate::volume::{ChannelTopology, VolumeMapper, VolumeVector};

/// Everything one frame produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutcome {
    pub energies: QuadrantEnergies,
    /// Normalizer output before smoothing.
    pub raw: WeightVector,
    /// Weights that drive the volumes.
    pub weights: WeightVector,
}

/// Motion-to-weight pipeline for one capture session.
#[derive(Debug, Clone)]
pub struct MotionPipeline {
    differencer: FrameDifferencer,
    mask: Option<SpatialMask>,
    normalizer: WeightNormalizer,
    smoother: Option<TemporalSmoother>,
    mapper: VolumeMapper,
    latest: WeightVector,
    frames: u64,
}

impl MotionPipeline {
    /// Build a pipeline for frames of `dimensions`.
    pub fn new(config: &PipelineConfig, dimensions: (u32, u32)) -> DynsoResult<Self> {
        config.validate()?;
        let (width, height) = dimensions;
        if width < 2 || height < 2 {
            return Err(DynsoError::capture(format!(
                "Frames of {width}x{height} cannot be split into quadrants"
            )));
        }

        let mask = config
            .masking
            .then(|| SpatialMask::new(config.mask_kernel, config.mask_emphasis, dimensions));
        let smoother = match config.policy {
            WeightPolicy::Ratio => Some(TemporalSmoother::new(config.history_size)),
            WeightPolicy::Accumulator => None,
        };

        tracing::info!(
            width,
            height,
            policy = ?config.policy,
            difference = ?config.difference,
            masking = config.masking,
            floor = config.floor,
            history = config.history_size,
            "Motion pipeline ready"
        );

        Ok(Self {
            differencer: FrameDifferencer::new(config.difference, config.mirror, dimensions),
            mask,
            normalizer: WeightNormalizer::new(
                config.policy,
                config.floor,
                config.motion_threshold,
            ),
            smoother,
            mapper: VolumeMapper::new(config.stereo_divisor, config.floor),
            latest: WeightVector::default(),
            frames: 0,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.differencer.dimensions()
    }

    /// Check a frame against the session size.
    pub fn ensure_compatible(&self, frame: &Frame) -> DynsoResult<()> {
        self.differencer.ensure_compatible(frame)
    }

    /// Differenced, mirrored and masked energy for a frame pair.
    pub fn energy_image(&self, current: &Frame, previous: &Frame) -> EnergyImage {
        let mut energy = self.differencer.difference(current, previous);
        if let Some(mask) = &self.mask {
            mask.apply(&mut energy);
        }
        energy
    }

    /// Run one frame pair through the pipeline and remember its weights.
    pub fn process(&mut self, current: &Frame, previous: &Frame) -> FrameOutcome {
        let energy = self.energy_image(current, previous);
        let energies = aggregate(&energy);
        let raw = self.normalizer.normalize(&energies);
        let weights = match self.smoother.as_mut() {
            Some(smoother) => smoother.smooth(&raw),
            None => raw,
        };

        self.latest = weights;
        self.frames += 1;

        tracing::trace!(
            frame = self.frames,
            energies = ?energies.0,
            weights = ?weights.0,
            "Processed frame"
        );

        FrameOutcome {
            energies,
            raw,
            weights,
        }
    }

    /// Weights from the most recent frame; zeros before the first one.
    pub fn weights(&self) -> WeightVector {
        self.latest
    }

    /// Volumes for the most recent weights.
    pub fn volumes(&self, topology: ChannelTopology) -> VolumeVector {
        self.mapper.map(&self.latest, topology)
    }

    pub fn snapshot(&self) -> WeightSnapshot {
        WeightSnapshot::from(&self.latest)
    }

    /// Frames processed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Forget accumulated weights and history.
    pub fn reset(&mut self) {
        self.normalizer.reset();
        if let Some(smoother) = self.smoother.as_mut() {
            smoother.reset();
        }
        self.latest = WeightVector::default();
        self.frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quadrant::Quadrant;
    use image::Luma;

    /// Frame that is bright only inside one quadrant's bounds.
    fn lit(quadrant: Quadrant, width: u32, height: u32) -> Frame {
        let (x0, y0, x1, y1) = quadrant.bounds(width, height);
        Frame::from_fn(width, height, |x, y| {
            if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
                Luma([200])
            } else {
                Luma([0])
            }
        })
    }

    fn unmasked(policy: WeightPolicy, mirror: bool) -> PipelineConfig {
        PipelineConfig {
            policy,
            mirror,
            masking: false,
            history_size: 1,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn motion_in_one_quadrant_wins() {
        let config = unmasked(WeightPolicy::Ratio, false);
        let mut pipeline = MotionPipeline::new(&config, (8, 8)).unwrap();
        let dark = Frame::new(8, 8);
        let outcome = pipeline.process(&lit(Quadrant::DownRight, 8, 8), &dark);

        assert_eq!(outcome.energies.winner(), Quadrant::DownRight);
        assert_eq!(outcome.weights, WeightVector::new(0.1, 0.1, 0.1, 1.0));
        assert_eq!(pipeline.frames(), 1);
    }

    #[test]
    fn mirroring_swaps_left_and_right() {
        let config = unmasked(WeightPolicy::Ratio, true);
        let mut pipeline = MotionPipeline::new(&config, (8, 8)).unwrap();
        let dark = Frame::new(8, 8);
        let outcome = pipeline.process(&lit(Quadrant::UpLeft, 8, 8), &dark);
        assert_eq!(outcome.energies.winner(), Quadrant::UpRight);
    }

    #[test]
    fn still_scene_keeps_every_channel_up() {
        let config = unmasked(WeightPolicy::Ratio, true);
        let mut pipeline = MotionPipeline::new(&config, (6, 4)).unwrap();
        let frame = Frame::from_pixel(6, 4, Luma([90]));
        let outcome = pipeline.process(&frame, &frame);
        assert_eq!(outcome.weights, WeightVector::uniform(1.0));
    }

    #[test]
    fn ratio_policy_smooths_over_history() {
        let config = PipelineConfig {
            masking: false,
            mirror: false,
            history_size: 4,
            ..PipelineConfig::default()
        };
        let mut pipeline = MotionPipeline::new(&config, (8, 8)).unwrap();
        let dark = Frame::new(8, 8);
        let outcome = pipeline.process(&lit(Quadrant::UpLeft, 8, 8), &dark);

        assert_eq!(outcome.raw.get(Quadrant::UpLeft), 1.0);
        assert!((outcome.weights.get(Quadrant::UpLeft) - 0.25).abs() < 1e-12);
        assert_eq!(pipeline.weights(), outcome.weights);
    }

    #[test]
    fn accumulator_skips_the_smoother() {
        let mut pipeline =
            MotionPipeline::new(&unmasked(WeightPolicy::Accumulator, false), (8, 8)).unwrap();
        let dark = Frame::new(8, 8);
        let outcome = pipeline.process(&lit(Quadrant::DownLeft, 8, 8), &dark);
        assert_eq!(outcome.raw, outcome.weights);
        assert_eq!(outcome.weights.get(Quadrant::DownLeft), 0.5);
    }

    #[test]
    fn masked_pipeline_still_finds_the_moving_quadrant() {
        let config = PipelineConfig {
            mirror: false,
            history_size: 1,
            ..PipelineConfig::default()
        };
        let mut pipeline = MotionPipeline::new(&config, (40, 30)).unwrap();
        let dark = Frame::new(40, 30);
        let outcome = pipeline.process(&lit(Quadrant::UpRight, 40, 30), &dark);
        assert_eq!(outcome.energies.winner(), Quadrant::UpRight);
        assert!(outcome.energies.get(Quadrant::UpRight) < 200.0 * 20.0 * 15.0);
    }

    #[test]
    fn volumes_and_snapshot_follow_latest_weights() {
        let config = unmasked(WeightPolicy::Ratio, false);
        let mut pipeline = MotionPipeline::new(&config, (8, 8)).unwrap();
        assert_eq!(pipeline.snapshot().up.left, 0.0);

        let dark = Frame::new(8, 8);
        pipeline.process(&lit(Quadrant::UpLeft, 8, 8), &dark);
        assert_eq!(pipeline.snapshot().up.left, 1.0);
        assert_eq!(
            pipeline.volumes(ChannelTopology::Quad),
            VolumeVector::Quad {
                volumes: [1.0, 0.1, 0.1, 0.1]
            }
        );

        pipeline.reset();
        assert_eq!(pipeline.weights(), WeightVector::default());
        assert_eq!(pipeline.frames(), 0);
    }

    #[test]
    fn rejects_degenerate_sizes_and_configs() {
        assert!(MotionPipeline::new(&PipelineConfig::default(), (1, 8)).is_err());
        let bad = PipelineConfig {
            history_size: 0,
            ..PipelineConfig::default()
        };
        assert!(MotionPipeline::new(&bad, (8, 8)).is_err());
    }
}
