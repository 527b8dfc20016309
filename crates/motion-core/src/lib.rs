//! Dynso Motion Core — the motion-to-volume pipeline
//!
//! Turns pairs of grayscale webcam frames into playback volumes:
//! - **Differencing:** Per-pixel motion energy (absolute, brightening, or optical flow)
//! - **Spatial Mask:** Divisor plane that biases energy toward edges or centre
//! - **Quadrants:** Reduce the energy image to four regional sums
//! - **Normalization:** Ratio or accumulator weighting with a silence floor
//! - **Smoothing:** Ring-buffer averaging against sensor flicker
//! - **Volume Mapping:** Quad or stereo channel volumes
//!
//! This crate is pure computation — no I/O, no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod difference;
pub mod flow;
pub mod frame;
pub mod mask;
pub mod normalize;
pub mod pipeline;
pub mod quadrant;
pub mod smooth;
pub mod snapshot;
pub mod volume;

pub use difference::FrameDifferencer;
pub use frame::{EnergyImage, Frame};
pub use mask::SpatialMask;
pub use normalize::{WeightNormalizer, WeightVector};
pub use pipeline::{FrameOutcome, MotionPipeline};
pub use quadrant::{Quadrant, QuadrantEnergies};
pub use smooth::{TemporalSmoother, WeightHistory};
pub use snapshot::WeightSnapshot;
pub use volume::{ChannelTopology, VolumeMapper, VolumeVector};
