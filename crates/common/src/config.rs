//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DynsoError, DynsoResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Motion-to-volume pipeline settings.
    pub pipeline: PipelineConfig,

    /// Video capture defaults.
    pub capture: CaptureDefaults,

    /// Audio playback defaults.
    pub audio: AudioDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Numeric policy for the motion pipeline, selected once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// How quadrant energies become weights.
    pub policy: WeightPolicy,

    /// How two frames become a motion-energy image.
    pub difference: DifferenceStrategy,

    /// Mirror the energy image horizontally (front-facing camera).
    pub mirror: bool,

    /// Divide the energy image by the spatial mask before aggregation.
    pub masking: bool,

    /// Hand-authored kernel the mask is resized from.
    pub mask_kernel: MaskKernel,

    /// Which region the mask favours.
    pub mask_emphasis: MaskEmphasis,

    /// Lowest weight a quiet quadrant can get. Keeps channels audible.
    pub floor: f64,

    /// Samples kept per quadrant by the temporal smoother.
    pub history_size: usize,

    /// Highest energy at or below which a frame counts as "no motion".
    pub motion_threshold: f64,

    /// Divisor policy for folding four weights into stereo.
    pub stereo_divisor: StereoDivisor,
}

/// Weight normalization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightPolicy {
    /// Scale by the loudest quadrant, then smooth over a history window.
    #[default]
    Ratio,
    /// Impulse on the winning quadrant followed by a halving decay.
    Accumulator,
}

/// Frame differencing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DifferenceStrategy {
    /// `|current - previous|`.
    #[default]
    Absolute,
    /// `max(current - previous, 0)`; only brightening pixels count.
    Brightening,
    /// Magnitude of a dense Lucas-Kanade flow field.
    FlowMagnitude {
        combine: FlowCombine,
        /// Side of the square integration window, in pixels.
        window: u32,
    },
}

/// How `|vx|` and `|vy|` fold into one energy value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FlowCombine {
    /// `|vx| * |vy|`.
    Product,
    /// `x_weight * |vx| + (1 - x_weight) * |vy|`.
    WeightedMean { x_weight: f64 },
}

/// Built-in 5x5 mask kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskKernel {
    /// Diamond-shaped falloff, peak 4 at the centre.
    #[default]
    Cone,
    /// Stepped square falloff, peak 3 at the centre.
    Pyramid,
}

/// Region the spatial mask favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskEmphasis {
    /// Central motion is divided down; edges and corners dominate.
    #[default]
    Edges,
    /// The kernel is inverted so edge motion is divided down instead.
    Center,
}

/// Stereo fold divisor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StereoDivisor {
    /// Divide both sides by a constant.
    Fixed { divisor: f64 },
    /// Divide by the louder side so it reaches full volume.
    #[default]
    LouderSide,
}

/// Video capture parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureDefaults {
    /// Which video adapter to open.
    pub source: VideoSourceKind,

    /// V4L2 device path. `None` lets GStreamer pick.
    pub device: Option<String>,

    /// Key poll wait at the end of each iteration (ms).
    pub poll_timeout_ms: u64,

    /// Interval between weight snapshots (ms).
    pub snapshot_interval_ms: u64,

    /// Synthetic source frame size.
    pub synthetic_width: u32,
    pub synthetic_height: u32,
}

/// Video adapter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSourceKind {
    #[default]
    Camera,
    Synthetic,
}

/// Audio playback parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioDefaults {
    /// Which audio adapter to open.
    pub backend: AudioBackendKind,

    /// Volume applied right after a sound starts playing.
    pub initial_volume: f32,

    /// Fade-out duration on shutdown (ms).
    pub fade_out_ms: u64,
}

/// Audio adapter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioBackendKind {
    #[default]
    Gstreamer,
    Null,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "dynso=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            policy: WeightPolicy::Ratio,
            difference: DifferenceStrategy::Absolute,
            mirror: true,
            masking: true,
            mask_kernel: MaskKernel::Cone,
            mask_emphasis: MaskEmphasis::Edges,
            floor: 0.1,
            history_size: 10,
            motion_threshold: 1.0,
            stereo_divisor: StereoDivisor::LouderSide,
        }
    }
}

impl Default for CaptureDefaults {
    fn default() -> Self {
        Self {
            source: VideoSourceKind::Camera,
            device: None,
            poll_timeout_ms: 100,
            snapshot_interval_ms: 1000,
            synthetic_width: 320,
            synthetic_height: 240,
        }
    }
}

impl Default for AudioDefaults {
    fn default() -> Self {
        Self {
            backend: AudioBackendKind::Gstreamer,
            initial_volume: 0.1,
            fade_out_ms: 800,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl PipelineConfig {
    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> DynsoResult<()> {
        if !(0.0..=1.0).contains(&self.floor) {
            return Err(DynsoError::config(format!(
                "floor must be within [0, 1], got {}",
                self.floor
            )));
        }
        if self.history_size == 0 {
            return Err(DynsoError::config("history_size must be at least 1"));
        }
        if !self.motion_threshold.is_finite() || self.motion_threshold < 0.0 {
            return Err(DynsoError::config(format!(
                "motion_threshold must be a non-negative number, got {}",
                self.motion_threshold
            )));
        }
        if let DifferenceStrategy::FlowMagnitude { combine, window } = self.difference {
            if window < 3 || window % 2 == 0 {
                return Err(DynsoError::config(format!(
                    "flow window must be odd and at least 3, got {window}"
                )));
            }
            if let FlowCombine::WeightedMean { x_weight } = combine {
                if !(0.0..=1.0).contains(&x_weight) {
                    return Err(DynsoError::config(format!(
                        "flow x_weight must be within [0, 1], got {x_weight}"
                    )));
                }
            }
        }
        if let StereoDivisor::Fixed { divisor } = self.stereo_divisor {
            if !(divisor.is_finite() && divisor > 0.0) {
                return Err(DynsoError::config(format!(
                    "fixed stereo divisor must be positive, got {divisor}"
                )));
            }
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Errors are returned, not swallowed.
    pub fn load_from(path: &Path) -> DynsoResult<Self> {
        if !path.exists() {
            return Err(DynsoError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("dynso").join("config.json")
}
