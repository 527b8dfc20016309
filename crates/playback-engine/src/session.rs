//! Capture session orchestration.
//!
//! A session owns one video source and one audio backend. `start` loads and
//! loops the sounds, `run` drives frames through the motion pipeline until
//! the source reports escape, and `shutdown` fades everything out.

use std::path::PathBuf;
use std::time::Duration;

use dynso_common::clock::{RateController, SessionClock};
use dynso_common::config::{AppConfig, PipelineConfig};
use dynso_common::error::{DynsoError, DynsoResult};
use dynso_motion_core::{
    ChannelTopology, MotionPipeline, VolumeVector, WeightSnapshot, WeightVector,
};
use serde::Serialize;

use crate::audio::{apply_volumes, AudioBackend, ChannelHandle};
use crate::video::{VideoSource, ESCAPE};

/// Session tuning taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub pipeline: PipelineConfig,
    pub poll_timeout: Duration,
    pub snapshot_interval_ms: u64,
    pub initial_volume: f32,
    pub fade_out: Duration,
}

impl SessionConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            pipeline: config.pipeline.clone(),
            poll_timeout: Duration::from_millis(config.capture.poll_timeout_ms),
            snapshot_interval_ms: config.capture.snapshot_interval_ms,
            initial_volume: config.audio.initial_volume,
            fade_out: Duration::from_millis(config.audio.fade_out_ms),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Playing,
    Capturing,
    Stopped,
    Failed,
}

/// What a finished run looked like.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub frames: u64,
    pub elapsed_secs: f64,
    pub started_at: String,
    pub final_weights: WeightSnapshot,
}

type SnapshotSink = Box<dyn FnMut(&WeightSnapshot) + Send>;

pub struct DynsoSession {
    config: SessionConfig,
    video: Box<dyn VideoSource>,
    audio: Box<dyn AudioBackend>,
    topology: Option<ChannelTopology>,
    channels: Vec<Option<ChannelHandle>>,
    pipeline: Option<MotionPipeline>,
    capturing: bool,
    state: SessionState,
    on_snapshot: Option<SnapshotSink>,
}

impl DynsoSession {
    pub fn new(
        config: SessionConfig,
        video: Box<dyn VideoSource>,
        audio: Box<dyn AudioBackend>,
    ) -> Self {
        Self {
            config,
            video,
            audio,
            topology: None,
            channels: Vec::new(),
            pipeline: None,
            capturing: false,
            state: SessionState::Idle,
            on_snapshot: None,
        }
    }

    /// Call `sink` with every periodic weight snapshot.
    pub fn on_snapshot(mut self, sink: impl FnMut(&WeightSnapshot) + Send + 'static) -> Self {
        self.on_snapshot = Some(Box::new(sink));
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn topology(&self) -> Option<ChannelTopology> {
        self.topology
    }

    /// The pipeline of the current or last run.
    pub fn pipeline(&self) -> Option<&MotionPipeline> {
        self.pipeline.as_ref()
    }

    /// Load and loop one sound (stereo) or four sounds (one per quadrant).
    pub fn start(&mut self, sounds: &[PathBuf]) -> DynsoResult<()> {
        if self.state != SessionState::Idle {
            return Err(DynsoError::invalid_argument("Session already started"));
        }
        let topology = ChannelTopology::from_sound_count(sounds.len()).ok_or_else(|| {
            DynsoError::invalid_argument(format!(
                "Expected 1 or 4 sounds, got {}",
                sounds.len()
            ))
        })?;

        let handles = sounds
            .iter()
            .map(|path| self.audio.load_sound(path))
            .collect::<DynsoResult<Vec<_>>>()?;

        let initial = self.config.initial_volume;
        for sound in handles {
            let channel = self.audio.play(sound, true)?;
            match topology {
                ChannelTopology::Quad => self.audio.set_volume(channel, initial)?,
                ChannelTopology::Stereo => {
                    self.audio.set_stereo_volume(channel, initial, initial)?
                }
            }
            self.channels.push(Some(channel));
        }

        self.topology = Some(topology);
        self.state = SessionState::Playing;
        tracing::info!(
            backend = self.audio.name(),
            ?topology,
            sounds = sounds.len(),
            initial_volume = initial,
            "Sounds playing"
        );
        Ok(())
    }

    /// Capture until the source reports escape or fails.
    pub fn run(&mut self) -> DynsoResult<SessionSummary> {
        if matches!(self.state, SessionState::Capturing | SessionState::Stopped) {
            return Err(DynsoError::invalid_argument("Session has already run"));
        }

        let clock = SessionClock::start();
        tracing::info!(source = %self.video.describe(), "Capture started");

        match self.capture_loop(&clock) {
            Ok(()) => {
                self.state = SessionState::Stopped;
                let summary = self.summary(&clock);
                tracing::info!(
                    frames = summary.frames,
                    elapsed_secs = summary.elapsed_secs,
                    "Capture stopped"
                );
                Ok(summary)
            }
            Err(e) => {
                self.capturing = false;
                self.state = SessionState::Failed;
                tracing::error!(error = %e, "Capture failed");
                Err(e)
            }
        }
    }

    fn capture_loop(&mut self, clock: &SessionClock) -> DynsoResult<()> {
        let mut snapshots = RateController::with_interval_ms(self.config.snapshot_interval_ms);

        let mut previous = self.video.query_frame()?;
        let pipeline = self
            .pipeline
            .insert(MotionPipeline::new(&self.config.pipeline, previous.dimensions())?);
        self.capturing = true;
        self.state = SessionState::Capturing;

        while self.capturing {
            let current = self.video.query_frame()?;
            pipeline.ensure_compatible(&current)?;
            pipeline.process(&current, &previous);

            if let Some(topology) = self.topology {
                let volumes = pipeline.volumes(topology);
                log_volumes(&volumes);
                apply_volumes(self.audio.as_mut(), &self.channels, &volumes)?;
            }
            self.audio.service()?;

            if snapshots.should_tick(clock.elapsed_ns()) {
                let snapshot = pipeline.snapshot();
                tracing::info!(
                    up_left = snapshot.up.left,
                    up_right = snapshot.up.right,
                    down_left = snapshot.down.left,
                    down_right = snapshot.down.right,
                    "Weights"
                );
                if let Some(sink) = self.on_snapshot.as_mut() {
                    sink(&snapshot);
                }
            }

            previous = current;
            if self.video.poll_key(self.config.poll_timeout) == Some(ESCAPE) {
                tracing::debug!("Escape pressed");
                self.capturing = false;
            }
        }
        Ok(())
    }

    fn summary(&self, clock: &SessionClock) -> SessionSummary {
        let (frames, final_weights) = match &self.pipeline {
            Some(pipeline) => (pipeline.frames(), pipeline.snapshot()),
            None => (0, WeightSnapshot::from(&WeightVector::default())),
        };
        SessionSummary {
            frames,
            elapsed_secs: clock.elapsed_secs(),
            started_at: clock.epoch_wall().to_string(),
            final_weights,
        }
    }

    /// Fade out and stop all sounds.
    pub fn shutdown(&mut self) -> DynsoResult<()> {
        self.capturing = false;
        if self.channels.is_empty() {
            return Ok(());
        }
        self.audio.fade_out(self.config.fade_out)?;
        self.channels.clear();
        tracing::info!("Audio faded out");
        Ok(())
    }
}

fn log_volumes(volumes: &VolumeVector) {
    match volumes {
        VolumeVector::Quad { volumes } => tracing::debug!(?volumes, "Volumes"),
        VolumeVector::Stereo { left, right } => tracing::debug!(left, right, "Volumes"),
    }
}
