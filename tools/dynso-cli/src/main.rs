//! Dynso CLI: loop one or four sounds and let webcam motion mix them.
//!
//! Usage:
//!   dynso [OPTIONS] <SOUND>        One sound panned between left and right
//!   dynso [OPTIONS] <UL> <UR> <DL> <DR>
//!                                  One sound per quadrant of the picture
//!
//! Press Escape (or Ctrl+C) to stop.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use dynso_common::config::{
    AppConfig, AudioBackendKind, MaskEmphasis, VideoSourceKind, WeightPolicy,
};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "dynso",
    about = "Mix looping sounds by where the webcam sees motion",
    version,
    author
)]
struct Cli {
    /// One sound (stereo) or four sounds: up-left, up-right, down-left, down-right
    #[arg(required = true, value_name = "SOUND")]
    sounds: Vec<PathBuf>,

    /// Camera device (e.g. /dev/video0); auto-detected when omitted
    #[arg(short, long)]
    device: Option<String>,

    /// Use generated frames instead of a webcam
    #[arg(long)]
    synthetic: bool,

    /// Audio backend
    #[arg(long, value_enum)]
    audio: Option<AudioArg>,

    /// How quadrant energies become weights
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Disable the spatial mask
    #[arg(long)]
    no_mask: bool,

    /// Which part of the picture the mask favours
    #[arg(long, value_enum)]
    mask_emphasis: Option<EmphasisArg>,

    /// Lowest weight a quiet quadrant can drop to [0.0, 1.0]
    #[arg(long)]
    floor: Option<f64>,

    /// Number of frames averaged per quadrant
    #[arg(long)]
    history: Option<usize>,

    /// Config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write weight snapshots to stdout as JSON lines
    #[arg(long)]
    print_weights: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AudioArg {
    Gst,
    Null,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    Ratio,
    Accumulator,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EmphasisArg {
    Edges,
    Center,
}

impl Cli {
    /// Layer command-line flags over file settings.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        if let Some(device) = &self.device {
            config.capture.device = Some(device.clone());
        }
        if self.synthetic {
            config.capture.source = VideoSourceKind::Synthetic;
        }
        if let Some(audio) = self.audio {
            config.audio.backend = match audio {
                AudioArg::Gst => AudioBackendKind::Gstreamer,
                AudioArg::Null => AudioBackendKind::Null,
            };
        }
        if let Some(policy) = self.policy {
            config.pipeline.policy = match policy {
                PolicyArg::Ratio => WeightPolicy::Ratio,
                PolicyArg::Accumulator => WeightPolicy::Accumulator,
            };
        }
        if self.no_mask {
            config.pipeline.masking = false;
        }
        if let Some(emphasis) = self.mask_emphasis {
            config.pipeline.mask_emphasis = match emphasis {
                EmphasisArg::Edges => MaskEmphasis::Edges,
                EmphasisArg::Center => MaskEmphasis::Center,
            };
        }
        if let Some(floor) = self.floor {
            config.pipeline.floor = floor;
        }
        if let Some(history) = self.history {
            config.pipeline.history_size = history;
        }
    }

    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from(path)?,
            None => AppConfig::load(),
        };
        self.apply_overrides(&mut config);
        config.pipeline.validate()?;
        Ok(config)
    }
}

/// Sounds must exist and come as one or four.
fn check_sounds(sounds: &[PathBuf]) -> anyhow::Result<()> {
    if sounds.len() != 1 && sounds.len() != 4 {
        anyhow::bail!(
            "expected 1 sound (stereo) or 4 sounds (one per quadrant), got {}",
            sounds.len()
        );
    }
    for sound in sounds {
        if !sound.is_file() {
            anyhow::bail!("sound file not found: {}", sound.display());
        }
        let known = sound
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ogg") || ext.eq_ignore_ascii_case("wav"));
        if !known {
            eprintln!(
                "warning: {} is not .ogg or .wav; playback may fail",
                sound.display()
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.kind() == clap::error::ErrorKind::DisplayVersion => {
            print!("{e}");
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            // Usage and help both go to stderr with a failing status.
            eprint!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = check_sounds(&cli.sounds) {
        eprintln!("error: {e:#}");
        return ExitCode::FAILURE;
    }

    dynso_common::logging::init_logging(&config.logging);

    match commands::play::run(config, cli.sounds, cli.print_weights).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Dynso stopped with an error");
            ExitCode::FAILURE
        }
    }
}
