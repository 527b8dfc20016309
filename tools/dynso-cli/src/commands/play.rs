//! Run a capture session until escape or Ctrl+C.

use std::path::PathBuf;

use dynso_common::config::AppConfig;
use dynso_playback_engine::{
    open_audio_backend, open_video_source, DynsoSession, InterruptFlag, SessionConfig,
    SessionSummary,
};

pub async fn run(
    config: AppConfig,
    sounds: Vec<PathBuf>,
    print_weights: bool,
) -> anyhow::Result<()> {
    let interrupt = InterruptFlag::new();

    let on_signal = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received, stopping after this frame");
            on_signal.raise();
        }
    });

    let summary =
        tokio::task::spawn_blocking(move || play(config, sounds, interrupt, print_weights))
            .await??;

    tracing::info!(
        frames = summary.frames,
        elapsed_secs = summary.elapsed_secs,
        started_at = %summary.started_at,
        "Session finished"
    );
    if print_weights {
        println!("{}", serde_json::to_string(&summary)?);
    }
    Ok(())
}

fn play(
    config: AppConfig,
    sounds: Vec<PathBuf>,
    interrupt: InterruptFlag,
    print_weights: bool,
) -> anyhow::Result<SessionSummary> {
    let audio = open_audio_backend(config.audio.backend)?;
    let video = open_video_source(config.capture.source, &config.capture, interrupt)?;

    let mut session = DynsoSession::new(SessionConfig::from_app_config(&config), video, audio);
    if print_weights {
        session = session.on_snapshot(|snapshot| match snapshot.to_json() {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "Failed to encode weight snapshot"),
        });
    }

    session.start(&sounds)?;
    eprintln!("Playing {} sound(s). Press Ctrl+C to stop.", sounds.len());

    let result = session.run();
    let faded = session.shutdown();
    let summary = result?;
    faded?;
    Ok(summary)
}
