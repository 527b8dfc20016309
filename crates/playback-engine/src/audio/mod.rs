//! Audio playback backends.
//!
//! The session loads one sound per channel, starts them looping, and then
//! only ever adjusts volumes. Backends are picked once at startup with
//! [`open_audio_backend`].

pub mod gst;
pub mod null;

use std::path::Path;
use std::time::Duration;

use dynso_common::config::AudioBackendKind;
use dynso_common::error::{DynsoError, DynsoResult};
use dynso_motion_core::VolumeVector;

pub use self::gst::{stereo_balance, GstAudioBackend};
pub use self::null::{AudioEvent, AudioLog, NullAudioBackend};

/// A sound that has been loaded but not necessarily played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub usize);

/// A playing sound whose volume can be adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(pub u32);

/// Playback collaborator.
pub trait AudioBackend: Send {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Register a sound file. Fails with `FileNotFound` when `path` is missing.
    fn load_sound(&mut self, path: &Path) -> DynsoResult<SoundHandle>;

    /// Start playing a loaded sound on a new channel.
    fn play(&mut self, sound: SoundHandle, looping: bool) -> DynsoResult<ChannelHandle>;

    /// Set a channel's volume in `[0, 1]`.
    fn set_volume(&mut self, channel: ChannelHandle, volume: f32) -> DynsoResult<()>;

    /// Set independent left and right volumes in `[0, 1]`.
    fn set_stereo_volume(
        &mut self,
        channel: ChannelHandle,
        left: f32,
        right: f32,
    ) -> DynsoResult<()>;

    fn stop(&mut self, channel: ChannelHandle) -> DynsoResult<()>;

    /// Per-iteration housekeeping such as restarting looped sounds.
    fn service(&mut self) -> DynsoResult<()> {
        Ok(())
    }

    /// Ramp every playing channel to silence over `duration`, then stop it.
    fn fade_out(&mut self, duration: Duration) -> DynsoResult<()>;
}

/// Open the configured playback backend.
pub fn open_audio_backend(kind: AudioBackendKind) -> DynsoResult<Box<dyn AudioBackend>> {
    match kind {
        AudioBackendKind::Gstreamer => Ok(Box::new(GstAudioBackend::new()?)),
        AudioBackendKind::Null => Ok(Box::new(NullAudioBackend::new())),
    }
}

/// Push volumes to the backend.
///
/// Channels without a handle and channels the backend reports as not
/// playing yet are skipped; every other failure is returned.
pub fn apply_volumes(
    audio: &mut dyn AudioBackend,
    channels: &[Option<ChannelHandle>],
    volumes: &VolumeVector,
) -> DynsoResult<()> {
    match *volumes {
        VolumeVector::Quad { volumes } => {
            for (slot, volume) in channels.iter().zip(volumes) {
                let Some(channel) = slot else {
                    tracing::trace!("Skipping volume for a channel with no sound");
                    continue;
                };
                skip_not_playing(audio.set_volume(*channel, volume))?;
            }
            Ok(())
        }
        VolumeVector::Stereo { left, right } => match channels.first() {
            Some(Some(channel)) => {
                skip_not_playing(audio.set_stereo_volume(*channel, left, right))
            }
            _ => {
                tracing::trace!("Skipping stereo volume with no sound");
                Ok(())
            }
        },
    }
}

fn skip_not_playing(result: DynsoResult<()>) -> DynsoResult<()> {
    match result {
        Err(DynsoError::NotPlayingYet { channel }) => {
            tracing::trace!(channel, "Channel not playing yet; volume ignored");
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn any_file() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")
    }

    #[test]
    fn quad_volumes_go_to_matching_channels() {
        let (mut audio, log) = NullAudioBackend::with_log();
        let sound = audio.load_sound(&any_file()).unwrap();
        let a = audio.play(sound, true).unwrap();
        let b = audio.play(sound, true).unwrap();
        log.clear();

        let volumes = VolumeVector::Quad {
            volumes: [1.0, 0.5, 0.25, 0.1],
        };
        apply_volumes(&mut audio, &[Some(a), None, Some(b), None], &volumes).unwrap();

        assert_eq!(
            log.events(),
            vec![
                AudioEvent::Volume { channel: a, volume: 1.0 },
                AudioEvent::Volume { channel: b, volume: 0.25 },
            ]
        );
    }

    #[test]
    fn unknown_channels_are_not_an_error() {
        let mut audio = NullAudioBackend::new();
        let volumes = VolumeVector::Stereo {
            left: 0.4,
            right: 1.0,
        };
        apply_volumes(&mut audio, &[Some(ChannelHandle(7))], &volumes).unwrap();
        apply_volumes(&mut audio, &[], &volumes).unwrap();
    }

    #[test]
    fn stereo_volumes_use_the_first_channel() {
        let (mut audio, log) = NullAudioBackend::with_log();
        let sound = audio.load_sound(&any_file()).unwrap();
        let channel = audio.play(sound, true).unwrap();
        log.clear();

        let volumes = VolumeVector::Stereo {
            left: 0.4,
            right: 1.0,
        };
        apply_volumes(&mut audio, &[Some(channel)], &volumes).unwrap();
        assert_eq!(
            log.events(),
            vec![AudioEvent::StereoVolume {
                channel,
                left: 0.4,
                right: 1.0
            }]
        );
    }

    #[test]
    fn null_backend_opens_by_kind() {
        let audio = open_audio_backend(AudioBackendKind::Null).unwrap();
        assert_eq!(audio.name(), "null");
    }
}
