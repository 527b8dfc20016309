//! Backend that plays nothing and records what it was asked to do.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dynso_common::error::{DynsoError, DynsoResult};

use super::{AudioBackend, ChannelHandle, SoundHandle};

/// One call made against a [`NullAudioBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Loaded { sound: SoundHandle, path: PathBuf },
    Played { channel: ChannelHandle, sound: SoundHandle, looping: bool },
    Volume { channel: ChannelHandle, volume: f32 },
    StereoVolume { channel: ChannelHandle, left: f32, right: f32 },
    Stopped { channel: ChannelHandle },
    FadedOut { duration: Duration },
}

/// Shared view of the calls a [`NullAudioBackend`] has recorded.
#[derive(Debug, Clone, Default)]
pub struct AudioLog(Arc<Mutex<Vec<AudioEvent>>>);

impl AudioLog {
    fn lock(&self) -> MutexGuard<'_, Vec<AudioEvent>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: AudioEvent) {
        self.lock().push(event);
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of volume changes of either kind.
    pub fn volume_changes(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    AudioEvent::Volume { .. } | AudioEvent::StereoVolume { .. }
                )
            })
            .count()
    }
}

#[derive(Debug, Default)]
pub struct NullAudioBackend {
    sounds: Vec<PathBuf>,
    playing: Vec<bool>,
    log: AudioLog,
}

impl NullAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend plus a handle on its call log.
    pub fn with_log() -> (Self, AudioLog) {
        let backend = Self::default();
        let log = backend.log.clone();
        (backend, log)
    }

    fn ensure_playing(&self, channel: ChannelHandle) -> DynsoResult<()> {
        match self.playing.get(channel.0 as usize) {
            Some(true) => Ok(()),
            _ => Err(DynsoError::NotPlayingYet { channel: channel.0 }),
        }
    }
}

impl AudioBackend for NullAudioBackend {
    fn name(&self) -> &'static str {
        "null"
    }

    fn load_sound(&mut self, path: &Path) -> DynsoResult<SoundHandle> {
        if !path.exists() {
            return Err(DynsoError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let sound = SoundHandle(self.sounds.len());
        self.sounds.push(path.to_path_buf());
        self.log.record(AudioEvent::Loaded {
            sound,
            path: path.to_path_buf(),
        });
        Ok(sound)
    }

    fn play(&mut self, sound: SoundHandle, looping: bool) -> DynsoResult<ChannelHandle> {
        if sound.0 >= self.sounds.len() {
            return Err(DynsoError::audio(format!("Unknown sound {}", sound.0)));
        }
        let channel = ChannelHandle(self.playing.len() as u32);
        self.playing.push(true);
        self.log.record(AudioEvent::Played {
            channel,
            sound,
            looping,
        });
        Ok(channel)
    }

    fn set_volume(&mut self, channel: ChannelHandle, volume: f32) -> DynsoResult<()> {
        self.ensure_playing(channel)?;
        tracing::debug!(channel = channel.0, volume, "Volume");
        self.log.record(AudioEvent::Volume { channel, volume });
        Ok(())
    }

    fn set_stereo_volume(
        &mut self,
        channel: ChannelHandle,
        left: f32,
        right: f32,
    ) -> DynsoResult<()> {
        self.ensure_playing(channel)?;
        tracing::debug!(channel = channel.0, left, right, "Stereo volume");
        self.log.record(AudioEvent::StereoVolume {
            channel,
            left,
            right,
        });
        Ok(())
    }

    fn stop(&mut self, channel: ChannelHandle) -> DynsoResult<()> {
        self.ensure_playing(channel)?;
        self.playing[channel.0 as usize] = false;
        self.log.record(AudioEvent::Stopped { channel });
        Ok(())
    }

    fn fade_out(&mut self, duration: Duration) -> DynsoResult<()> {
        self.log.record(AudioEvent::FadedOut { duration });
        for playing in &mut self.playing {
            *playing = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml")
    }

    #[test]
    fn missing_sound_is_file_not_found() {
        let mut audio = NullAudioBackend::new();
        let err = audio
            .load_sound(Path::new("/definitely/not/here.ogg"))
            .unwrap_err();
        assert!(matches!(err, DynsoError::FileNotFound { .. }));
    }

    #[test]
    fn volume_before_play_is_not_playing_yet() {
        let mut audio = NullAudioBackend::new();
        let err = audio.set_volume(ChannelHandle(0), 0.5).unwrap_err();
        assert!(matches!(err, DynsoError::NotPlayingYet { channel: 0 }));
    }

    #[test]
    fn stopped_and_faded_channels_reject_volumes() {
        let (mut audio, log) = NullAudioBackend::with_log();
        let sound = audio.load_sound(&manifest()).unwrap();
        let first = audio.play(sound, true).unwrap();
        let second = audio.play(sound, false).unwrap();

        audio.stop(first).unwrap();
        assert!(audio.set_volume(first, 0.3).is_err());
        audio.set_volume(second, 0.3).unwrap();

        audio.fade_out(Duration::from_millis(800)).unwrap();
        assert!(audio.set_volume(second, 0.3).is_err());

        assert_eq!(log.volume_changes(), 1);
        assert_eq!(
            log.events().last(),
            Some(&AudioEvent::FadedOut {
                duration: Duration::from_millis(800)
            })
        );
    }

    #[test]
    fn unknown_sound_cannot_play() {
        let mut audio = NullAudioBackend::new();
        assert!(audio.play(SoundHandle(3), true).is_err());
    }
}
