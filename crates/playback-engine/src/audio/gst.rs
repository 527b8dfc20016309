//! GStreamer playback: one pipeline per playing channel.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dynso_common::error::{DynsoError, DynsoResult};
use gst::prelude::*;
use gstreamer as gst;

use super::{AudioBackend, ChannelHandle, SoundHandle};
use crate::gst_support::{element, init_gstreamer, launch_pipeline, set_state_blocking};

const REQUIRED_ELEMENTS: [&str; 6] = [
    "uridecodebin",
    "audioconvert",
    "audioresample",
    "audiopanorama",
    "volume",
    "autoaudiosink",
];
const FADE_STEP: Duration = Duration::from_millis(20);

struct Channel {
    pipeline: gst::Pipeline,
    volume: gst::Element,
    panorama: gst::Element,
    looping: bool,
    level: f64,
}

impl Channel {
    fn apply(&mut self, volume: f32, pan: f32) {
        self.level = f64::from(volume.clamp(0.0, 1.0));
        self.volume.set_property("volume", self.level);
        self.panorama.set_property("panorama", pan.clamp(-1.0, 1.0));
    }

    fn shut_down(&self) {
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            tracing::warn!(error = ?e, "Failed to stop playback pipeline");
        }
    }
}

pub struct GstAudioBackend {
    sounds: Vec<PathBuf>,
    channels: Vec<Option<Channel>>,
}

impl GstAudioBackend {
    /// Fails with `CollaboratorUnavailable` when GStreamer or a required
    /// element is missing.
    pub fn new() -> DynsoResult<Self> {
        init_gstreamer()?;
        let missing: Vec<&str> = REQUIRED_ELEMENTS
            .into_iter()
            .filter(|name| gst::ElementFactory::find(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(DynsoError::unavailable(format!(
                "GStreamer audio elements not installed: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            sounds: Vec::new(),
            channels: Vec::new(),
        })
    }

    fn channel_mut(&mut self, channel: ChannelHandle) -> DynsoResult<&mut Channel> {
        self.channels
            .get_mut(channel.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(DynsoError::NotPlayingYet { channel: channel.0 })
    }
}

/// Overall volume and `audiopanorama` position that reproduce independent
/// left/right volumes with the `simple` panning method.
pub fn stereo_balance(left: f32, right: f32) -> (f32, f32) {
    let left = left.clamp(0.0, 1.0);
    let right = right.clamp(0.0, 1.0);
    if left == 0.0 && right == 0.0 {
        return (0.0, 0.0);
    }
    if right >= left {
        (right, 1.0 - left / right)
    } else {
        (left, -(1.0 - right / left))
    }
}

fn playback_launch(uri: &str) -> String {
    format!(
        "uridecodebin uri=\"{}\" ! audioconvert ! audioresample ! \
         audiopanorama name=pan method=simple ! volume name=vol volume=0 ! autoaudiosink",
        uri.replace('"', "\\\"")
    )
}

impl AudioBackend for GstAudioBackend {
    fn name(&self) -> &'static str {
        "gstreamer"
    }

    fn load_sound(&mut self, path: &Path) -> DynsoResult<SoundHandle> {
        let absolute = std::fs::canonicalize(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DynsoError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => DynsoError::Io(e),
        })?;

        let sound = SoundHandle(self.sounds.len());
        tracing::debug!(sound = sound.0, path = %absolute.display(), "Sound loaded");
        self.sounds.push(absolute);
        Ok(sound)
    }

    fn play(&mut self, sound: SoundHandle, looping: bool) -> DynsoResult<ChannelHandle> {
        let path = self
            .sounds
            .get(sound.0)
            .ok_or_else(|| DynsoError::audio(format!("Unknown sound {}", sound.0)))?;
        let uri = gst::glib::filename_to_uri(path, None)
            .map_err(|e| DynsoError::audio(format!("Bad sound path {}: {e}", path.display())))?;

        let pipeline = launch_pipeline("playback", &playback_launch(&uri))?;
        let volume = element(&pipeline, "vol")?;
        let panorama = element(&pipeline, "pan")?;
        set_state_blocking(&pipeline, "playback", gst::State::Playing)?;

        let channel = ChannelHandle(self.channels.len() as u32);
        tracing::info!(channel = channel.0, sound = sound.0, looping, "Playing sound");
        self.channels.push(Some(Channel {
            pipeline,
            volume,
            panorama,
            looping,
            level: 0.0,
        }));
        Ok(channel)
    }

    fn set_volume(&mut self, channel: ChannelHandle, volume: f32) -> DynsoResult<()> {
        tracing::debug!(channel = channel.0, volume, "Volume");
        self.channel_mut(channel)?.apply(volume, 0.0);
        Ok(())
    }

    fn set_stereo_volume(
        &mut self,
        channel: ChannelHandle,
        left: f32,
        right: f32,
    ) -> DynsoResult<()> {
        let (volume, pan) = stereo_balance(left, right);
        tracing::debug!(channel = channel.0, left, right, volume, pan, "Stereo volume");
        self.channel_mut(channel)?.apply(volume, pan);
        Ok(())
    }

    fn stop(&mut self, channel: ChannelHandle) -> DynsoResult<()> {
        let slot = self
            .channels
            .get_mut(channel.0 as usize)
            .and_then(Option::take)
            .ok_or(DynsoError::NotPlayingYet { channel: channel.0 })?;
        slot.shut_down();
        tracing::debug!(channel = channel.0, "Channel stopped");
        Ok(())
    }

    fn service(&mut self) -> DynsoResult<()> {
        for (index, slot) in self.channels.iter_mut().enumerate() {
            let Some(channel) = slot.as_ref() else {
                continue;
            };
            let Some(bus) = channel.pipeline.bus() else {
                continue;
            };

            let mut finished = false;
            while let Some(msg) =
                bus.pop_filtered(&[gst::MessageType::Eos, gst::MessageType::Error])
            {
                match msg.view() {
                    gst::MessageView::Eos(..) if channel.looping => {
                        channel
                            .pipeline
                            .seek_simple(
                                gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
                                gst::ClockTime::ZERO,
                            )
                            .map_err(|e| {
                                DynsoError::audio(format!("Failed to loop channel {index}: {e}"))
                            })?;
                        tracing::trace!(channel = index, "Looped sound");
                    }
                    gst::MessageView::Eos(..) => finished = true,
                    gst::MessageView::Error(err) => {
                        return Err(DynsoError::audio(format!(
                            "Playback error on channel {index}: {} ({:?})",
                            err.error(),
                            err.debug()
                        )));
                    }
                    _ => {}
                }
            }

            if finished {
                tracing::debug!(channel = index, "Sound finished");
                if let Some(channel) = slot.take() {
                    channel.shut_down();
                }
            }
        }
        Ok(())
    }

    fn fade_out(&mut self, duration: Duration) -> DynsoResult<()> {
        let steps = (duration.as_millis() / FADE_STEP.as_millis()).max(1) as u32;
        let playing: Vec<(usize, f64)> = self
            .channels
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (i, c.level)))
            .collect();
        tracing::info!(
            channels = playing.len(),
            duration_ms = duration.as_millis() as u64,
            "Fading out"
        );

        for step in 1..=steps {
            let factor = 1.0 - f64::from(step) / f64::from(steps);
            for (index, level) in &playing {
                if let Some(Some(channel)) = self.channels.get(*index) {
                    channel.volume.set_property("volume", level * factor);
                }
            }
            std::thread::sleep(FADE_STEP.min(duration));
        }

        for slot in &mut self.channels {
            if let Some(channel) = slot.take() {
                channel.shut_down();
            }
        }
        Ok(())
    }
}

impl Drop for GstAudioBackend {
    fn drop(&mut self) {
        for channel in self.channels.iter().flatten() {
            channel.shut_down();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: (f32, f32), expected: (f32, f32)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-6 && (actual.1 - expected.1).abs() < 1e-6,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn balanced_volumes_stay_centred() {
        assert_close(stereo_balance(0.6, 0.6), (0.6, 0.0));
        assert_close(stereo_balance(0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn louder_right_pans_right() {
        // simple panning attenuates the left side by (1 - pan)
        let (volume, pan) = stereo_balance(0.25, 1.0);
        assert_close((volume, pan), (1.0, 0.75));
        assert!((volume * (1.0 - pan) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn louder_left_pans_left() {
        let (volume, pan) = stereo_balance(0.8, 0.2);
        assert_close((volume, pan), (0.8, -0.75));
        assert!((volume * (1.0 + pan) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        assert_close(stereo_balance(2.0, -1.0), (1.0, -1.0));
    }

    #[test]
    fn launch_names_the_volume_and_pan_elements() {
        let launch = playback_launch("file:///tmp/a%20b.ogg");
        assert!(launch.starts_with("uridecodebin uri=\"file:///tmp/a%20b.ogg\""));
        assert!(launch.contains("audiopanorama name=pan method=simple"));
        assert!(launch.contains("volume name=vol"));
    }
}
