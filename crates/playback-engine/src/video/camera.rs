//! Webcam frames through a GStreamer appsink.

use std::time::Duration;

use dynso_common::error::{DynsoError, DynsoResult};
use dynso_motion_core::Frame;
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;

use super::{wait_for_interrupt, InterruptFlag, KeyCode, VideoSource};
use crate::gst_support::{element, launch_pipeline, set_state_blocking};

const SAMPLE_TIMEOUT: Duration = Duration::from_secs(5);
const SINK_NAME: &str = "frames";

/// Grayscale webcam capture.
pub struct GstCameraSource {
    device: Option<String>,
    pipeline: gst::Pipeline,
    sink: gst_app::AppSink,
    interrupt: InterruptFlag,
    frames: u64,
}

impl GstCameraSource {
    /// Open `device`, or the best-looking V4L2 node when `None`.
    pub fn open(device: Option<&str>, interrupt: InterruptFlag) -> DynsoResult<Self> {
        let device = device.map(str::to_string).or_else(detect_default_webcam_device);
        let launch = camera_launch(device.as_deref());
        tracing::debug!(launch = %launch, "Building camera pipeline");

        let pipeline = launch_pipeline("camera", &launch)?;
        let sink = element(&pipeline, SINK_NAME)?
            .dynamic_cast::<gst_app::AppSink>()
            .map_err(|_| DynsoError::unavailable("Camera sink is not an appsink"))?;

        set_state_blocking(&pipeline, "camera", gst::State::Playing).map_err(|e| {
            let _ = pipeline.set_state(gst::State::Null);
            DynsoError::unavailable(format!(
                "Webcam {} could not be opened: {e}",
                device.as_deref().unwrap_or("(auto)")
            ))
        })?;

        tracing::info!(device = device.as_deref().unwrap_or("auto"), "Webcam opened");

        Ok(Self {
            device,
            pipeline,
            sink,
            interrupt,
            frames: 0,
        })
    }

    fn pull_frame(&self) -> DynsoResult<Frame> {
        let sample = self.sink.try_pull_sample(gst::ClockTime::from_nseconds(
            SAMPLE_TIMEOUT.as_nanos() as u64,
        ));
        let Some(sample) = sample else {
            if self.sink.is_eos() {
                return Err(DynsoError::capture("Webcam stream ended"));
            }
            return Err(DynsoError::capture(format!(
                "No webcam frame within {}s",
                SAMPLE_TIMEOUT.as_secs()
            )));
        };

        let caps = sample
            .caps()
            .ok_or_else(|| DynsoError::capture("Webcam sample has no caps"))?;
        let info = gst_video::VideoInfo::from_caps(caps)
            .map_err(|e| DynsoError::capture(format!("Unreadable webcam caps: {e}")))?;
        let buffer = sample
            .buffer()
            .ok_or_else(|| DynsoError::capture("Webcam sample has no buffer"))?;
        let map = buffer
            .map_readable()
            .map_err(|e| DynsoError::capture(format!("Failed to map webcam buffer: {e}")))?;

        let stride = info.stride()[0].max(0) as usize;
        pack_rows(map.as_slice(), info.width(), info.height(), stride)
    }
}

impl VideoSource for GstCameraSource {
    fn describe(&self) -> String {
        format!("webcam {}", self.device.as_deref().unwrap_or("(auto)"))
    }

    fn query_frame(&mut self) -> DynsoResult<Frame> {
        let frame = self.pull_frame()?;
        self.frames += 1;
        if self.frames == 1 {
            let (width, height) = frame.dimensions();
            tracing::info!(width, height, "First webcam frame");
        }
        Ok(frame)
    }

    fn poll_key(&mut self, timeout: Duration) -> Option<KeyCode> {
        wait_for_interrupt(&self.interrupt, timeout)
    }
}

impl Drop for GstCameraSource {
    fn drop(&mut self) {
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            tracing::warn!(error = ?e, "Failed to stop camera pipeline");
        }
        tracing::debug!(frames = self.frames, "Webcam closed");
    }
}

fn camera_launch(device: Option<&str>) -> String {
    let source = match device {
        Some(dev) => format!("v4l2src device=\"{}\"", dev.replace('"', "\\\"")),
        None => "autovideosrc".to_string(),
    };
    format!(
        "{source} ! videoconvert ! video/x-raw,format=GRAY8 ! \
         appsink name={SINK_NAME} max-buffers=1 drop=true sync=false"
    )
}

/// Copy `height` rows of `width` bytes out of a strided plane.
fn pack_rows(data: &[u8], width: u32, height: u32, stride: usize) -> DynsoResult<Frame> {
    let row = width as usize;
    if width == 0 || height == 0 {
        return Err(DynsoError::capture("Webcam produced an empty frame"));
    }
    if stride < row || data.len() < stride * (height as usize - 1) + row {
        return Err(DynsoError::capture(format!(
            "Webcam buffer of {} bytes is too small for {width}x{height} (stride {stride})",
            data.len()
        )));
    }

    let mut packed = Vec::with_capacity(row * height as usize);
    for chunk in data.chunks(stride).take(height as usize) {
        packed.extend_from_slice(&chunk[..row]);
    }
    Frame::from_raw(width, height, packed)
        .ok_or_else(|| DynsoError::capture("Webcam frame has the wrong size"))
}

/// Pick the most webcam-like `/dev/videoN` node.
fn detect_default_webcam_device() -> Option<String> {
    let mut candidates: Vec<(String, u32)> = (0..16u32)
        .filter_map(|idx| {
            let dev_path = format!("/dev/video{idx}");
            if !std::path::Path::new(&dev_path).exists() {
                return None;
            }
            let name = std::fs::read_to_string(format!("/sys/class/video4linux/video{idx}/name"))
                .unwrap_or_default();
            let score = webcam_score(&name, probe_v4l2_capture_capability(&dev_path));
            Some((dev_path, score))
        })
        .collect();

    // Stable sort keeps lower indices first among equal scores.
    candidates.sort_by(|a, b| b.1.cmp(&a.1));
    let (device, score) = candidates.into_iter().next()?;
    tracing::info!(device = %device, score, "Selected webcam device");
    Some(device)
}

/// Higher means more likely to be a webcam; 0 rules the device out.
fn webcam_score(name: &str, supports_capture: Option<bool>) -> u32 {
    const WEBCAM_HINTS: [&str; 6] = ["webcam", "camera", "cam", "facetime", "logitech", "uvc"];
    const OTHER_HINTS: [&str; 6] = ["tuner", "dvb", "hdmi", "encoder", "decoder", "metadata"];

    let name = name.to_lowercase();
    if OTHER_HINTS.iter().any(|kw| name.contains(kw)) {
        return 0;
    }
    let named_webcam = WEBCAM_HINTS.iter().any(|kw| name.contains(kw));

    match (named_webcam, supports_capture) {
        (true, Some(true)) => 100,
        (true, _) => 80,
        (false, Some(true)) => 50,
        (false, Some(false)) => 0,
        (false, None) => 10,
    }
}

/// `Some(true)` when `v4l2-ctl` reports Video Capture, `None` without `v4l2-ctl`.
fn probe_v4l2_capture_capability(dev_path: &str) -> Option<bool> {
    let output = std::process::Command::new("v4l2-ctl")
        .args(["--device", dev_path, "--info"])
        .output()
        .ok()?;

    if !output.status.success() {
        return Some(false);
    }
    let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
    Some(stdout.contains("video capture"))
}
