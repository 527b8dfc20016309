//! Frame sources.
//!
//! A [`VideoSource`] hands out grayscale frames and reports key presses.
//! The session only depends on the trait; the concrete source is chosen
//! by [`open_video_source`].

pub mod camera;
pub mod synthetic;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dynso_common::config::{CaptureDefaults, VideoSourceKind};
use dynso_common::error::DynsoResult;
use dynso_motion_core::Frame;

pub use camera::GstCameraSource;
pub use synthetic::{SyntheticScene, SyntheticSource};

/// Key code reported by [`VideoSource::poll_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

/// The key that ends a capture session.
pub const ESCAPE: KeyCode = KeyCode(27);

/// Shared flag that asks a source to report [`ESCAPE`] on its next poll.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sleep for up to `timeout`, returning [`ESCAPE`] as soon as `interrupt` is raised.
pub(crate) fn wait_for_interrupt(interrupt: &InterruptFlag, timeout: Duration) -> Option<KeyCode> {
    const SLICE: Duration = Duration::from_millis(10);

    let deadline = Instant::now() + timeout;
    loop {
        if interrupt.is_raised() {
            return Some(ESCAPE);
        }
        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        std::thread::sleep(SLICE.min(deadline - now));
    }
}

/// A source of grayscale frames.
pub trait VideoSource: Send {
    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Block until the next frame is available.
    fn query_frame(&mut self) -> DynsoResult<Frame>;

    /// Wait up to `timeout` for a key press.
    fn poll_key(&mut self, timeout: Duration) -> Option<KeyCode>;
}

/// Open the configured frame source.
pub fn open_video_source(
    kind: VideoSourceKind,
    capture: &CaptureDefaults,
    interrupt: InterruptFlag,
) -> DynsoResult<Box<dyn VideoSource>> {
    match kind {
        VideoSourceKind::Camera => {
            let source = GstCameraSource::open(capture.device.as_deref(), interrupt)?;
            Ok(Box::new(source))
        }
        VideoSourceKind::Synthetic => Ok(Box::new(
            SyntheticSource::new(capture.synthetic_width, capture.synthetic_height)
                .with_interrupt(interrupt),
        )),
    }
}
