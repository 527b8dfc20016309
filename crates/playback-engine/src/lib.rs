//! Dynso Playback Engine
//!
//! Connects a frame source and an audio backend through the motion
//! pipeline. Each captured frame is compared with the previous one, the
//! resulting quadrant weights become channel volumes, and the loop runs
//! until the source reports escape.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                 DynsoSession                  │
//! │  ┌─────────────┐  frames  ┌────────────────┐  │
//! │  │ VideoSource │ ───────▶ │ MotionPipeline │  │
//! │  └─────────────┘          └───────┬────────┘  │
//! │                                   │ volumes   │
//! │                                   ▼           │
//! │                           ┌──────────────┐    │
//! │                           │ AudioBackend │    │
//! │                           └──────────────┘    │
//! └───────────────────────────────────────────────┘
//! ```

pub mod audio;
mod gst_support;
pub mod session;
pub mod video;

pub use audio::{open_audio_backend, AudioBackend, ChannelHandle, SoundHandle};
pub use session::*;
pub use video::{open_video_source, InterruptFlag, KeyCode, VideoSource, ESCAPE};
