//! Shared plumbing for the Dynso crates.
//!
//! - [`error`]: the `DynsoError` enum and `DynsoResult` alias
//! - [`config`]: JSON settings for the pipeline, capture, audio and logging
//! - [`clock`]: session time and snapshot pacing
//! - [`logging`]: `tracing` subscriber setup

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
