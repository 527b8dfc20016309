//! Shared GStreamer plumbing.

use std::sync::OnceLock;

use dynso_common::error::{DynsoError, DynsoResult};
use gst::prelude::*;
use gstreamer as gst;

/// Initialize GStreamer once per process.
pub(crate) fn init_gstreamer() -> DynsoResult<()> {
    static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
    match init_res {
        Ok(()) => Ok(()),
        Err(e) => Err(DynsoError::unavailable(format!(
            "Failed to initialize GStreamer: {e}"
        ))),
    }
}

/// Parse a launch string into a pipeline.
pub(crate) fn launch_pipeline(name: &str, launch: &str) -> DynsoResult<gst::Pipeline> {
    init_gstreamer()?;

    let element = gst::parse::launch(launch).map_err(|e| {
        DynsoError::unavailable(format!("Failed to build {name} pipeline: {e}"))
    })?;

    element.dynamic_cast::<gst::Pipeline>().map_err(|_| {
        DynsoError::unavailable(format!("{name} launch string did not produce a pipeline"))
    })
}

/// Look up a named element inside a pipeline.
pub(crate) fn element(pipeline: &gst::Pipeline, name: &str) -> DynsoResult<gst::Element> {
    pipeline
        .by_name(name)
        .ok_or_else(|| DynsoError::unavailable(format!("Pipeline has no element named {name}")))
}

/// Move a pipeline to `state` and wait (bounded) for the transition.
pub(crate) fn set_state_blocking(
    pipeline: &gst::Pipeline,
    name: &str,
    state: gst::State,
) -> DynsoResult<()> {
    pipeline.set_state(state).map_err(|e| {
        DynsoError::unavailable(format!("Failed to set {name} pipeline to {state:?}: {e:?}"))
    })?;

    match pipeline.state(gst::ClockTime::from_seconds(5)) {
        (Ok(_), reached, _) if reached == state => Ok(()),
        (Ok(_), reached, _) => {
            tracing::warn!(
                pipeline = name,
                ?reached,
                target = ?state,
                "Pipeline did not reach target state within timeout"
            );
            Ok(())
        }
        (Err(e), _, _) => Err(DynsoError::unavailable(format!(
            "{name} pipeline failed to reach {state:?}: {e:?}"
        ))),
    }
}
