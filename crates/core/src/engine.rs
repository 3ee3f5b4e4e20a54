// Native pipeline engine call surface and its callback contract

use crate::config::Configuration;
use crate::error::Result;
use crate::surface::{SurfaceHandle, ViewId};
use std::sync::{Arc, Weak};

/// Pipeline state codes understood by the GStreamer engine.
///
/// The bridge forwards raw integers and never validates them; this enum is a
/// convenience for hosts that want names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum GstState {
    VoidPending = 0,
    Null = 1,
    Ready = 2,
    Paused = 3,
    Playing = 4,
}

impl GstState {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(GstState::VoidPending),
            1 => Some(GstState::Null),
            2 => Some(GstState::Ready),
            3 => Some(GstState::Paused),
            4 => Some(GstState::Playing),
            _ => None,
        }
    }
}

/// Callbacks the engine invokes on pipeline and telemetry events.
///
/// Called from engine threads, in any order relative to commands.
/// Implementations must be lightweight and non-blocking.
pub trait EngineCallback: Send + Sync {
    /// Pipeline created and ready
    fn on_init(&self);

    /// Pipeline state changed
    fn on_state_changed(&self, old_state: i32, new_state: i32);

    /// Audio level telemetry
    fn on_volume_changed(&self, rms: f64, peak: f64, decay: f64);

    /// URI change applied
    fn on_uri_changed(&self, new_uri: &str);

    /// End of stream
    fn on_eos(&self);

    /// A pipeline element reported an error
    fn on_element_error(&self, source: &str, message: &str, debug_info: &str);
}

/// Fixed call surface of the native engine.
///
/// Everything except `init_runtime` and `engine_info` is fire-and-forget:
/// the bridge does not inspect outcomes and never retries. Setters must be
/// safe to call before `init_and_run`.
pub trait PipelineEngine: Send + Sync {
    /// One-time engine runtime setup, run when a controller is constructed
    fn init_runtime(&self) -> Result<()>;

    /// Engine version string
    fn engine_info(&self) -> String;

    /// Retarget rendering to a new drawable
    fn set_drawable_surface(&self, handle: SurfaceHandle);

    fn set_uri(&self, uri: &str);

    /// Interval between volume level callbacks, in milliseconds
    fn set_audio_level_refresh_rate(&self, rate: i32);

    fn set_debugging(&self, is_debugging: bool);

    /// Request a pipeline state (see `GstState` for the usual codes)
    fn set_pipeline_state(&self, state: i32);

    /// Build the pipeline from `configuration` and start it.
    /// The engine reports back through `callback` from its own threads,
    /// upgrading it per call; a dead callback means the view is gone.
    fn init_and_run(&self, configuration: Configuration, callback: Weak<dyn EngineCallback>);
}

/// Creates the engine a view's controller talks to
pub trait EngineFactory: Send + Sync {
    fn create_engine(&self, view_id: ViewId) -> Arc<dyn PipelineEngine>;
}

/// Factory handing every view the same engine instance
pub struct SharedEngineFactory {
    engine: Arc<dyn PipelineEngine>,
}

impl SharedEngineFactory {
    pub fn new(engine: Arc<dyn PipelineEngine>) -> Self {
        Self { engine }
    }
}

impl EngineFactory for SharedEngineFactory {
    fn create_engine(&self, _view_id: ViewId) -> Arc<dyn PipelineEngine> {
        self.engine.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gst_state_codes() {
        for state in [
            GstState::VoidPending,
            GstState::Null,
            GstState::Ready,
            GstState::Paused,
            GstState::Playing,
        ] {
            assert_eq!(GstState::from_code(state.code()), Some(state));
        }
        assert_eq!(GstState::Playing.code(), 4);
        assert_eq!(GstState::from_code(5), None);
        assert_eq!(GstState::from_code(-1), None);
    }
}
