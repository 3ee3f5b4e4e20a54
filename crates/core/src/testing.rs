// Recording test doubles for the engine and host collaborators

use crate::config::Configuration;
use crate::engine::{EngineCallback, EngineFactory, PipelineEngine};
use crate::error::{BridgeError, Result};
use crate::event::{EventSink, PlayerEvent, UserNotifier};
use crate::surface::{SurfaceHandle, ViewId};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// One native call, as seen by `RecordingEngine`
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    InitRuntime,
    EngineInfo,
    SetDrawableSurface(SurfaceHandle),
    SetUri(String),
    SetAudioLevelRefreshRate(i32),
    SetDebugging(bool),
    SetPipelineState(i32),
    InitAndRun(Configuration),
}

/// Engine that records every call and keeps the callback it was started with
#[derive(Default)]
pub struct RecordingEngine {
    calls: Mutex<Vec<EngineCall>>,
    callback: Mutex<Option<Weak<dyn EngineCallback>>>,
    runtime_error: Option<String>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose runtime initialization fails with `message`
    pub fn failing_runtime(message: &str) -> Self {
        Self {
            runtime_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().clone()
    }

    /// Calls made after construction-time setup
    pub fn commands(&self) -> Vec<EngineCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, EngineCall::InitRuntime | EngineCall::EngineInfo))
            .collect()
    }

    pub fn init_and_run_calls(&self) -> Vec<Configuration> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::InitAndRun(config) => Some(config),
                _ => None,
            })
            .collect()
    }

    /// Callback registered by `init_and_run`, used to play the engine's side.
    /// `None` once the controller behind it has been dropped.
    pub fn callback(&self) -> Option<Arc<dyn EngineCallback>> {
        self.callback.lock().as_ref().and_then(Weak::upgrade)
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().push(call);
    }
}

impl PipelineEngine for RecordingEngine {
    fn init_runtime(&self) -> Result<()> {
        self.record(EngineCall::InitRuntime);
        match &self.runtime_error {
            Some(message) => Err(BridgeError::EngineRuntime(message.clone())),
            None => Ok(()),
        }
    }

    fn engine_info(&self) -> String {
        self.record(EngineCall::EngineInfo);
        "GStreamer 1.22.0 (recording)".to_string()
    }

    fn set_drawable_surface(&self, handle: SurfaceHandle) {
        self.record(EngineCall::SetDrawableSurface(handle));
    }

    fn set_uri(&self, uri: &str) {
        self.record(EngineCall::SetUri(uri.to_string()));
    }

    fn set_audio_level_refresh_rate(&self, rate: i32) {
        self.record(EngineCall::SetAudioLevelRefreshRate(rate));
    }

    fn set_debugging(&self, is_debugging: bool) {
        self.record(EngineCall::SetDebugging(is_debugging));
    }

    fn set_pipeline_state(&self, state: i32) {
        self.record(EngineCall::SetPipelineState(state));
    }

    fn init_and_run(&self, configuration: Configuration, callback: Weak<dyn EngineCallback>) {
        self.record(EngineCall::InitAndRun(configuration));
        *self.callback.lock() = Some(callback);
    }
}

/// Factory handing out one `RecordingEngine` per view
#[derive(Default)]
pub struct RecordingEngineFactory {
    engines: Mutex<Vec<(ViewId, Arc<RecordingEngine>)>>,
}

impl RecordingEngineFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(&self, view_id: ViewId) -> Option<Arc<RecordingEngine>> {
        self.engines
            .lock()
            .iter()
            .rev()
            .find(|(id, _)| *id == view_id)
            .map(|(_, engine)| engine.clone())
    }
}

impl EngineFactory for RecordingEngineFactory {
    fn create_engine(&self, view_id: ViewId) -> Arc<dyn PipelineEngine> {
        let engine = Arc::new(RecordingEngine::new());
        self.engines.lock().push((view_id, engine.clone()));
        engine
    }
}

/// Sink that records every event with its target view
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(ViewId, PlayerEvent)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(ViewId, PlayerEvent)> {
        self.events.lock().clone()
    }

}

impl EventSink for RecordingSink {
    fn receive_event(&self, view_id: ViewId, event: PlayerEvent) {
        self.events.lock().push((view_id, event));
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl UserNotifier for RecordingNotifier {
    fn notify_user(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
