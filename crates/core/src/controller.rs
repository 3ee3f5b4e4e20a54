// Player controller: startup sequencing, command forwarding and callback translation

use crate::config::Configuration;
use crate::engine::{EngineCallback, PipelineEngine};
use crate::event::{EventSink, PlayerEvent, UserNotifier};
use crate::surface::{SurfaceCallback, SurfaceHandle, ViewId};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Drives one engine pipeline on behalf of one host view.
///
/// Surface lifecycle and host commands arrive on the UI thread; engine
/// callbacks arrive on engine threads and only touch `view_id` and `sink`.
///
/// The engine is started at most once per controller, and only once a
/// drawable target is known. Surface destruction does not undo that.
pub struct PlayerController {
    view_id: ViewId,
    engine: Arc<dyn PipelineEngine>,
    sink: Arc<dyn EventSink>,
    /// Written only while uninitialized; the lock also orders setters against startup
    configuration: Mutex<Configuration>,
    initialized: AtomicBool,
    current_surface: RwLock<Option<SurfaceHandle>>,
    runtime_ready: bool,
    me: Weak<PlayerController>,
}

impl PlayerController {
    /// Create a controller for `view_id` and bring up the engine runtime.
    ///
    /// A runtime failure is reported through `notifier`; the controller is
    /// still returned, degraded, and later calls reach the engine as usual.
    pub fn new(
        view_id: ViewId,
        engine: Arc<dyn PipelineEngine>,
        sink: Arc<dyn EventSink>,
        notifier: &dyn UserNotifier,
    ) -> Arc<Self> {
        log::info!("[controller {}] creating player controller", view_id);

        let runtime_ready = match engine.init_runtime() {
            Ok(()) => {
                log::debug!("[controller {}] engine runtime initialized", view_id);
                true
            }
            Err(e) => {
                log::error!("[controller {}] failed to initialize engine runtime: {}", view_id, e);
                notifier.notify_user(&e.to_string());
                false
            }
        };

        let info = engine.engine_info();
        log::info!("[controller {}] engine version: {}", view_id, info);

        Arc::new_cyclic(|me| Self {
            view_id,
            engine,
            sink,
            configuration: Mutex::new(Configuration::new()),
            initialized: AtomicBool::new(false),
            current_surface: RwLock::new(None),
            runtime_ready,
            me: me.clone(),
        })
    }

    pub fn view_id(&self) -> ViewId {
        self.view_id
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// False when the engine runtime failed to come up at construction
    pub fn is_runtime_ready(&self) -> bool {
        self.runtime_ready
    }

    /// Most recent drawable target reported by the surface
    pub fn current_surface(&self) -> Option<SurfaceHandle> {
        *self.current_surface.read()
    }

    /// Snapshot of the startup configuration
    pub fn configuration(&self) -> Configuration {
        self.configuration.lock().clone()
    }

    // ------------------------------------------------------------------
    // Surface lifecycle
    // ------------------------------------------------------------------

    /// Start the engine on first surface availability
    pub fn on_surface_created(&self, handle: Option<SurfaceHandle>) {
        log::debug!("[controller {}] surface created: {:?}", self.view_id, handle);

        if let Some(handle) = handle {
            *self.current_surface.write() = Some(handle);
        }
        let Some(target) = handle.or_else(|| self.current_surface()) else {
            log::debug!("[controller {}] no drawable target yet, startup deferred", self.view_id);
            return;
        };

        let snapshot = {
            let mut configuration = self.configuration.lock();
            if self
                .initialized
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                log::debug!("[controller {}] already initialized, ignoring", self.view_id);
                return;
            }
            configuration.set_initial_drawable_surface(target);
            configuration.clone()
        };

        // Weak: a running engine must not keep a dropped view's controller alive
        let callback: Weak<dyn EngineCallback> = self.me.clone();
        log::info!("[controller {}] starting engine with surface {:?}", self.view_id, target);
        self.engine.init_and_run(snapshot, callback);
    }

    /// Forward the (possibly new) drawable target, whatever the startup state
    pub fn on_surface_changed(&self, handle: SurfaceHandle, format: i32, width: i32, height: i32) {
        log::debug!(
            "[controller {}] surface changed: {:?} format={} {}x{}",
            self.view_id,
            handle,
            format,
            width,
            height
        );
        *self.current_surface.write() = Some(handle);
        self.engine.set_drawable_surface(handle);
    }

    /// Informational only: the pipeline keeps running and `initialized` stays set
    pub fn on_surface_destroyed(&self) {
        log::debug!("[controller {}] surface destroyed", self.view_id);
    }

    /// Allow the next surface creation to start the engine again.
    ///
    /// Only for engines known to tolerate a second `init_and_run`; nothing in
    /// the bridge calls this on its own.
    pub fn reset_initialization(&self) {
        let mut configuration = self.configuration.lock();
        configuration.initial_drawable_surface = None;
        self.initialized.store(false, Ordering::Release);
        log::info!("[controller {}] initialization reset", self.view_id);
    }

    // ------------------------------------------------------------------
    // Host commands and properties
    // ------------------------------------------------------------------

    /// Record a property for startup while the engine is not running yet
    fn record_for_startup(&self, f: impl FnOnce(&mut Configuration)) {
        let mut configuration = self.configuration.lock();
        if !self.is_initialized() {
            f(&mut configuration);
        }
    }

    pub fn set_uri(&self, uri: &str) {
        log::debug!("[controller {}] set_uri: {}", self.view_id, uri);
        self.record_for_startup(|c| c.set_uri(uri));
        self.engine.set_uri(uri);
    }

    pub fn set_debugging(&self, is_debugging: bool) {
        log::debug!("[controller {}] set_debugging: {}", self.view_id, is_debugging);
        self.record_for_startup(|c| c.set_debugging(is_debugging));
        self.engine.set_debugging(is_debugging);
    }

    pub fn set_audio_level_refresh_rate(&self, rate: i32) {
        log::debug!("[controller {}] set_audio_level_refresh_rate: {}", self.view_id, rate);
        self.record_for_startup(|c| c.set_audio_level_refresh_rate(rate));
        self.engine.set_audio_level_refresh_rate(rate);
    }

    /// Raw pipeline state code, passed through unvalidated
    pub fn set_state(&self, state: i32) {
        log::debug!("[controller {}] set_state: {}", self.view_id, state);
        self.engine.set_pipeline_state(state);
    }

    fn emit(&self, event: PlayerEvent) {
        self.sink.receive_event(self.view_id, event);
    }
}

impl EngineCallback for PlayerController {
    fn on_init(&self) {
        log::debug!("[controller {}] onInit", self.view_id);
        self.emit(PlayerEvent::PlayerInit);
    }

    fn on_state_changed(&self, old_state: i32, new_state: i32) {
        log::debug!(
            "[controller {}] onStateChanged: {} -> {}",
            self.view_id,
            old_state,
            new_state
        );
        self.emit(PlayerEvent::StateChanged { old_state, new_state });
    }

    fn on_volume_changed(&self, rms: f64, peak: f64, decay: f64) {
        log::trace!(
            "[controller {}] onVolumeChanged: rms={} peak={} decay={}",
            self.view_id,
            rms,
            peak,
            decay
        );
        self.emit(PlayerEvent::VolumeChanged { rms, peak, decay });
    }

    fn on_uri_changed(&self, new_uri: &str) {
        log::debug!("[controller {}] onUriChanged: {}", self.view_id, new_uri);
        self.emit(PlayerEvent::UriChanged {
            new_uri: new_uri.to_string(),
        });
    }

    fn on_eos(&self) {
        log::debug!("[controller {}] onEOS", self.view_id);
        self.emit(PlayerEvent::Eos);
    }

    fn on_element_error(&self, source: &str, message: &str, debug_info: &str) {
        log::error!(
            "[controller {}] element error from {}: {} ({})",
            self.view_id,
            source,
            message,
            debug_info
        );
        self.emit(PlayerEvent::ElementError {
            source: source.to_string(),
            message: message.to_string(),
            debug_info: debug_info.to_string(),
        });
    }
}

impl SurfaceCallback for PlayerController {
    fn surface_created(&self, handle: Option<SurfaceHandle>) {
        self.on_surface_created(handle);
    }

    fn surface_changed(&self, handle: SurfaceHandle, format: i32, width: i32, height: i32) {
        self.on_surface_changed(handle, format, width, height);
    }

    fn surface_destroyed(&self) {
        self.on_surface_destroyed();
    }
}
