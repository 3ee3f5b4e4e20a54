// C ABI for the GStreamer player bridge
// Lets a native host (iOS, desktop, test harnesses) drive player views through
// C function tables: the host supplies the engine call surface and receives
// events, the engine reports back through the gstplayer_engine_* entry points.

use gstplayer_core::{
    BridgeError, Command, Configuration, EngineCallback, EngineFactory, EventSink,
    GstPlayerViewManager, PipelineEngine, PlayerEvent, Result, SurfaceHandle, UserNotifier,
    ViewId,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::sync::{Arc, Once, Weak};

/// Native engine call surface. Every entry is optional; missing ones are skipped.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct GstEngineVTable {
    pub user_data: *mut c_void,
    /// Returns 0 on success
    pub init_runtime: Option<extern "C" fn(user_data: *mut c_void) -> i32>,
    /// Returns a string owned by the engine, valid until the next call
    pub engine_info: Option<extern "C" fn(user_data: *mut c_void) -> *const c_char>,
    pub set_drawable_surface: Option<extern "C" fn(user_data: *mut c_void, view_id: ViewId, handle: usize)>,
    pub set_uri: Option<extern "C" fn(user_data: *mut c_void, view_id: ViewId, uri: *const c_char)>,
    pub set_audio_level_refresh_rate: Option<extern "C" fn(user_data: *mut c_void, view_id: ViewId, rate: i32)>,
    pub set_debugging: Option<extern "C" fn(user_data: *mut c_void, view_id: ViewId, is_debugging: bool)>,
    pub set_pipeline_state: Option<extern "C" fn(user_data: *mut c_void, view_id: ViewId, state: i32)>,
    /// The configuration is only valid for the duration of the call
    pub init_and_run: Option<extern "C" fn(user_data: *mut c_void, view_id: ViewId, configuration: *const GstConfiguration)>,
}

/// Startup configuration as seen by a C engine
#[repr(C)]
pub struct GstConfiguration {
    /// 0 when no drawable target is known
    pub initial_drawable_surface: usize,
    /// Null when no URI was set
    pub uri: *const c_char,
    pub is_debugging: bool,
    pub audio_level_refresh_rate: i32,
}

/// Host event delivery and user notices
#[repr(C)]
#[derive(Clone, Copy)]
pub struct GstHostCallbacks {
    pub user_data: *mut c_void,
    /// `payload_json` is null for payload-less events
    pub on_event: Option<
        extern "C" fn(user_data: *mut c_void, view_id: ViewId, name: *const c_char, payload_json: *const c_char),
    >,
    pub notify_user: Option<extern "C" fn(user_data: *mut c_void, message: *const c_char)>,
}

// -----------------------------------------------------------------------------
// Engine and host adapters
// -----------------------------------------------------------------------------

struct FfiEngine {
    vtable: GstEngineVTable,
    view_id: ViewId,
}

// The host owns user_data and guarantees its entry points may be called from
// the UI thread and engine threads.
unsafe impl Send for FfiEngine {}
unsafe impl Sync for FfiEngine {}

impl PipelineEngine for FfiEngine {
    fn init_runtime(&self) -> Result<()> {
        match self.vtable.init_runtime {
            Some(f) => match f(self.vtable.user_data) {
                0 => Ok(()),
                code => Err(BridgeError::EngineRuntime(format!(
                    "engine runtime init failed with code {}",
                    code
                ))),
            },
            None => Ok(()),
        }
    }

    fn engine_info(&self) -> String {
        let info = self
            .vtable
            .engine_info
            .map(|f| f(self.vtable.user_data))
            .unwrap_or(ptr::null());
        if info.is_null() {
            return "unknown".to_string();
        }
        unsafe { CStr::from_ptr(info) }.to_string_lossy().into_owned()
    }

    fn set_drawable_surface(&self, handle: SurfaceHandle) {
        if let Some(f) = self.vtable.set_drawable_surface {
            f(self.vtable.user_data, self.view_id, handle.as_raw());
        }
    }

    fn set_uri(&self, uri: &str) {
        if let Some(f) = self.vtable.set_uri {
            match CString::new(uri) {
                Ok(uri) => f(self.vtable.user_data, self.view_id, uri.as_ptr()),
                Err(e) => log::error!("URI contains NUL byte: {}", e),
            }
        }
    }

    fn set_audio_level_refresh_rate(&self, rate: i32) {
        if let Some(f) = self.vtable.set_audio_level_refresh_rate {
            f(self.vtable.user_data, self.view_id, rate);
        }
    }

    fn set_debugging(&self, is_debugging: bool) {
        if let Some(f) = self.vtable.set_debugging {
            f(self.vtable.user_data, self.view_id, is_debugging);
        }
    }

    fn set_pipeline_state(&self, state: i32) {
        if let Some(f) = self.vtable.set_pipeline_state {
            f(self.vtable.user_data, self.view_id, state);
        }
    }

    // C engines report through the gstplayer_engine_* entry points, addressed
    // by view id, so the callback object itself is not handed over.
    fn init_and_run(&self, configuration: Configuration, _callback: Weak<dyn EngineCallback>) {
        let Some(f) = self.vtable.init_and_run else {
            log::warn!("[view {}] engine has no init_and_run entry", self.view_id);
            return;
        };
        let uri = configuration.uri.as_deref().and_then(|uri| CString::new(uri).ok());
        let c_configuration = GstConfiguration {
            initial_drawable_surface: configuration
                .initial_drawable_surface
                .map(|h| h.as_raw())
                .unwrap_or(0),
            uri: uri.as_ref().map(|u| u.as_ptr()).unwrap_or(ptr::null()),
            is_debugging: configuration.is_debugging,
            audio_level_refresh_rate: configuration.audio_level_refresh_rate,
        };
        f(self.vtable.user_data, self.view_id, &c_configuration);
    }
}

struct FfiEngineFactory {
    vtable: GstEngineVTable,
}

unsafe impl Send for FfiEngineFactory {}
unsafe impl Sync for FfiEngineFactory {}

impl EngineFactory for FfiEngineFactory {
    fn create_engine(&self, view_id: ViewId) -> Arc<dyn PipelineEngine> {
        Arc::new(FfiEngine {
            vtable: self.vtable,
            view_id,
        })
    }
}

struct FfiHost {
    callbacks: GstHostCallbacks,
}

unsafe impl Send for FfiHost {}
unsafe impl Sync for FfiHost {}

impl EventSink for FfiHost {
    fn receive_event(&self, view_id: ViewId, event: PlayerEvent) {
        let Some(on_event) = self.callbacks.on_event else {
            return;
        };
        let payload = event.payload_json().and_then(|json| CString::new(json).ok());
        let name = match CString::new(event.name()) {
            Ok(name) => name,
            Err(e) => {
                log::error!("Invalid event name: {}", e);
                return;
            }
        };
        on_event(
            self.callbacks.user_data,
            view_id,
            name.as_ptr(),
            payload.as_ref().map(|p| p.as_ptr()).unwrap_or(ptr::null()),
        );
    }
}

impl UserNotifier for FfiHost {
    fn notify_user(&self, message: &str) {
        if let Some(notify) = self.callbacks.notify_user {
            match CString::new(message) {
                Ok(message) => notify(self.callbacks.user_data, message.as_ptr()),
                Err(e) => log::error!("Invalid notice text: {}", e),
            }
        } else {
            log::warn!("User notice: {}", message);
        }
    }
}

// -----------------------------------------------------------------------------
// Manager registry
// -----------------------------------------------------------------------------

static MANAGER_REGISTRY: Lazy<Mutex<HashMap<i64, Arc<GstPlayerViewManager>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static NEXT_MANAGER_ID: Lazy<Mutex<i64>> = Lazy::new(|| Mutex::new(1));
static INIT_LOGGER: Once = Once::new();

fn init_logging() {
    INIT_LOGGER.call_once(|| {
        // RUST_LOG overrides the default level
        let _ = env_logger::builder()
            .is_test(false)
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .try_init();
    });
}

fn register_manager(manager: GstPlayerViewManager) -> i64 {
    init_logging();
    let mut next = NEXT_MANAGER_ID.lock();
    let id = *next;
    *next += 1;
    drop(next);

    MANAGER_REGISTRY.lock().insert(id, Arc::new(manager));
    id
}

// The registry lock is released before the manager runs: engines may call back
// into gstplayer_engine_* synchronously.
fn with_manager<R>(id: i64, f: impl FnOnce(&GstPlayerViewManager) -> Result<R>) -> Result<R> {
    let manager = MANAGER_REGISTRY
        .lock()
        .get(&id)
        .cloned()
        .ok_or_else(|| BridgeError::Ffi(format!("Invalid manager ID: {}", id)))?;
    f(&manager)
}

fn with_controller(
    id: i64,
    view_id: ViewId,
    f: impl FnOnce(&gstplayer_core::PlayerController),
) -> Result<()> {
    with_manager(id, |m| m.controller(view_id)).map(|controller| f(controller.as_ref()))
}

fn to_code(result: Result<()>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            log::error!("FFI error: {}", err);
            -1
        }
    }
}

fn c_str<'a>(ptr: *const c_char) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(BridgeError::Ffi("null string".into()));
    }
    let c_str = unsafe { CStr::from_ptr(ptr) };
    Ok(c_str.to_str()?)
}

// -----------------------------------------------------------------------------
// Manager and view lifecycle
// -----------------------------------------------------------------------------

/// Create a view manager. Returns its id, or -1 on null tables.
#[no_mangle]
pub extern "C" fn gstplayer_manager_create(
    engine: *const GstEngineVTable,
    host: *const GstHostCallbacks,
) -> i64 {
    if engine.is_null() || host.is_null() {
        return -1;
    }
    let (vtable, callbacks) = unsafe { (*engine, *host) };
    let host = Arc::new(FfiHost { callbacks });
    let manager = GstPlayerViewManager::new(
        Arc::new(FfiEngineFactory { vtable }),
        host.clone(),
        host,
    );
    let id = register_manager(manager);
    log::info!("Created {} manager with ID: {}", GstPlayerViewManager::NAME, id);
    id
}

#[no_mangle]
pub extern "C" fn gstplayer_manager_release(manager_id: i64) -> i32 {
    match MANAGER_REGISTRY.lock().remove(&manager_id) {
        Some(_) => 0,
        None => -1,
    }
}

#[no_mangle]
pub extern "C" fn gstplayer_view_create(manager_id: i64, view_id: ViewId) -> i32 {
    to_code(with_manager(manager_id, |m| {
        m.create_view_instance(view_id);
        Ok(())
    }))
}

#[no_mangle]
pub extern "C" fn gstplayer_view_drop(manager_id: i64, view_id: ViewId) -> i32 {
    to_code(with_manager(manager_id, |m| {
        if m.drop_view_instance(view_id) {
            Ok(())
        } else {
            Err(BridgeError::UnknownView(view_id))
        }
    }))
}

// -----------------------------------------------------------------------------
// Surface lifecycle
// -----------------------------------------------------------------------------

/// `handle` is 0 when the platform has no drawable yet
#[no_mangle]
pub extern "C" fn gstplayer_surface_created(manager_id: i64, view_id: ViewId, handle: usize) -> i32 {
    to_code(with_manager(manager_id, |m| {
        m.surface(view_id)?.notify_created(SurfaceHandle::from_raw(handle));
        Ok(())
    }))
}

#[no_mangle]
pub extern "C" fn gstplayer_surface_changed(
    manager_id: i64,
    view_id: ViewId,
    handle: usize,
    format: i32,
    width: i32,
    height: i32,
) -> i32 {
    to_code(with_manager(manager_id, |m| {
        let handle = SurfaceHandle::from_raw(handle)
            .ok_or_else(|| BridgeError::Ffi("null surface handle".into()))?;
        m.surface(view_id)?.notify_changed(handle, format, width, height);
        Ok(())
    }))
}

#[no_mangle]
pub extern "C" fn gstplayer_surface_destroyed(manager_id: i64, view_id: ViewId) -> i32 {
    to_code(with_manager(manager_id, |m| {
        m.surface(view_id)?.notify_destroyed();
        Ok(())
    }))
}

// -----------------------------------------------------------------------------
// Properties and commands
// -----------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn gstplayer_set_uri(manager_id: i64, view_id: ViewId, uri: *const c_char) -> i32 {
    to_code(c_str(uri).and_then(|uri| with_manager(manager_id, |m| m.set_uri(view_id, uri))))
}

#[no_mangle]
pub extern "C" fn gstplayer_set_is_debugging(manager_id: i64, view_id: ViewId, is_debugging: bool) -> i32 {
    to_code(with_manager(manager_id, |m| m.set_is_debugging(view_id, is_debugging)))
}

#[no_mangle]
pub extern "C" fn gstplayer_set_audio_level_refresh_rate(manager_id: i64, view_id: ViewId, rate: i32) -> i32 {
    to_code(with_manager(manager_id, |m| m.set_audio_level_refresh_rate(view_id, rate)))
}

/// Dispatch a command by ordinal with `len` integer arguments
#[no_mangle]
pub extern "C" fn gstplayer_receive_command(
    manager_id: i64,
    view_id: ViewId,
    ordinal: i32,
    args: *const i32,
    len: usize,
) -> i32 {
    let args: Vec<Value> = if args.is_null() || len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(args, len) }
            .iter()
            .map(|arg| Value::from(*arg))
            .collect()
    };
    to_code(with_manager(manager_id, |m| m.receive_command(view_id, ordinal, &args)))
}

/// Ordinal for a command name, -1 if unknown
#[no_mangle]
pub extern "C" fn gstplayer_command_ordinal(name: *const c_char) -> i32 {
    c_str(name)
        .ok()
        .and_then(Command::from_name)
        .map(Command::ordinal)
        .unwrap_or(-1)
}

// -----------------------------------------------------------------------------
// Engine callbacks
// -----------------------------------------------------------------------------

#[no_mangle]
pub extern "C" fn gstplayer_engine_on_init(manager_id: i64, view_id: ViewId) -> i32 {
    to_code(with_controller(manager_id, view_id, |c| c.on_init()))
}

#[no_mangle]
pub extern "C" fn gstplayer_engine_on_state_changed(
    manager_id: i64,
    view_id: ViewId,
    old_state: i32,
    new_state: i32,
) -> i32 {
    to_code(with_controller(manager_id, view_id, |c| c.on_state_changed(old_state, new_state)))
}

#[no_mangle]
pub extern "C" fn gstplayer_engine_on_volume_changed(
    manager_id: i64,
    view_id: ViewId,
    rms: f64,
    peak: f64,
    decay: f64,
) -> i32 {
    to_code(with_controller(manager_id, view_id, |c| c.on_volume_changed(rms, peak, decay)))
}

#[no_mangle]
pub extern "C" fn gstplayer_engine_on_uri_changed(
    manager_id: i64,
    view_id: ViewId,
    new_uri: *const c_char,
) -> i32 {
    to_code(c_str(new_uri).and_then(|uri| with_controller(manager_id, view_id, |c| c.on_uri_changed(uri))))
}

#[no_mangle]
pub extern "C" fn gstplayer_engine_on_eos(manager_id: i64, view_id: ViewId) -> i32 {
    to_code(with_controller(manager_id, view_id, |c| c.on_eos()))
}

#[no_mangle]
pub extern "C" fn gstplayer_engine_on_element_error(
    manager_id: i64,
    view_id: ViewId,
    source: *const c_char,
    message: *const c_char,
    debug_info: *const c_char,
) -> i32 {
    let strings = c_str(source).and_then(|s| Ok((s, c_str(message)?, c_str(debug_info)?)));
    to_code(strings.and_then(|(source, message, debug_info)| {
        with_controller(manager_id, view_id, |c| c.on_element_error(source, message, debug_info))
    }))
}
