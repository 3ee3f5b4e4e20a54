// GStreamer C backend (gstreamer_backend.c), linked into the same library

use gstplayer_core::{
    BridgeError, Configuration, EngineCallback, PipelineEngine, Result, SurfaceHandle,
    DEFAULT_AUDIO_LEVEL_REFRESH_RATE,
};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::ptr;
use std::sync::{Arc, Weak};
use std::thread;

/// The `RctGstConfiguration` fields the backend reads. Field order follows
/// gstreamer_backend.h; Rust writes only the surface and the callbacks, and
/// goes through the `rct_gst_set_*` setters for everything else.
#[repr(C)]
#[allow(dead_code)]
struct RctGstConfiguration {
    initial_drawable_surface: usize,
    uri: *mut c_char,
    is_debugging: c_int,
    on_element_error: Option<extern "C" fn(*const c_char, *const c_char, *const c_char)>,
    on_state_changed: Option<extern "C" fn(c_int, c_int)>,
    on_uri_changed: Option<extern "C" fn(*const c_char)>,
    on_init: Option<extern "C" fn()>,
    on_eos: Option<extern "C" fn()>,
}

extern "C" {
    fn rct_gst_get_configuration() -> *mut RctGstConfiguration;
    fn rct_gst_get_info() -> *mut c_char;
    fn rct_gst_set_drawable_surface(drawable_surface: usize);
    fn rct_gst_set_uri(uri: *mut c_char);
    fn rct_gst_set_debugging(is_debugging: c_int);
    fn rct_gst_set_pipeline_state(state: c_int) -> c_int;
    fn rct_gst_init(configuration: *mut RctGstConfiguration);
    fn rct_gst_run_loop();

    fn gst_is_initialized() -> c_int;
    fn gst_init_check(argc: *mut c_int, argv: *mut *mut *mut c_char, error: *mut *mut c_void) -> c_int;
    fn g_free(mem: *mut c_void);
}

// The backend keeps a single pipeline and calls back through plain function
// pointers, so the receiving controller lives in a process-wide slot.
static ACTIVE_CALLBACK: Lazy<RwLock<Option<Weak<dyn EngineCallback>>>> =
    Lazy::new(|| RwLock::new(None));

fn active_callback() -> Option<Arc<dyn EngineCallback>> {
    ACTIVE_CALLBACK.read().as_ref().and_then(Weak::upgrade)
}

fn lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

extern "C" fn native_on_init() {
    if let Some(callback) = active_callback() {
        callback.on_init();
    }
}

extern "C" fn native_on_state_changed(old_state: c_int, new_state: c_int) {
    if let Some(callback) = active_callback() {
        callback.on_state_changed(old_state, new_state);
    }
}

extern "C" fn native_on_uri_changed(new_uri: *const c_char) {
    if let Some(callback) = active_callback() {
        callback.on_uri_changed(&lossy(new_uri));
    }
}

extern "C" fn native_on_eos() {
    if let Some(callback) = active_callback() {
        callback.on_eos();
    }
}

extern "C" fn native_on_element_error(source: *const c_char, message: *const c_char, debug_info: *const c_char) {
    if let Some(callback) = active_callback() {
        callback.on_element_error(&lossy(source), &lossy(message), &lossy(debug_info));
    }
}

/// `PipelineEngine` over the GStreamer C backend
pub struct GstBackendEngine {
    main_loop: Mutex<Option<thread::JoinHandle<()>>>,
}

impl GstBackendEngine {
    pub fn new() -> Self {
        Self {
            main_loop: Mutex::new(None),
        }
    }
}

impl Default for GstBackendEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineEngine for GstBackendEngine {
    fn init_runtime(&self) -> Result<()> {
        unsafe {
            if gst_is_initialized() != 0 {
                return Ok(());
            }
            if gst_init_check(ptr::null_mut(), ptr::null_mut(), ptr::null_mut()) == 0 {
                return Err(BridgeError::EngineRuntime(
                    "GStreamer could not be initialized".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn engine_info(&self) -> String {
        unsafe {
            let version = rct_gst_get_info();
            if version.is_null() {
                log::error!("Failed to obtain GStreamer version");
                return "unknown".to_string();
            }
            let info = lossy(version);
            g_free(version as *mut c_void);
            info
        }
    }

    fn set_drawable_surface(&self, handle: SurfaceHandle) {
        log::info!("Setting drawable surface: {:?}", handle);
        unsafe { rct_gst_set_drawable_surface(handle.as_raw()) }
    }

    fn set_uri(&self, uri: &str) {
        match CString::new(uri) {
            // The backend keeps its own copy
            Ok(uri) => unsafe { rct_gst_set_uri(uri.as_ptr() as *mut c_char) },
            Err(e) => log::error!("URI contains NUL byte: {}", e),
        }
    }

    // The backend pipeline has no level element
    fn set_audio_level_refresh_rate(&self, rate: i32) {
        log::debug!("Audio level refresh rate {} ignored by the GStreamer backend", rate);
    }

    fn set_debugging(&self, is_debugging: bool) {
        unsafe { rct_gst_set_debugging(is_debugging as c_int) }
    }

    fn set_pipeline_state(&self, state: i32) {
        let result = unsafe { rct_gst_set_pipeline_state(state) };
        log::debug!("Pipeline state {} requested, change return {}", state, result);
    }

    fn init_and_run(&self, configuration: Configuration, callback: Weak<dyn EngineCallback>) {
        *ACTIVE_CALLBACK.write() = Some(callback);

        if let Some(uri) = configuration.uri.as_deref() {
            self.set_uri(uri);
        }
        self.set_debugging(configuration.is_debugging);
        if configuration.audio_level_refresh_rate != DEFAULT_AUDIO_LEVEL_REFRESH_RATE {
            self.set_audio_level_refresh_rate(configuration.audio_level_refresh_rate);
        }

        unsafe {
            let native = rct_gst_get_configuration();
            if native.is_null() {
                log::error!("GStreamer backend returned no configuration");
                return;
            }
            if let Some(handle) = configuration.initial_drawable_surface {
                (*native).initial_drawable_surface = handle.as_raw();
                // rct_gst_init attaches the overlay from the stored surface;
                // before the pipeline exists this only records it
                rct_gst_set_drawable_surface(handle.as_raw());
            }
            (*native).on_init = Some(native_on_init);
            (*native).on_state_changed = Some(native_on_state_changed);
            (*native).on_uri_changed = Some(native_on_uri_changed);
            (*native).on_eos = Some(native_on_eos);
            (*native).on_element_error = Some(native_on_element_error);

            rct_gst_init(native);
        }
        log::debug!("GStreamer initialized");

        let spawned = thread::Builder::new()
            .name("gst-main-loop".to_string())
            .spawn(|| unsafe { rct_gst_run_loop() });
        match spawned {
            Ok(handle) => {
                *self.main_loop.lock() = Some(handle);
                log::debug!("GStreamer run loop started");
            }
            Err(e) => log::error!("Failed to start GStreamer run loop: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_configuration_layout_has_no_volume_fields() {
        let word = size_of::<usize>();
        assert_eq!(offset_of!(RctGstConfiguration, initial_drawable_surface), 0);
        assert_eq!(offset_of!(RctGstConfiguration, uri), word);
        assert_eq!(offset_of!(RctGstConfiguration, is_debugging), 2 * word);
        assert_eq!(offset_of!(RctGstConfiguration, on_element_error), 3 * word);
        assert_eq!(offset_of!(RctGstConfiguration, on_eos), 7 * word);
        assert_eq!(size_of::<RctGstConfiguration>(), 8 * word);
    }

    #[test]
    fn test_trampolines_skip_dropped_callback() {
        struct Counting(Mutex<u32>);
        impl EngineCallback for Counting {
            fn on_init(&self) {
                *self.0.lock() += 1;
            }
            fn on_state_changed(&self, _: i32, _: i32) {}
            fn on_volume_changed(&self, _: f64, _: f64, _: f64) {}
            fn on_uri_changed(&self, _: &str) {}
            fn on_eos(&self) {}
            fn on_element_error(&self, _: &str, _: &str, _: &str) {}
        }

        let callback = Arc::new(Counting(Mutex::new(0)));
        let as_dyn: Arc<dyn EngineCallback> = callback.clone();
        *ACTIVE_CALLBACK.write() = Some(Arc::downgrade(&as_dyn));
        drop(as_dyn);

        native_on_init();
        assert_eq!(*callback.0.lock(), 1);

        drop(callback);
        native_on_init();
        native_on_eos();
        *ACTIVE_CALLBACK.write() = None;
    }
}
