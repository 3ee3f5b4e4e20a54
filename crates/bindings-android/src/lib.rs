// JNI bindings for the Android React Native host
// The Java view manager owns the SurfaceView and forwards its lifecycle, props
// and commands here; events come back through RCTGstPlayerBridge.receiveEvent.

#[cfg(target_os = "android")]
mod backend;
#[cfg(target_os = "android")]
mod host;

#[cfg(target_os = "android")]
pub use backend::GstBackendEngine;
#[cfg(target_os = "android")]
pub use host::JniHost;

use gstplayer_core::GstPlayerViewManager;
use serde_json::{json, Map, Value};

/// Command export for `getCommandsMap()`, as a JSON object of name to ordinal
pub fn commands_map_json() -> String {
    let map: Map<String, Value> = GstPlayerViewManager::commands_map()
        .into_iter()
        .map(|(name, ordinal)| (name.to_string(), Value::from(ordinal)))
        .collect();
    Value::Object(map).to_string()
}

/// Event export for `getExportedCustomDirectEventTypeConstants()`
pub fn exported_events_json() -> String {
    let map: Map<String, Value> = GstPlayerViewManager::exported_event_types()
        .into_iter()
        .map(|(name, registration)| (name.to_string(), json!({ "registrationName": registration })))
        .collect();
    Value::Object(map).to_string()
}

#[cfg(target_os = "android")]
mod jni_bridge {
    use super::*;
    use crate::backend::GstBackendEngine;
    use crate::host::JniHost;
    use gstplayer_core::{BridgeError, Result, SharedEngineFactory, SurfaceHandle, ViewId};
    use jni::objects::{JClass, JIntArray, JObject, JString};
    use jni::sys::{jboolean, jint, jlong, jobject, jstring, JNI_FALSE};
    use jni::JNIEnv;
    use once_cell::sync::Lazy;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::os::raw::c_void;
    use std::sync::Arc;

    #[link(name = "android")]
    extern "C" {
        fn ANativeWindow_fromSurface(env: *mut jni::sys::JNIEnv, surface: jobject) -> *mut c_void;
    }

    static MANAGER_REGISTRY: Lazy<Mutex<HashMap<i64, Arc<GstPlayerViewManager>>>> =
        Lazy::new(|| Mutex::new(HashMap::new()));
    static NEXT_MANAGER_ID: Lazy<Mutex<i64>> = Lazy::new(|| Mutex::new(1));
    // One pipeline per process: the C backend keeps global state
    static ENGINE: Lazy<Arc<GstBackendEngine>> = Lazy::new(|| Arc::new(GstBackendEngine::new()));

    fn init_logging() {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("RCTGstPlayer"),
        );
    }

    fn with_manager<R>(id: i64, f: impl FnOnce(&GstPlayerViewManager) -> Result<R>) -> Result<R> {
        let manager = MANAGER_REGISTRY
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| BridgeError::Ffi(format!("Invalid manager ID: {}", id)))?;
        f(&manager)
    }

    fn to_code(result: Result<()>) -> jint {
        match result {
            Ok(_) => 0,
            Err(err) => {
                log::error!("JNI error: {}", err);
                -1
            }
        }
    }

    fn jstring_to_string(env: &mut JNIEnv, jstr: &JString) -> Result<String> {
        let java_str = env.get_string(jstr)?;
        Ok(java_str.into())
    }

    fn string_to_jstring(env: &JNIEnv, s: &str) -> jstring {
        match env.new_string(s) {
            Ok(j) => j.into_raw(),
            Err(e) => {
                log::error!("Failed to create Java string: {}", e);
                std::ptr::null_mut()
            }
        }
    }

    /// Native window behind a `android.view.Surface`, `None` for null surfaces
    fn surface_handle(env: &JNIEnv, surface: &JObject) -> Option<SurfaceHandle> {
        if surface.is_null() {
            return None;
        }
        let window = unsafe { ANativeWindow_fromSurface(env.get_raw(), surface.as_raw()) };
        SurfaceHandle::from_raw(window as usize)
    }

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeCreateManager(
        env: JNIEnv,
        _class: JClass,
        emitter: JObject,
    ) -> jlong {
        init_logging();

        let host = match JniHost::new(&env, emitter) {
            Ok(host) => Arc::new(host),
            Err(e) => {
                log::error!("Failed to bind event emitter: {}", e);
                return -1;
            }
        };
        let manager = GstPlayerViewManager::new(
            Arc::new(SharedEngineFactory::new(ENGINE.clone())),
            host.clone(),
            host,
        );

        let mut next = NEXT_MANAGER_ID.lock();
        let id = *next;
        *next += 1;
        drop(next);

        MANAGER_REGISTRY.lock().insert(id, Arc::new(manager));
        log::info!("{} manager created with ID: {}", GstPlayerViewManager::NAME, id);
        id
    }

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeReleaseManager(
        _env: JNIEnv,
        _class: JClass,
        manager_id: jlong,
    ) -> jint {
        match MANAGER_REGISTRY.lock().remove(&manager_id) {
            Some(_) => 0,
            None => -1,
        }
    }

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeCreateView(
        _env: JNIEnv,
        _class: JClass,
        manager_id: jlong,
        view_id: jint,
    ) -> jint {
        to_code(with_manager(manager_id, |m| {
            m.create_view_instance(view_id);
            Ok(())
        }))
    }

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeDropView(
        _env: JNIEnv,
        _class: JClass,
        manager_id: jlong,
        view_id: jint,
    ) -> jint {
        to_code(with_manager(manager_id, |m| {
            m.drop_view_instance(view_id);
            Ok(())
        }))
    }

    // SurfaceHolder.Callback

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeSurfaceCreated(
        env: JNIEnv,
        _class: JClass,
        manager_id: jlong,
        view_id: jint,
        surface: JObject,
    ) -> jint {
        let handle = surface_handle(&env, &surface);
        to_code(with_manager(manager_id, |m| {
            m.surface(view_id)?.notify_created(handle);
            Ok(())
        }))
    }

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeSurfaceChanged(
        env: JNIEnv,
        _class: JClass,
        manager_id: jlong,
        view_id: jint,
        surface: JObject,
        format: jint,
        width: jint,
        height: jint,
    ) -> jint {
        let Some(handle) = surface_handle(&env, &surface) else {
            log::info!("Surface is NULL");
            return -1;
        };
        to_code(with_manager(manager_id, |m| {
            m.surface(view_id)?.notify_changed(handle, format, width, height);
            Ok(())
        }))
    }

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeSurfaceDestroyed(
        _env: JNIEnv,
        _class: JClass,
        manager_id: jlong,
        view_id: jint,
    ) -> jint {
        to_code(with_manager(manager_id, |m| {
            m.surface(view_id)?.notify_destroyed();
            Ok(())
        }))
    }

    // @ReactProp setters

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeSetUri(
        mut env: JNIEnv,
        _class: JClass,
        manager_id: jlong,
        view_id: jint,
        uri: JString,
    ) -> jint {
        let result = jstring_to_string(&mut env, &uri)
            .and_then(|uri| with_manager(manager_id, |m| m.set_uri(view_id, &uri)));
        to_code(result)
    }

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeSetIsDebugging(
        _env: JNIEnv,
        _class: JClass,
        manager_id: jlong,
        view_id: jint,
        is_debugging: jboolean,
    ) -> jint {
        to_code(with_manager(manager_id, |m| {
            m.set_is_debugging(view_id, is_debugging != JNI_FALSE)
        }))
    }

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeSetAudioLevelRefreshRate(
        _env: JNIEnv,
        _class: JClass,
        manager_id: jlong,
        view_id: jint,
        rate: jint,
    ) -> jint {
        to_code(with_manager(manager_id, |m| m.set_audio_level_refresh_rate(view_id, rate)))
    }

    // receiveCommand

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeReceiveCommand(
        env: JNIEnv,
        _class: JClass,
        manager_id: jlong,
        view_id: ViewId,
        command_type: jint,
        args: JIntArray,
    ) -> jint {
        let mut values = Vec::new();
        if !args.is_null() {
            let len = match env.get_array_length(&args) {
                Ok(len) => len.max(0) as usize,
                Err(e) => {
                    log::error!("Failed to read command args: {}", e);
                    return -1;
                }
            };
            let mut buffer = vec![0; len];
            if let Err(e) = env.get_int_array_region(&args, 0, &mut buffer) {
                log::error!("Failed to read command args: {}", e);
                return -1;
            }
            values = buffer.into_iter().map(Value::from).collect();
        }
        to_code(with_manager(manager_id, |m| m.receive_command(view_id, command_type, &values)))
    }

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeGetCommandsMap(
        env: JNIEnv,
        _class: JClass,
    ) -> jstring {
        string_to_jstring(&env, &commands_map_json())
    }

    #[no_mangle]
    pub extern "system" fn Java_com_gstreamertest_RCTGstPlayerBridge_nativeGetExportedEvents(
        env: JNIEnv,
        _class: JClass,
    ) -> jstring {
        string_to_jstring(&env, &exported_events_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_map_json() {
        let value: Value = serde_json::from_str(&commands_map_json()).unwrap();
        assert_eq!(value, json!({"setState": 0, "recreateView": 1}));
    }

    #[test]
    fn test_exported_events_json() {
        let value: Value = serde_json::from_str(&exported_events_json()).unwrap();
        let events = value.as_object().unwrap();
        assert_eq!(events.len(), 6);
        assert_eq!(events["onVolumeChanged"], json!({"registrationName": "onVolumeChanged"}));
        assert_eq!(events["onEOS"], json!({"registrationName": "onEOS"}));
    }
}
