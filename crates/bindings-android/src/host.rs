// Event delivery to the Java view manager

use gstplayer_core::{EventSink, PlayerEvent, Result, UserNotifier, ViewId};
use jni::objects::{GlobalRef, JObject, JValue};
use jni::{JNIEnv, JavaVM};

const RECEIVE_EVENT_SIG: &str = "(ILjava/lang/String;Ljava/lang/String;)V";
const SHOW_NOTICE_SIG: &str = "(Ljava/lang/String;)V";

/// Forwards events to `receiveEvent(int viewId, String name, String payloadJson)`
/// on the Java emitter, which hands them to the React event emitter.
///
/// Engine threads are attached to the VM on first use and stay attached.
pub struct JniHost {
    vm: JavaVM,
    emitter: GlobalRef,
}

impl JniHost {
    pub fn new(env: &JNIEnv, emitter: JObject) -> Result<Self> {
        Ok(Self {
            vm: env.get_java_vm()?,
            emitter: env.new_global_ref(emitter)?,
        })
    }

    fn with_env(&self, what: &str, f: impl FnOnce(&mut JNIEnv) -> jni::errors::Result<()>) {
        let mut env = match self.vm.attach_current_thread_permanently() {
            Ok(env) => env,
            Err(e) => {
                log::error!("Failed to attach thread for {}: {}", what, e);
                return;
            }
        };
        // Local frame keeps long-lived engine threads from leaking local refs
        let result = env.with_local_frame(4, |env| f(env));
        if let Err(e) = result {
            log::error!("Failed to deliver {}: {}", what, e);
            if env.exception_check().unwrap_or(false) {
                let _ = env.exception_clear();
            }
        }
    }
}

impl EventSink for JniHost {
    fn receive_event(&self, view_id: ViewId, event: PlayerEvent) {
        let name = event.name();
        let payload = event.payload_json();
        self.with_env(name, |env| {
            let j_name = env.new_string(name)?;
            let j_payload = match &payload {
                Some(json) => JObject::from(env.new_string(json)?),
                None => JObject::null(),
            };
            env.call_method(
                &self.emitter,
                "receiveEvent",
                RECEIVE_EVENT_SIG,
                &[
                    JValue::Int(view_id),
                    JValue::Object(&j_name),
                    JValue::Object(&j_payload),
                ],
            )?;
            Ok(())
        });
    }
}

impl UserNotifier for JniHost {
    fn notify_user(&self, message: &str) {
        self.with_env("notice", |env| {
            let j_message = env.new_string(message)?;
            env.call_method(
                &self.emitter,
                "showNotice",
                SHOW_NOTICE_SIG,
                &[JValue::Object(&j_message)],
            )?;
            Ok(())
        });
    }
}
