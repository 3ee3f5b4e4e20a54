// Host-facing player events and the sinks that deliver them

use crate::surface::ViewId;
use serde::{Serialize, Serializer};
use serde_json::Value;

pub const ON_PLAYER_INIT: &str = "onPlayerInit";
pub const ON_STATE_CHANGED: &str = "onStateChanged";
pub const ON_VOLUME_CHANGED: &str = "onVolumeChanged";
pub const ON_URI_CHANGED: &str = "onUriChanged";
pub const ON_EOS: &str = "onEOS";
pub const ON_ELEMENT_ERROR: &str = "onElementError";

/// Every event name the host must be able to route
pub const EVENT_NAMES: [&str; 6] = [
    ON_PLAYER_INIT,
    ON_STATE_CHANGED,
    ON_URI_CHANGED,
    ON_EOS,
    ON_ELEMENT_ERROR,
    ON_VOLUME_CHANGED,
];

/// Player event types, one per engine callback
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlayerEvent {
    /// Pipeline is ready
    PlayerInit,

    /// Pipeline state changed
    StateChanged { old_state: i32, new_state: i32 },

    /// Audio level telemetry, in dB. Silence reports `-inf`.
    VolumeChanged {
        #[serde(serialize_with = "serialize_level")]
        rms: f64,
        #[serde(serialize_with = "serialize_level")]
        peak: f64,
        #[serde(serialize_with = "serialize_level")]
        decay: f64,
    },

    /// New URI applied
    UriChanged { new_uri: String },

    /// End of stream
    Eos,

    /// Pipeline element error
    ElementError {
        source: String,
        message: String,
        debug_info: String,
    },
}

impl PlayerEvent {
    /// Name the host routes this event by
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::PlayerInit => ON_PLAYER_INIT,
            PlayerEvent::StateChanged { .. } => ON_STATE_CHANGED,
            PlayerEvent::VolumeChanged { .. } => ON_VOLUME_CHANGED,
            PlayerEvent::UriChanged { .. } => ON_URI_CHANGED,
            PlayerEvent::Eos => ON_EOS,
            PlayerEvent::ElementError { .. } => ON_ELEMENT_ERROR,
        }
    }

    /// Event payload as a JSON object, `None` for payload-less events
    pub fn payload(&self) -> Option<Value> {
        match self {
            PlayerEvent::PlayerInit | PlayerEvent::Eos => None,
            // Plain struct-like data always serializes
            other => serde_json::to_value(other).ok(),
        }
    }

    /// Payload rendered for transports that carry strings
    pub fn payload_json(&self) -> Option<String> {
        self.payload().map(|value| value.to_string())
    }
}

/// JSON has no non-finite numbers: those levels travel as the JavaScript
/// spellings `"Infinity"`, `"-Infinity"` and `"NaN"`, which `Number()` parses.
fn serialize_level<S: Serializer>(level: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if level.is_finite() {
        serializer.serialize_f64(*level)
    } else if level.is_nan() {
        serializer.serialize_str("NaN")
    } else if level.is_sign_positive() {
        serializer.serialize_str("Infinity")
    } else {
        serializer.serialize_str("-Infinity")
    }
}

/// Read a level back from an event payload field
pub fn level_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => match text.as_str() {
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            "NaN" => Some(f64::NAN),
            _ => None,
        },
        _ => None,
    }
}

/// Host event delivery.
///
/// Called concurrently from engine threads; implementations own the
/// synchronization and must not reorder events they receive.
pub trait EventSink: Send + Sync {
    fn receive_event(&self, view_id: ViewId, event: PlayerEvent);
}

/// Best-effort, user-visible notice (a toast or similar)
pub trait UserNotifier: Send + Sync {
    fn notify_user(&self, message: &str);
}

/// Notifier that only logs
pub struct LogNotifier;

impl UserNotifier for LogNotifier {
    fn notify_user(&self, message: &str) {
        log::warn!("User notice: {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_names() {
        assert_eq!(PlayerEvent::PlayerInit.name(), "onPlayerInit");
        assert_eq!(PlayerEvent::Eos.name(), "onEOS");
        assert_eq!(
            PlayerEvent::VolumeChanged { rms: 0.0, peak: 0.0, decay: 0.0 }.name(),
            "onVolumeChanged"
        );
        assert!(EVENT_NAMES.contains(&ON_VOLUME_CHANGED));
    }

    #[test]
    fn test_payload_shapes() {
        assert_eq!(PlayerEvent::PlayerInit.payload(), None);
        assert_eq!(PlayerEvent::Eos.payload(), None);
        assert_eq!(
            PlayerEvent::StateChanged { old_state: 2, new_state: 3 }.payload(),
            Some(json!({"old_state": 2, "new_state": 3}))
        );
        assert_eq!(
            PlayerEvent::VolumeChanged { rms: -20.5, peak: -3.0, decay: -10.25 }.payload(),
            Some(json!({"rms": -20.5, "peak": -3.0, "decay": -10.25}))
        );
        assert_eq!(
            PlayerEvent::UriChanged { new_uri: "rtsp://cam".into() }.payload(),
            Some(json!({"new_uri": "rtsp://cam"}))
        );
        assert_eq!(
            PlayerEvent::ElementError {
                source: "rtspsrc".into(),
                message: "Could not open resource".into(),
                debug_info: "gstrtspsrc.c(7893)".into(),
            }
            .payload(),
            Some(json!({
                "source": "rtspsrc",
                "message": "Could not open resource",
                "debug_info": "gstrtspsrc.c(7893)"
            }))
        );
    }

    #[test]
    fn test_non_finite_levels_survive_payload() {
        let payload = PlayerEvent::VolumeChanged {
            rms: f64::NEG_INFINITY,
            peak: -3.0,
            decay: f64::NAN,
        }
        .payload()
        .unwrap();
        assert_eq!(payload, json!({"rms": "-Infinity", "peak": -3.0, "decay": "NaN"}));

        assert_eq!(level_from_json(&payload["rms"]), Some(f64::NEG_INFINITY));
        assert_eq!(level_from_json(&payload["peak"]), Some(-3.0));
        assert!(level_from_json(&payload["decay"]).unwrap().is_nan());

        let loud = PlayerEvent::VolumeChanged { rms: f64::INFINITY, peak: 0.0, decay: 0.0 };
        assert_eq!(
            loud.payload_json().unwrap(),
            r#"{"decay":0.0,"peak":0.0,"rms":"Infinity"}"#
        );
        assert_eq!(level_from_json(&json!("loud")), None);
        assert_eq!(level_from_json(&Value::Null), None);
    }

    #[test]
    fn test_payload_json_string() {
        let json = PlayerEvent::UriChanged { new_uri: "file:///a.mp4".into() }
            .payload_json()
            .unwrap();
        assert_eq!(json, r#"{"new_uri":"file:///a.mp4"}"#);
    }
}
