// View manager: the adapter the host framework talks to

use crate::command::Command;
use crate::controller::PlayerController;
use crate::engine::EngineFactory;
use crate::error::{BridgeError, Result};
use crate::event::{EventSink, UserNotifier, EVENT_NAMES};
use crate::surface::{PlayerSurface, SurfaceCallback, ViewId};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

struct PlayerView {
    controller: Arc<PlayerController>,
    surface: Arc<PlayerSurface>,
}

/// Host-facing player view manager.
///
/// Creates one controller and surface per host view and routes property
/// updates and commands to the right controller by view id.
pub struct GstPlayerViewManager {
    engine_factory: Arc<dyn EngineFactory>,
    sink: Arc<dyn EventSink>,
    notifier: Arc<dyn UserNotifier>,
    views: RwLock<HashMap<ViewId, PlayerView>>,
}

impl GstPlayerViewManager {
    /// Component name registered with the host
    pub const NAME: &'static str = "RCTGstPlayer";

    pub fn new(
        engine_factory: Arc<dyn EngineFactory>,
        sink: Arc<dyn EventSink>,
        notifier: Arc<dyn UserNotifier>,
    ) -> Self {
        Self {
            engine_factory,
            sink,
            notifier,
            views: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    /// Create the controller and surface backing a new host view.
    /// The platform layer feeds surface lifecycle into the returned surface.
    pub fn create_view_instance(&self, view_id: ViewId) -> Arc<PlayerSurface> {
        log::debug!("create_view_instance: {}", view_id);

        let engine = self.engine_factory.create_engine(view_id);
        let controller = PlayerController::new(
            view_id,
            engine,
            self.sink.clone(),
            self.notifier.as_ref(),
        );
        let surface = Arc::new(PlayerSurface::new(view_id));
        let listener: Arc<dyn SurfaceCallback> = controller.clone();
        surface.set_listener(&listener);

        let previous = self.views.write().insert(
            view_id,
            PlayerView {
                controller,
                surface: surface.clone(),
            },
        );
        if previous.is_some() {
            log::warn!("view {} recreated, previous controller released", view_id);
        }
        surface
    }

    /// Forget a view. The native pipeline is not torn down.
    pub fn drop_view_instance(&self, view_id: ViewId) -> bool {
        log::debug!("drop_view_instance: {}", view_id);
        self.views.write().remove(&view_id).is_some()
    }

    pub fn view_count(&self) -> usize {
        self.views.read().len()
    }

    pub fn controller(&self, view_id: ViewId) -> Result<Arc<PlayerController>> {
        self.views
            .read()
            .get(&view_id)
            .map(|view| view.controller.clone())
            .ok_or(BridgeError::UnknownView(view_id))
    }

    pub fn surface(&self, view_id: ViewId) -> Result<Arc<PlayerSurface>> {
        self.views
            .read()
            .get(&view_id)
            .map(|view| view.surface.clone())
            .ok_or(BridgeError::UnknownView(view_id))
    }

    // Shared properties

    pub fn set_uri(&self, view_id: ViewId, uri: &str) -> Result<()> {
        log::debug!("set_uri: view={} uri={}", view_id, uri);
        self.controller(view_id)?.set_uri(uri);
        Ok(())
    }

    pub fn set_is_debugging(&self, view_id: ViewId, is_debugging: bool) -> Result<()> {
        log::debug!("set_is_debugging: view={} {}", view_id, is_debugging);
        self.controller(view_id)?.set_debugging(is_debugging);
        Ok(())
    }

    pub fn set_audio_level_refresh_rate(&self, view_id: ViewId, rate: i32) -> Result<()> {
        log::debug!("set_audio_level_refresh_rate: view={} {}", view_id, rate);
        self.controller(view_id)?.set_audio_level_refresh_rate(rate);
        Ok(())
    }

    // Commands

    /// Dispatch a host command by ordinal.
    ///
    /// Unknown ordinals and malformed arguments dispatch nothing.
    pub fn receive_command(&self, view_id: ViewId, ordinal: i32, args: &[Value]) -> Result<()> {
        log::debug!("receive_command: view={} ordinal={} args={:?}", view_id, ordinal, args);

        let command = Command::from_ordinal(ordinal).ok_or(BridgeError::InvalidCommand(ordinal))?;
        let controller = self.controller(view_id)?;

        match command {
            Command::SetState => {
                let state = int_arg(args, 0)?;
                controller.set_state(state);
            }
            // Only needed where the platform video decoder cannot survive backgrounding
            Command::RecreateView => {
                log::debug!("recreateView ignored on this platform");
            }
        }
        Ok(())
    }

    /// Command names and ordinals for the host's command export
    pub fn commands_map() -> Vec<(&'static str, i32)> {
        Command::commands_map().collect()
    }

    /// Event names with their host registration names
    pub fn exported_event_types() -> Vec<(&'static str, &'static str)> {
        EVENT_NAMES.iter().map(|name| (*name, *name)).collect()
    }
}

fn int_arg(args: &[Value], index: usize) -> Result<i32> {
    let value = args
        .get(index)
        .ok_or_else(|| BridgeError::InvalidArgument(format!("missing argument {}", index)))?;

    let number = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .ok_or_else(|| {
            BridgeError::InvalidArgument(format!("argument {} is not an integer: {}", index, value))
        })?;

    i32::try_from(number)
        .map_err(|_| BridgeError::InvalidArgument(format!("argument {} out of range: {}", index, number)))
}
