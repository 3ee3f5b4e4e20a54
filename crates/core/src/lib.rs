// Core types and traits for the GStreamer player bridge

pub mod command;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod event;
pub mod manager;
pub mod surface;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use command::Command;
pub use config::{Configuration, DEFAULT_AUDIO_LEVEL_REFRESH_RATE};
pub use controller::PlayerController;
pub use engine::{EngineCallback, EngineFactory, GstState, PipelineEngine, SharedEngineFactory};
pub use error::{BridgeError, Result};
pub use event::{level_from_json, EventSink, LogNotifier, PlayerEvent, UserNotifier, EVENT_NAMES};
pub use manager::GstPlayerViewManager;
pub use surface::{PlayerSurface, SurfaceCallback, SurfaceHandle, ViewId};
