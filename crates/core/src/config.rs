// Engine startup configuration

use crate::surface::SurfaceHandle;

/// Audio level refresh rate used until the host pushes one (milliseconds)
pub const DEFAULT_AUDIO_LEVEL_REFRESH_RATE: i32 = 100;

/// Parameters the engine needs to start.
///
/// Built incrementally while the controller is uninitialized: surface
/// availability and property pushes may arrive in any order. Engine startup
/// receives an owned clone, after which the controller stops writing to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// Drawable target at startup; set once, at the first surface creation
    pub initial_drawable_surface: Option<SurfaceHandle>,
    pub is_debugging: bool,
    /// Interval between volume level callbacks, in milliseconds
    pub audio_level_refresh_rate: i32,
    pub uri: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            initial_drawable_surface: None,
            is_debugging: false,
            audio_level_refresh_rate: DEFAULT_AUDIO_LEVEL_REFRESH_RATE,
            uri: None,
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the startup drawable target. Only the first handle is kept.
    pub fn set_initial_drawable_surface(&mut self, handle: SurfaceHandle) {
        match self.initial_drawable_surface {
            None => self.initial_drawable_surface = Some(handle),
            Some(existing) => log::warn!(
                "initial drawable surface already set to {:?}, ignoring {:?}",
                existing,
                handle
            ),
        }
    }

    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = Some(uri.into());
    }

    pub fn set_debugging(&mut self, is_debugging: bool) {
        self.is_debugging = is_debugging;
    }

    pub fn set_audio_level_refresh_rate(&mut self, rate: i32) {
        self.audio_level_refresh_rate = rate;
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.set_uri(uri);
        self
    }

    /// Whether startup has a drawable target to hand over
    pub fn has_drawable_surface(&self) -> bool {
        self.initial_drawable_surface.is_some()
    }
}
