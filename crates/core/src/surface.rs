// Renderable surface owned by the host view tree

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};

/// Host identifier of the view a surface belongs to. Events are routed by it.
pub type ViewId = i32;

/// Platform drawable target (e.g. an `ANativeWindow*`).
///
/// The handle is owned by the host; the bridge only passes it along and never
/// releases it. A null handle cannot be represented, so "no surface yet" is
/// `Option<SurfaceHandle>`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(NonZeroUsize);

impl SurfaceHandle {
    /// Wrap a raw handle value, `None` for null
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    pub fn as_raw(&self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceHandle({:#x})", self.0.get())
    }
}

/// Surface lifecycle listener
/// Invoked on the host UI thread
pub trait SurfaceCallback: Send + Sync {
    /// The surface exists; `handle` is its drawable target when the platform has one
    fn surface_created(&self, handle: Option<SurfaceHandle>);

    /// Size or format changed; the drawable target may have been replaced
    fn surface_changed(&self, handle: SurfaceHandle, format: i32, width: i32, height: i32);

    /// The surface is gone
    fn surface_destroyed(&self);
}

/// A renderable surface plus its lifecycle notifications.
///
/// The platform layer owns the real surface and calls the `notify_*`
/// methods; `PlayerSurface` tracks the current handle and relays each
/// notification to its listener.
pub struct PlayerSurface {
    view_id: ViewId,
    handle: RwLock<Option<SurfaceHandle>>,
    listener: Mutex<Option<Weak<dyn SurfaceCallback>>>,
}

impl PlayerSurface {
    pub fn new(view_id: ViewId) -> Self {
        Self {
            view_id,
            handle: RwLock::new(None),
            listener: Mutex::new(None),
        }
    }

    pub fn view_id(&self) -> ViewId {
        self.view_id
    }

    /// Current drawable target, if the surface is alive
    pub fn handle(&self) -> Option<SurfaceHandle> {
        *self.handle.read()
    }

    /// Register the lifecycle listener. The surface does not keep it alive.
    pub fn set_listener(&self, listener: &Arc<dyn SurfaceCallback>) {
        *self.listener.lock() = Some(Arc::downgrade(listener));
    }

    fn listener(&self) -> Option<Arc<dyn SurfaceCallback>> {
        self.listener.lock().as_ref().and_then(Weak::upgrade)
    }

    pub fn notify_created(&self, handle: Option<SurfaceHandle>) {
        log::debug!("[surface {}] created: {:?}", self.view_id, handle);
        if handle.is_some() {
            *self.handle.write() = handle;
        }
        if let Some(listener) = self.listener() {
            listener.surface_created(self.handle());
        }
    }

    pub fn notify_changed(&self, handle: SurfaceHandle, format: i32, width: i32, height: i32) {
        log::debug!(
            "[surface {}] changed: {:?} format={} {}x{}",
            self.view_id,
            handle,
            format,
            width,
            height
        );
        *self.handle.write() = Some(handle);
        if let Some(listener) = self.listener() {
            listener.surface_changed(handle, format, width, height);
        }
    }

    pub fn notify_destroyed(&self) {
        log::debug!("[surface {}] destroyed", self.view_id);
        *self.handle.write() = None;
        if let Some(listener) = self.listener() {
            listener.surface_destroyed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Lifecycle {
        calls: Mutex<Vec<String>>,
    }

    impl SurfaceCallback for Lifecycle {
        fn surface_created(&self, handle: Option<SurfaceHandle>) {
            self.calls.lock().push(format!("created {:?}", handle.map(|h| h.as_raw())));
        }

        fn surface_changed(&self, handle: SurfaceHandle, _format: i32, width: i32, height: i32) {
            self.calls
                .lock()
                .push(format!("changed {} {}x{}", handle.as_raw(), width, height));
        }

        fn surface_destroyed(&self) {
            self.calls.lock().push("destroyed".to_string());
        }
    }

    #[test]
    fn test_null_handle_is_none() {
        assert!(SurfaceHandle::from_raw(0).is_none());
        assert_eq!(SurfaceHandle::from_raw(0x10).map(|h| h.as_raw()), Some(0x10));
    }

    #[test]
    fn test_notifications_reach_listener() {
        let surface = PlayerSurface::new(7);
        let lifecycle = Arc::new(Lifecycle::default());
        let listener: Arc<dyn SurfaceCallback> = lifecycle.clone();
        surface.set_listener(&listener);

        surface.notify_created(SurfaceHandle::from_raw(1));
        surface.notify_changed(SurfaceHandle::from_raw(2).unwrap(), 4, 640, 480);
        assert_eq!(surface.handle(), SurfaceHandle::from_raw(2));
        surface.notify_destroyed();
        assert_eq!(surface.handle(), None);

        assert_eq!(
            *lifecycle.calls.lock(),
            vec!["created Some(1)", "changed 2 640x480", "destroyed"]
        );
    }

    #[test]
    fn test_created_without_handle_keeps_previous() {
        let surface = PlayerSurface::new(1);
        surface.notify_changed(SurfaceHandle::from_raw(9).unwrap(), 0, 1, 1);
        surface.notify_created(None);
        assert_eq!(surface.handle(), SurfaceHandle::from_raw(9));
    }

    #[test]
    fn test_dropped_listener_is_ignored() {
        let surface = PlayerSurface::new(3);
        {
            let listener: Arc<dyn SurfaceCallback> = Arc::new(Lifecycle::default());
            surface.set_listener(&listener);
        }
        surface.notify_created(SurfaceHandle::from_raw(5));
        assert_eq!(surface.handle(), SurfaceHandle::from_raw(5));
    }
}
