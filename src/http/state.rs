use crate::display::DisplayMonitor;
use crate::session::SessionHandle;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Controller of the camera session
    pub session: SessionHandle,

    /// Display notification source the session listens to
    pub displays: DisplayMonitor,
}

impl AppState {
    pub fn new(session: SessionHandle, displays: DisplayMonitor) -> Self {
        Self { session, displays }
    }
}
