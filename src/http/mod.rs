//! HTTP API server for external control
//!
//! This module exposes the session controller over REST:
//! - GET /health - Health check
//! - GET /camera/status - Current status snapshot
//! - POST /camera/bind - Rebind for new display parameters
//! - POST /camera/lens/toggle - Switch between back and front camera
//! - POST /camera/displays/:display_id/rotation - Report a display rotation
//! - POST /recording/start - Start recording
//! - POST /recording/stop - Request stop
//! - POST /recording/toggle - Record button

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
