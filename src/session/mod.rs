//! Capture session management
//!
//! This module owns everything bound to the camera:
//! - `CaptureSessionManager`: binding, lens toggle, rotation updates
//! - `SessionController`: single task owning the manager and the recording
//!   state machine, driven by commands and hardware events
//! - `SessionHandle`: cloneable command sender plus status subscription

mod capture;
mod config;
mod controller;
mod manager;

pub use capture::CaptureSession;
pub use config::SessionConfig;
pub use controller::{SessionController, SessionHandle, StatusSnapshot};
pub use manager::CaptureSessionManager;
