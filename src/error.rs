//! Error types for the camera session core
//!
//! Binding failures are local and recoverable: they are logged and the user
//! may retry by toggling the lens or rebinding. Permission denials and
//! illegal lifecycle events are escalated to the owning application shell.

use thiserror::Error;

use crate::camera::LensFacing;
use crate::permissions::Permission;
use crate::recording::RecordingState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Failed to bind use cases for {lens} camera: {reason}")]
    BindingFailed { lens: LensFacing, reason: String },

    #[error("Permissions not granted: {0:?}")]
    PermissionDenied(Vec<Permission>),

    #[error("Illegal recording event {event} while {state}")]
    IllegalLifecycleEvent {
        state: RecordingState,
        event: &'static str,
    },

    #[error("A recording is already {0}")]
    RecordingInProgress(RecordingState),

    #[error("Cannot rebind camera while recording is {0}")]
    RebindDuringRecording(RecordingState),

    #[error("No camera session is bound")]
    NotBound,

    #[error("Invalid rotation: {0} degrees")]
    InvalidRotation(u16),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Session controller is no longer running")]
    ControllerClosed,
}

impl CameraError {
    /// Whether the owning shell has to give up on the current activation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CameraError::PermissionDenied(_) | CameraError::IllegalLifecycleEvent { .. }
        )
    }
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CameraError {
    fn from(err: serde_json::Error) -> Self {
        CameraError::Storage(err.to_string())
    }
}

pub type CameraResult<T> = Result<T, CameraError>;
