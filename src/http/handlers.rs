use super::state::AppState;
use crate::display::{DisplayEvent, DisplayId, DisplayMetrics, Rotation};
use crate::error::CameraError;
use crate::recording::{RecordingState, StopDecision};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BindRequest {
    pub display_id: u32,
    pub width_px: u32,
    pub height_px: u32,
    /// Degrees: 0, 90, 180 or 270
    #[serde(default)]
    pub rotation: Rotation,
}

#[derive(Debug, Deserialize)]
pub struct RotationRequest {
    pub rotation: Rotation,
}

#[derive(Debug, Serialize)]
pub struct RecordingResponse {
    pub state: RecordingState,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn status_for(err: &CameraError) -> StatusCode {
    match err {
        CameraError::RecordingInProgress(_) | CameraError::RebindDuringRecording(_) => {
            StatusCode::CONFLICT
        }
        CameraError::NotBound | CameraError::BindingFailed { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        CameraError::InvalidRotation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: CameraError) -> Response {
    let status = status_for(&err);

    // Conflicts and bad input are the caller's doing
    if status.is_client_error() {
        warn!("Request rejected: {}", err);
    } else {
        error!("Request failed: {}", err);
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /camera/status
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.snapshot().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /camera/bind
pub async fn bind_camera(
    State(state): State<AppState>,
    Json(req): Json<BindRequest>,
) -> impl IntoResponse {
    let metrics = DisplayMetrics {
        display_id: DisplayId(req.display_id),
        width_px: req.width_px,
        height_px: req.height_px,
    };

    match state.session.bind(metrics, req.rotation).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /camera/lens/toggle
pub async fn toggle_lens(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.toggle_lens().await {
        Ok(session) => {
            info!("Switched to {} camera", session.lens);
            (StatusCode::OK, Json(session)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /camera/displays/:display_id/rotation
/// Publish a rotation change as the display subsystem would
pub async fn rotate_display(
    State(state): State<AppState>,
    Path(display_id): Path<u32>,
    Json(req): Json<RotationRequest>,
) -> impl IntoResponse {
    let listeners = state.displays.publish(DisplayEvent {
        display_id: DisplayId(display_id),
        rotation: req.rotation,
    });

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "listeners": listeners })),
    )
        .into_response()
}

/// POST /recording/start
pub async fn start_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.start_recording().await {
        Ok(output) => (
            StatusCode::OK,
            Json(RecordingResponse {
                state: RecordingState::Starting,
                message: format!("Recording to {}", output.descriptor.display_name),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /recording/stop
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.stop_recording().await {
        Ok(decision) => {
            let message = match decision {
                StopDecision::Stop => "Stop requested",
                StopDecision::Deferred => "Stop deferred until recording starts",
                StopDecision::Ignored => "No active recording",
            };
            (
                StatusCode::ACCEPTED,
                Json(RecordingResponse {
                    state: state.session.status().recording_state,
                    message: message.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /recording/toggle
pub async fn toggle_recording(State(state): State<AppState>) -> impl IntoResponse {
    match state.session.toggle_recording().await {
        Ok(recording_state) => (
            StatusCode::OK,
            Json(RecordingResponse {
                state: recording_state,
                message: format!("Recording {}", recording_state),
            }),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_conflicts_are_client_errors() {
        let conflicts = [
            CameraError::RecordingInProgress(RecordingState::Active),
            CameraError::RebindDuringRecording(RecordingState::Finalizing),
        ];
        for err in &conflicts {
            assert_eq!(status_for(err), StatusCode::CONFLICT);
            assert!(status_for(err).is_client_error());
        }
        assert_eq!(status_for(&CameraError::InvalidRotation(45)), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_server_side_failures() {
        assert_eq!(status_for(&CameraError::NotBound), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_for(&CameraError::Storage("disk full".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert!(!status_for(&CameraError::ControllerClosed).is_client_error());
    }
}
