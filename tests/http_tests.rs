// Integration tests for the HTTP control API
//
// Requests are sent straight into the router; the session behind it runs
// on the scripted camera.

mod common;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use camera_session::display::{DisplayMonitor, Rotation};
use camera_session::permissions::StaticPermissionGate;
use camera_session::recording::{RecordEvent, RecordingState, UiState};
use camera_session::session::{SessionConfig, SessionController, SessionHandle, StatusSnapshot};
use camera_session::storage::MemoryMediaStore;
use camera_session::{create_router, AppState};
use common::{phone_display, stats, ScriptedCamera, ScriptedControls};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn setup() -> Result<(Router, SessionHandle, ScriptedControls, DisplayMonitor)> {
    let (camera, controls) = ScriptedCamera::new();
    let (session, _task) = SessionController::launch(
        Box::new(camera),
        Arc::new(MemoryMediaStore::new()),
        &StaticPermissionGate::all_granted(),
        SessionConfig::default(),
        phone_display(),
        Rotation::Rotation0,
    )
    .await?;

    tokio::time::timeout(
        Duration::from_secs(5),
        session.wait_for(|s| s.capture_session.is_some()),
    )
    .await??;

    let displays = DisplayMonitor::new();
    let router = create_router(AppState::new(session.clone(), displays.clone()));
    Ok((router, session, controls, displays))
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    Ok((status, value))
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (router, _session, _controls, _displays) = setup().await?;

    let (status, body) = send(&router, "GET", "/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_status_reports_bound_session() -> Result<()> {
    let (router, _session, _controls, _displays) = setup().await?;

    let (status, body) = send(&router, "GET", "/camera/status", None).await?;
    assert_eq!(status, StatusCode::OK);

    let snapshot: StatusSnapshot = serde_json::from_value(body)?;
    assert_eq!(snapshot.ui_state, UiState::Idle);
    assert_eq!(snapshot.recording_state, RecordingState::Idle);
    let capture = snapshot.capture_session.expect("camera should be bound");
    assert_eq!(capture.aspect_ratio.to_string(), "16:9");

    Ok(())
}

#[tokio::test]
async fn test_second_start_conflicts() -> Result<()> {
    let (router, _session, controls, _displays) = setup().await?;

    let (status, body) = send(&router, "POST", "/recording/start", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "starting");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Recording to CameraX-recording-"));

    let (status, body) = send(&router, "POST", "/recording/start", None).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().is_some());

    assert_eq!(controls.outputs.lock().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_lens_toggle_conflicts_while_recording() -> Result<()> {
    let (router, session, controls, _displays) = setup().await?;

    let (status, body) = send(&router, "POST", "/camera/lens/toggle", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["lens"], "front");

    send(&router, "POST", "/recording/start", None).await?;
    controls.emit(RecordEvent::Start { stats: stats(0) }).await;
    tokio::time::timeout(
        Duration::from_secs(5),
        session.wait_for(|s| s.recording_state == RecordingState::Active),
    )
    .await??;

    let (status, _) = send(&router, "POST", "/camera/lens/toggle", None).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let bind = serde_json::json!({
        "display_id": 0,
        "width_px": 1536,
        "height_px": 2048,
        "rotation": 90
    });
    let (status, _) = send(&router, "POST", "/camera/bind", Some(bind)).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    Ok(())
}

#[tokio::test]
async fn test_stop_messages() -> Result<()> {
    let (router, _session, controls, _displays) = setup().await?;

    let (status, body) = send(&router, "POST", "/recording/stop", None).await?;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "No active recording");

    send(&router, "POST", "/recording/start", None).await?;
    let (_, body) = send(&router, "POST", "/recording/stop", None).await?;
    assert_eq!(body["message"], "Stop deferred until recording starts");
    assert_eq!(controls.stops(), 0);

    Ok(())
}

#[tokio::test]
async fn test_bind_selects_aspect_ratio() -> Result<()> {
    let (router, _session, _controls, _displays) = setup().await?;

    let bind = serde_json::json!({
        "display_id": 0,
        "width_px": 1536,
        "height_px": 2048,
        "rotation": 90
    });
    let (status, body) = send(&router, "POST", "/camera/bind", Some(bind)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aspect_ratio"], "4:3");
    assert_eq!(body["rotation"], 90);

    Ok(())
}

#[tokio::test]
async fn test_display_rotation_reaches_session() -> Result<()> {
    let (router, session, controls, displays) = setup().await?;
    let _subscription = displays.register(session.clone());

    let (status, body) = send(
        &router,
        "POST",
        "/camera/displays/0/rotation",
        Some(serde_json::json!({ "rotation": 180 })),
    )
    .await?;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["listeners"], 1);

    tokio::time::timeout(
        Duration::from_secs(5),
        session.wait_for(|s| {
            s.capture_session
                .as_ref()
                .map(|c| c.rotation == Rotation::Rotation180)
                .unwrap_or(false)
        }),
    )
    .await??;
    assert_eq!(controls.rotation(), Some(Rotation::Rotation180));

    Ok(())
}

#[tokio::test]
async fn test_invalid_rotation_rejected() -> Result<()> {
    let (router, _session, _controls, _displays) = setup().await?;

    let (status, _) = send(
        &router,
        "POST",
        "/camera/displays/0/rotation",
        Some(serde_json::json!({ "rotation": 45 })),
    )
    .await?;
    assert!(status.is_client_error());

    Ok(())
}
