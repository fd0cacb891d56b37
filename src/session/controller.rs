use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::capture::CaptureSession;
use super::config::SessionConfig;
use super::manager::CaptureSessionManager;
use crate::camera::{CameraProvider, LensFacing};
use crate::display::{DisplayId, DisplayMetrics, Rotation};
use crate::error::{CameraError, CameraResult};
use crate::permissions::{self, PermissionGate};
use crate::recording::{
    RecordEvent, RecordingState, RecordingStateMachine, StopDecision, ToggleAction, UiState,
};
use crate::storage::{MediaStore, OutputOptions, SavedRecording};

/// What observers of the session see
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub ui_state: UiState,
    pub recording_state: RecordingState,
    /// `MM:SS`, plus the saved location after a finalize
    pub status_text: String,
    pub lens: LensFacing,
    pub capture_session: Option<CaptureSession>,
    pub recording_id: Option<Uuid>,
    pub last_saved: Option<SavedRecording>,
    /// Set when the controller stopped on an unrecoverable error
    pub fatal_error: Option<String>,
}

enum Command {
    Bind {
        metrics: DisplayMetrics,
        rotation: Rotation,
        reply: oneshot::Sender<CameraResult<CaptureSession>>,
    },
    ToggleLens {
        reply: oneshot::Sender<CameraResult<CaptureSession>>,
    },
    DisplayChanged {
        display_id: DisplayId,
        rotation: Rotation,
    },
    StartRecording {
        reply: oneshot::Sender<CameraResult<OutputOptions>>,
    },
    StopRecording {
        reply: oneshot::Sender<StopDecision>,
    },
    ToggleRecording {
        reply: oneshot::Sender<CameraResult<RecordingState>>,
    },
    Snapshot {
        reply: oneshot::Sender<StatusSnapshot>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Single owner of the capture session and the recording state machine
///
/// All mutation happens on the controller's task: UI requests, display
/// notifications and hardware events arrive as messages and are applied one
/// at a time. Observers get a `StatusSnapshot` through a watch channel.
pub struct SessionController {
    manager: CaptureSessionManager,
    recorder: RecordingStateMachine,
    store: Arc<dyn MediaStore>,
    commands: mpsc::Receiver<Command>,
    events: Option<mpsc::Receiver<RecordEvent>>,
    status_tx: watch::Sender<StatusSnapshot>,
    last_saved: Option<SavedRecording>,
}

impl SessionController {
    /// Check permissions, then spawn the controller and bind the camera
    ///
    /// A permission denial is returned before anything touches the camera.
    /// A binding failure is not: it is logged and the controller runs
    /// unbound until the next bind or lens toggle.
    pub async fn launch(
        provider: Box<dyn CameraProvider>,
        store: Arc<dyn MediaStore>,
        gate: &dyn PermissionGate,
        config: SessionConfig,
        metrics: DisplayMetrics,
        rotation: Rotation,
    ) -> CameraResult<(SessionHandle, JoinHandle<CameraResult<()>>)> {
        permissions::ensure_granted(gate, config.api_level).await?;

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (status_tx, status_rx) = watch::channel(StatusSnapshot {
            lens: config.initial_lens,
            ..Default::default()
        });

        let controller = Self {
            manager: CaptureSessionManager::new(
                provider,
                config.initial_lens,
                config.quality_selector.clone(),
            ),
            recorder: RecordingStateMachine::new(config.recorder.clone()),
            store,
            commands: command_rx,
            events: None,
            status_tx,
            last_saved: None,
        };

        let task = tokio::spawn(controller.run(metrics, rotation));

        Ok((
            SessionHandle {
                commands: command_tx,
                status: status_rx,
            },
            task,
        ))
    }

    async fn run(mut self, metrics: DisplayMetrics, rotation: Rotation) -> CameraResult<()> {
        info!("Session controller started on {}", metrics.display_id);

        let lens = self.manager.lens();
        if let Err(e) = self.manager.bind(lens, metrics, rotation).await {
            warn!("Initial bind failed, waiting for retry: {}", e);
        }
        self.publish();

        let mut shutdown_reply = None;

        let result = loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        shutdown_reply = Some(reply);
                        break Ok(());
                    }
                    Some(command) => self.handle_command(command).await,
                    // Every handle dropped
                    None => break Ok(()),
                },
                event = next_event(&mut self.events) => {
                    if let Err(e) = self.handle_event(event).await {
                        error!("Session controller failed: {}", e);
                        break Err(e);
                    }
                }
            }
        };

        self.shutdown(result.as_ref().err()).await;

        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }

        result
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Bind {
                metrics,
                rotation,
                reply,
            } => {
                let result = match self.guard_rebind() {
                    Ok(()) => {
                        let lens = self.manager.lens();
                        self.manager.bind(lens, metrics, rotation).await
                    }
                    Err(e) => Err(e),
                };
                self.publish();
                let _ = reply.send(result);
            }

            Command::ToggleLens { reply } => {
                let result = match self.guard_rebind() {
                    Ok(()) => self.manager.toggle_lens().await,
                    Err(e) => Err(e),
                };
                self.publish();
                let _ = reply.send(result);
            }

            Command::DisplayChanged {
                display_id,
                rotation,
            } => {
                if self.manager.on_display_changed(display_id, rotation) {
                    self.publish();
                }
            }

            Command::StartRecording { reply } => {
                let result = self.start_recording().await;
                self.publish();
                let _ = reply.send(result);
            }

            Command::StopRecording { reply } => {
                let decision = self.recorder.request_stop();
                self.apply_stop(decision).await;
                self.publish();
                let _ = reply.send(decision);
            }

            Command::ToggleRecording { reply } => {
                let result = self.toggle_recording().await;
                self.publish();
                let _ = reply.send(result);
            }

            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }

            // Handled by the run loop
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn handle_event(&mut self, event: Option<RecordEvent>) -> CameraResult<()> {
        let Some(event) = event else {
            self.events = None;
            let state = self.recorder.state();
            if state != RecordingState::Idle {
                error!("Recording event stream closed while {}", state);
                return Err(CameraError::IllegalLifecycleEvent {
                    state,
                    event: "StreamClosed",
                });
            }
            return Ok(());
        };

        debug!("Recording event: {}", event.kind());

        let update = self.recorder.handle(event)?;

        if update.stop_hardware {
            if let Err(e) = self.manager.provider_mut().stop_recording().await {
                warn!("Failed to request recording stop: {}", e);
            }
        }

        if let Some(saved) = update.saved {
            match self.store.persist(&saved) {
                Ok(()) => self.last_saved = Some(saved),
                Err(e) => error!("Failed to persist recording: {}", e),
            }
        }

        if update.finished {
            // Finalize is the last event of a recording
            self.events = None;
        }

        self.publish();
        Ok(())
    }

    /// Rebinding is only allowed while no recording is in flight
    fn guard_rebind(&self) -> CameraResult<()> {
        let state = self.recorder.state();
        if state != RecordingState::Idle {
            warn!("Rejecting rebind while recording is {}", state);
            return Err(CameraError::RebindDuringRecording(state));
        }
        Ok(())
    }

    async fn start_recording(&mut self) -> CameraResult<OutputOptions> {
        if self.manager.session().is_none() {
            return Err(CameraError::NotBound);
        }
        let output = self.recorder.begin(Utc::now())?;
        self.launch_recording(output).await
    }

    async fn toggle_recording(&mut self) -> CameraResult<RecordingState> {
        if self.recorder.state() == RecordingState::Idle && self.manager.session().is_none() {
            return Err(CameraError::NotBound);
        }

        match self.recorder.toggle(Utc::now())? {
            ToggleAction::Start(output) => {
                self.launch_recording(output).await?;
            }
            ToggleAction::Stop(decision) => self.apply_stop(decision).await,
        }

        Ok(self.recorder.state())
    }

    async fn launch_recording(&mut self, output: OutputOptions) -> CameraResult<OutputOptions> {
        match self.manager.provider_mut().start_recording(&output).await {
            Ok(events) => {
                self.events = Some(events);
                Ok(output)
            }
            Err(e) => {
                error!("Failed to start recording: {}", e);
                self.recorder.abort_start(&e);
                Err(e)
            }
        }
    }

    async fn apply_stop(&mut self, decision: StopDecision) {
        if decision == StopDecision::Stop {
            // Returns immediately; the session closes on Finalize
            if let Err(e) = self.manager.provider_mut().stop_recording().await {
                warn!("Failed to request recording stop: {}", e);
            }
        }
    }

    async fn shutdown(&mut self, error: Option<&CameraError>) {
        if self.recorder.state() != RecordingState::Idle {
            let _ = self.manager.provider_mut().stop_recording().await;
        }
        // Late events have nowhere to go
        self.events = None;
        self.manager.release().await;

        let mut snapshot = self.snapshot();
        snapshot.fatal_error = error.map(|e| e.to_string());
        self.status_tx.send_replace(snapshot);

        info!("Session controller stopped");
    }

    fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            ui_state: self.recorder.ui_state(),
            recording_state: self.recorder.state(),
            status_text: self.recorder.status_text().to_string(),
            lens: self.manager.lens(),
            capture_session: self.manager.session().cloned(),
            recording_id: self.recorder.session().map(|s| s.id),
            last_saved: self.last_saved.clone(),
            fatal_error: None,
        }
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.snapshot());
    }
}

async fn next_event(events: &mut Option<mpsc::Receiver<RecordEvent>>) -> Option<RecordEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Cloneable access to a running `SessionController`
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<StatusSnapshot>,
}

impl SessionHandle {
    async fn call<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> CameraResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| CameraError::ControllerClosed)?;
        reply_rx.await.map_err(|_| CameraError::ControllerClosed)
    }

    /// Rebind the current lens for new display parameters
    pub async fn bind(
        &self,
        metrics: DisplayMetrics,
        rotation: Rotation,
    ) -> CameraResult<CaptureSession> {
        self.call(|reply| Command::Bind {
            metrics,
            rotation,
            reply,
        })
        .await?
    }

    pub async fn toggle_lens(&self) -> CameraResult<CaptureSession> {
        self.call(|reply| Command::ToggleLens { reply }).await?
    }

    /// Forward a display rotation notification
    pub async fn display_changed(&self, display_id: DisplayId, rotation: Rotation) -> CameraResult<()> {
        self.commands
            .send(Command::DisplayChanged {
                display_id,
                rotation,
            })
            .await
            .map_err(|_| CameraError::ControllerClosed)
    }

    pub async fn start_recording(&self) -> CameraResult<OutputOptions> {
        self.call(|reply| Command::StartRecording { reply }).await?
    }

    /// Request a stop; the recording is closed once the hardware finalizes
    pub async fn stop_recording(&self) -> CameraResult<StopDecision> {
        self.call(|reply| Command::StopRecording { reply }).await
    }

    /// Record button: start when idle, otherwise stop
    pub async fn toggle_recording(&self) -> CameraResult<RecordingState> {
        self.call(|reply| Command::ToggleRecording { reply }).await?
    }

    pub async fn snapshot(&self) -> CameraResult<StatusSnapshot> {
        self.call(|reply| Command::Snapshot { reply }).await
    }

    /// Latest published status without a round trip
    pub fn status(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.clone()
    }

    /// Wait until the published status satisfies `predicate`
    pub async fn wait_for<F>(&self, mut predicate: F) -> CameraResult<StatusSnapshot>
    where
        F: FnMut(&StatusSnapshot) -> bool,
    {
        let mut rx = self.status.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| CameraError::ControllerClosed)?
            .clone();
        Ok(snapshot)
    }

    /// Stop any recording, release the camera and end the controller
    pub async fn shutdown(&self) -> CameraResult<()> {
        self.call(|reply| Command::Shutdown { reply }).await
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}
