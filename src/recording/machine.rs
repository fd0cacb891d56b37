use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use super::event::RecordEvent;
use super::stats::{format_duration, RecordingStats};
use crate::error::{CameraError, CameraResult};
use crate::storage::{ContentDescriptor, OutputOptions, SavedRecording};

/// Lifecycle of the in-flight recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// No recording in progress
    #[default]
    Idle,
    /// Start requested, waiting for the hardware's Start event
    Starting,
    /// Hardware is recording
    Active,
    /// Stop requested or cap reached, waiting for Finalize
    Finalizing,
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordingState::Idle => "idle",
            RecordingState::Starting => "starting",
            RecordingState::Active => "active",
            RecordingState::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

/// What the UI shows; derived, never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiState {
    /// Not recording, all controls active
    #[default]
    Idle,
    /// Recording, only the stop control is shown
    Recording,
    /// Recording just completed
    Finalized,
}

/// Recording settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Prefix of generated display names
    pub output_prefix: String,

    /// Maximum recording length, zero for none
    /// Default: 21 seconds
    pub duration_limit: Duration,

    /// Record the microphone alongside video
    pub with_audio: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_prefix: "CameraX".to_string(),
            duration_limit: Duration::from_secs(21),
            with_audio: true,
        }
    }
}

/// One in-flight recording
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_limit: Duration,
    pub recorded_duration: Duration,
    pub output: OutputOptions,
    pub state: RecordingState,
    stop_pending: bool,
}

impl RecordingSession {
    /// Stop was requested before the hardware confirmed the start
    pub fn stop_pending(&self) -> bool {
        self.stop_pending
    }
}

/// Outcome of a stop request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    /// Active -> Finalizing; the hardware must be told to stop
    Stop,
    /// Still Starting; the stop is issued once the Start event arrives
    Deferred,
    /// Idle or already Finalizing
    Ignored,
}

/// Outcome of the record button
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleAction {
    Start(OutputOptions),
    Stop(StopDecision),
}

/// Result of applying one hardware event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub ui_state: UiState,
    pub text: String,
    /// The hardware has to be asked to stop now
    pub stop_hardware: bool,
    /// Recording to hand to the media store
    pub saved: Option<SavedRecording>,
    /// The session was cleared by this event
    pub finished: bool,
}

/// Drives the recording lifecycle from user requests and hardware events
///
/// Transition guards are the only thing preventing a second recording;
/// callers serialize access by owning the machine on a single task.
#[derive(Debug, Default)]
pub struct RecordingStateMachine {
    config: RecorderConfig,
    session: Option<RecordingSession>,
    ui_state: UiState,
    status_text: String,
}

impl RecordingStateMachine {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            session: None,
            ui_state: UiState::Idle,
            status_text: String::new(),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn state(&self) -> RecordingState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(RecordingState::Idle)
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    pub fn ui_state(&self) -> UiState {
        self.ui_state
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Idle -> Starting
    ///
    /// Returns the output the hardware should record into.
    pub fn begin(&mut self, now: DateTime<Utc>) -> CameraResult<OutputOptions> {
        if let Some(session) = &self.session {
            warn!("Recording already {}", session.state);
            return Err(CameraError::RecordingInProgress(session.state));
        }

        let output = OutputOptions {
            descriptor: ContentDescriptor::for_recording(&self.config.output_prefix, now),
            duration_limit: self.config.duration_limit,
            with_audio: self.config.with_audio,
        };

        let session = RecordingSession {
            id: Uuid::new_v4(),
            started_at: now,
            duration_limit: self.config.duration_limit,
            recorded_duration: Duration::ZERO,
            output: output.clone(),
            state: RecordingState::Starting,
            stop_pending: false,
        };

        info!(
            "Recording {} starting: {} (limit {}s)",
            session.id,
            output.descriptor.display_name,
            session.duration_limit.as_secs()
        );

        self.session = Some(session);
        Ok(output)
    }

    /// Starting -> Idle when the hardware refused to start
    pub fn abort_start(&mut self, reason: &CameraError) {
        if self.state() == RecordingState::Starting {
            warn!("Recording start aborted: {}", reason);
            self.session = None;
        }
    }

    /// Explicit stop request
    pub fn request_stop(&mut self) -> StopDecision {
        let Some(session) = self.session.as_mut() else {
            return StopDecision::Ignored;
        };

        match session.state {
            RecordingState::Active => {
                info!("Recording {} stopping", session.id);
                session.state = RecordingState::Finalizing;
                StopDecision::Stop
            }
            RecordingState::Starting => {
                info!("Recording {} stop deferred until started", session.id);
                session.stop_pending = true;
                StopDecision::Deferred
            }
            RecordingState::Finalizing | RecordingState::Idle => StopDecision::Ignored,
        }
    }

    /// Record button: start when idle, otherwise stop
    pub fn toggle(&mut self, now: DateTime<Utc>) -> CameraResult<ToggleAction> {
        match self.state() {
            RecordingState::Idle => self.begin(now).map(ToggleAction::Start),
            _ => Ok(ToggleAction::Stop(self.request_stop())),
        }
    }

    /// Apply one hardware event
    ///
    /// Events that do not fit the current state are contract violations by
    /// the hardware and are returned as `IllegalLifecycleEvent`; the machine
    /// is left untouched in that case.
    pub fn handle(&mut self, event: RecordEvent) -> CameraResult<StatusUpdate> {
        let state = self.state();
        let illegal = CameraError::IllegalLifecycleEvent {
            state,
            event: event.kind(),
        };

        match event {
            RecordEvent::Start { stats } => {
                let Some(session) = self.session.as_mut() else {
                    return Err(illegal);
                };
                if session.state != RecordingState::Starting {
                    return Err(illegal);
                }

                session.state = RecordingState::Active;
                session.recorded_duration = stats.recorded_duration;
                info!("Recording {} started", session.id);

                let stop_hardware = session.stop_pending;
                if stop_hardware {
                    session.stop_pending = false;
                    session.state = RecordingState::Finalizing;
                    info!("Recording {} stopping (deferred request)", session.id);
                }

                self.ui_state = UiState::Recording;
                let text = self.render(&stats, None);
                Ok(StatusUpdate {
                    ui_state: self.ui_state,
                    text,
                    stop_hardware,
                    saved: None,
                    finished: false,
                })
            }

            RecordEvent::Status { stats } => {
                let Some(session) = self.session.as_mut() else {
                    return Err(illegal);
                };
                if !matches!(
                    session.state,
                    RecordingState::Active | RecordingState::Finalizing
                ) {
                    return Err(illegal);
                }

                session.recorded_duration = stats.recorded_duration;

                let mut stop_hardware = false;
                // A zero limit means the recording is uncapped
                if session.state == RecordingState::Active
                    && !session.duration_limit.is_zero()
                    && session.recorded_duration >= session.duration_limit
                {
                    info!(
                        "Recording {} reached its {}s cap",
                        session.id,
                        session.duration_limit.as_secs()
                    );
                    session.state = RecordingState::Finalizing;
                    stop_hardware = true;
                }

                let text = self.render(&stats, None);
                Ok(StatusUpdate {
                    ui_state: self.ui_state,
                    text,
                    stop_hardware,
                    saved: None,
                    finished: false,
                })
            }

            RecordEvent::Pause { .. } | RecordEvent::Resume { .. } => Err(illegal),

            RecordEvent::Finalize {
                stats,
                output_uri,
                error,
            } => {
                let Some(session) = self.session.take() else {
                    return Err(illegal);
                };

                let (suffix, saved) = match &error {
                    Some(err) if !err.output_kept() => {
                        warn!("Recording {} failed: {}", session.id, err);
                        (format!("Recording failed: {}", err), None)
                    }
                    _ => {
                        let saved = SavedRecording {
                            descriptor: session.output.descriptor.clone(),
                            output_uri: output_uri.clone(),
                            duration: stats.recorded_duration,
                            saved_at: Utc::now(),
                        };
                        (format!("File saved to: {}", output_uri), Some(saved))
                    }
                };

                info!("Recording {} finalized", session.id);

                self.ui_state = UiState::Finalized;
                let text = self.render(&stats, Some(suffix));
                Ok(StatusUpdate {
                    ui_state: self.ui_state,
                    text,
                    stop_hardware: false,
                    saved,
                    finished: true,
                })
            }
        }
    }

    fn render(&mut self, stats: &RecordingStats, suffix: Option<String>) -> String {
        let mut text = format_duration(stats.recorded_duration.as_secs());
        if let Some(suffix) = suffix {
            text.push('\n');
            text.push_str(&suffix);
        }

        info!("recording event: {}", text);
        self.status_text = text.clone();
        text
    }
}
