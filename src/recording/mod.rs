//! Recording lifecycle
//!
//! This module tracks the single in-flight recording:
//! - `RecordEvent`: tagged hardware notifications (start, status, finalize)
//! - `RecordingStateMachine`: Idle -> Starting -> Active -> Finalizing -> Idle
//! - UI projection and `MM:SS` status text

mod event;
mod machine;
mod stats;

pub use event::{FinalizeError, RecordEvent};
pub use machine::{
    RecorderConfig, RecordingSession, RecordingState, RecordingStateMachine, StatusUpdate,
    StopDecision, ToggleAction, UiState,
};
pub use stats::{format_duration, RecordingStats};
