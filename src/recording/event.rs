use serde::{Deserialize, Serialize};
use std::fmt;

use super::stats::RecordingStats;

/// Why the hardware finalized a recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "message")]
pub enum FinalizeError {
    /// Stopped at the configured duration cap; the output is still valid
    DurationLimitReached,
    /// Nothing usable was written
    NoValidData,
    /// Encoder or storage failure
    Encoding(String),
}

impl FinalizeError {
    /// Whether the output file is usable despite the error
    pub fn output_kept(&self) -> bool {
        matches!(self, FinalizeError::DurationLimitReached)
    }
}

impl fmt::Display for FinalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalizeError::DurationLimitReached => write!(f, "duration limit reached"),
            FinalizeError::NoValidData => write!(f, "no valid data recorded"),
            FinalizeError::Encoding(msg) => write!(f, "encoding failed: {}", msg),
        }
    }
}

/// Lifecycle notification emitted by the camera for an active recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum RecordEvent {
    Start {
        stats: RecordingStats,
    },
    Status {
        stats: RecordingStats,
    },
    Pause {
        stats: RecordingStats,
    },
    Resume {
        stats: RecordingStats,
    },
    Finalize {
        stats: RecordingStats,
        output_uri: String,
        error: Option<FinalizeError>,
    },
}

impl RecordEvent {
    pub fn stats(&self) -> &RecordingStats {
        match self {
            RecordEvent::Start { stats }
            | RecordEvent::Status { stats }
            | RecordEvent::Pause { stats }
            | RecordEvent::Resume { stats }
            | RecordEvent::Finalize { stats, .. } => stats,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RecordEvent::Start { .. } => "Start",
            RecordEvent::Status { .. } => "Status",
            RecordEvent::Pause { .. } => "Pause",
            RecordEvent::Resume { .. } => "Resume",
            RecordEvent::Finalize { .. } => "Finalize",
        }
    }
}
