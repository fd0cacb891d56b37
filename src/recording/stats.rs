use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Running totals reported by the hardware with every recording event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingStats {
    pub recorded_duration: Duration,
    pub recorded_bytes: u64,
}

impl RecordingStats {
    pub fn new(recorded_duration: Duration, recorded_bytes: u64) -> Self {
        Self {
            recorded_duration,
            recorded_bytes,
        }
    }
}

/// Format whole seconds as `MM:SS`
///
/// Minutes are not wrapped into hours: 3600 seconds is `60:00`.
pub fn format_duration(total_secs: u64) -> String {
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(5), "00:05");
        assert_eq!(format_duration(65), "01:05");
        assert_eq!(format_duration(3599), "59:59");
        assert_eq!(format_duration(3600), "60:00");
    }
}
