use serde::{Deserialize, Serialize};

use crate::camera::{LensFacing, QualitySelector};
use crate::recording::RecorderConfig;

/// Configuration for a capture session controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Lens bound on activation
    pub initial_lens: LensFacing,

    /// Recording output, duration cap and audio
    pub recorder: RecorderConfig,

    /// Video quality preferences resolved at bind time
    pub quality_selector: QualitySelector,

    /// Platform API level, decides which permissions are required
    pub api_level: u32,

    /// Capacity of the controller's command queue
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_lens: LensFacing::Back,
            recorder: RecorderConfig::default(),
            quality_selector: QualitySelector::default(),
            api_level: 34,
            command_buffer: 32,
        }
    }
}
