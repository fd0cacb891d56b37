use serde::{Deserialize, Serialize};

use crate::camera::{AspectRatio, LensFacing, Quality, UseCase};
use crate::display::{DisplayId, Rotation};

/// The currently bound camera pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSession {
    pub lens: LensFacing,
    pub display_id: DisplayId,
    pub aspect_ratio: AspectRatio,
    pub rotation: Rotation,
    pub use_cases: Vec<UseCase>,
    pub quality: Quality,
}

impl CaptureSession {
    pub fn has_use_case(&self, use_case: UseCase) -> bool {
        self.use_cases.contains(&use_case)
    }
}
