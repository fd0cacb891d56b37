use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::quality::{Quality, QualitySelector};
use super::simulated::{SimulatedCamera, SimulatorConfig};
use crate::display::Rotation;
use crate::error::CameraResult;
use crate::recording::RecordEvent;
use crate::storage::{MediaStore, OutputOptions};

/// Which way the active camera points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensFacing {
    /// Away from the user
    #[default]
    Back,
    /// Toward the user
    Front,
}

impl LensFacing {
    pub fn toggled(self) -> Self {
        match self {
            LensFacing::Back => LensFacing::Front,
            LensFacing::Front => LensFacing::Back,
        }
    }
}

impl fmt::Display for LensFacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LensFacing::Back => write!(f, "back"),
            LensFacing::Front => write!(f, "front"),
        }
    }
}

impl FromStr for LensFacing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "back" => Ok(LensFacing::Back),
            "front" => Ok(LensFacing::Front),
            other => Err(format!("unknown lens facing: {}", other)),
        }
    }
}

/// Target aspect ratio for preview and recording output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "4:3")]
    Ratio4x3,
    #[serde(rename = "16:9")]
    Ratio16x9,
}

impl AspectRatio {
    /// Pick the reference ratio closest to the display's long/short side ratio
    ///
    /// With `r = long / short`, 4:3 wins only when `|r - 4/3| < |r - 16/9|`;
    /// an exact tie goes to 16:9. Both distances share the denominator
    /// `9 * short`, so the comparison is done on integer numerators.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let long = i64::from(width.max(height));
        let short = i64::from(width.min(height));

        let to_4_3 = (9 * long - 12 * short).abs();
        let to_16_9 = (9 * long - 16 * short).abs();

        if to_4_3 < to_16_9 {
            AspectRatio::Ratio4x3
        } else {
            AspectRatio::Ratio16x9
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AspectRatio::Ratio4x3 => write!(f, "4:3"),
            AspectRatio::Ratio16x9 => write!(f, "16:9"),
        }
    }
}

/// Camera output configurations bound together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    Preview,
    VideoCapture,
}

/// Parameters shared by the preview and video-capture use cases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseCaseConfig {
    pub aspect_ratio: AspectRatio,
    pub rotation: Rotation,
    pub quality_selector: QualitySelector,
}

/// What the hardware actually bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundCamera {
    pub lens: LensFacing,
    pub quality: Quality,
}

/// Camera hardware trait
///
/// Implementations:
/// - Simulated: deterministic in-process camera (tests, demo binary)
///
/// A provider holds at most one binding. Recording events for that binding
/// are delivered in order on the channel returned by `start_recording`.
#[async_trait::async_trait]
pub trait CameraProvider: Send + Sync {
    /// Bind preview and video capture for `lens`
    ///
    /// Fails with `BindingFailed` when no matching camera exists or the
    /// configuration is rejected.
    async fn bind(&mut self, lens: LensFacing, config: &UseCaseConfig) -> CameraResult<BoundCamera>;

    /// Release every bound use case
    async fn unbind_all(&mut self);

    /// Update target rotation of the live use cases without rebinding
    fn set_target_rotation(&mut self, rotation: Rotation);

    /// Start recording into `output`
    ///
    /// Returns the receiver for this recording's lifecycle events. The
    /// stream ends after the `Finalize` event.
    async fn start_recording(
        &mut self,
        output: &OutputOptions,
    ) -> CameraResult<mpsc::Receiver<RecordEvent>>;

    /// Ask the hardware to stop; completion is signalled by `Finalize`
    async fn stop_recording(&mut self) -> CameraResult<()>;

    /// Check if a binding is currently held
    fn is_bound(&self) -> bool;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Camera provider factory
pub struct CameraProviderFactory;

impl CameraProviderFactory {
    /// Create a camera provider by backend name
    pub fn create(
        backend: &str,
        simulator: SimulatorConfig,
        store: Arc<dyn MediaStore>,
    ) -> anyhow::Result<Box<dyn CameraProvider>> {
        match backend {
            "simulated" => Ok(Box::new(SimulatedCamera::new(simulator, store))),
            other => anyhow::bail!("Unsupported camera backend: {}", other),
        }
    }
}

/// Default status interval of real hardware, one event per recorded second
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(1);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_display_sizes() {
        assert_eq!(AspectRatio::from_dimensions(1080, 1920), AspectRatio::Ratio16x9);
        assert_eq!(AspectRatio::from_dimensions(1920, 1080), AspectRatio::Ratio16x9);
        assert_eq!(AspectRatio::from_dimensions(1440, 1080), AspectRatio::Ratio4x3);
        assert_eq!(AspectRatio::from_dimensions(1080, 2400), AspectRatio::Ratio16x9);
        assert_eq!(AspectRatio::from_dimensions(1536, 2048), AspectRatio::Ratio4x3);
    }

    #[test]
    fn test_exact_tie_selects_16_9() {
        // 14:9 sits exactly between 4:3 (12:9) and 16:9
        assert_eq!(AspectRatio::from_dimensions(14, 9), AspectRatio::Ratio16x9);
        assert_eq!(AspectRatio::from_dimensions(900, 1400), AspectRatio::Ratio16x9);
        // Just below the midpoint leans to 4:3
        assert_eq!(AspectRatio::from_dimensions(1399, 900), AspectRatio::Ratio4x3);
    }

    #[test]
    fn test_zero_dimension() {
        assert_eq!(AspectRatio::from_dimensions(0, 0), AspectRatio::Ratio16x9);
        assert_eq!(AspectRatio::from_dimensions(1080, 0), AspectRatio::Ratio16x9);
    }

    #[test]
    fn test_lens_toggle_parity() {
        let mut lens = LensFacing::Back;
        for n in 1..=10 {
            lens = lens.toggled();
            let expected = if n % 2 == 0 { LensFacing::Back } else { LensFacing::Front };
            assert_eq!(lens, expected);
        }
    }
}
