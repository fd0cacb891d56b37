use tracing::{debug, error, info};

use super::capture::CaptureSession;
use crate::camera::{AspectRatio, CameraProvider, LensFacing, QualitySelector, UseCase, UseCaseConfig};
use crate::display::{DisplayId, DisplayMetrics, Rotation};
use crate::error::{CameraError, CameraResult};

/// Owns the camera provider and the one capture session bound to it
pub struct CaptureSessionManager {
    provider: Box<dyn CameraProvider>,
    quality_selector: QualitySelector,

    /// Selected lens, flips on toggle even if the rebind fails
    lens: LensFacing,

    /// Display parameters of the last bind request
    display: Option<(DisplayMetrics, Rotation)>,

    session: Option<CaptureSession>,
}

impl CaptureSessionManager {
    pub fn new(
        provider: Box<dyn CameraProvider>,
        lens: LensFacing,
        quality_selector: QualitySelector,
    ) -> Self {
        Self {
            provider,
            quality_selector,
            lens,
            display: None,
            session: None,
        }
    }

    pub fn lens(&self) -> LensFacing {
        self.lens
    }

    pub fn session(&self) -> Option<&CaptureSession> {
        self.session.as_ref()
    }

    pub fn provider_mut(&mut self) -> &mut dyn CameraProvider {
        self.provider.as_mut()
    }

    /// Tear down any binding and bind preview + video capture for `lens`
    ///
    /// On failure the error is logged and the manager stays unbound.
    pub async fn bind(
        &mut self,
        lens: LensFacing,
        metrics: DisplayMetrics,
        rotation: Rotation,
    ) -> CameraResult<CaptureSession> {
        self.lens = lens;
        self.display = Some((metrics, rotation));

        let aspect_ratio = AspectRatio::from_dimensions(metrics.width_px, metrics.height_px);
        let config = UseCaseConfig {
            aspect_ratio,
            rotation,
            quality_selector: self.quality_selector.clone(),
        };

        self.release().await;

        match self.provider.bind(lens, &config).await {
            Ok(bound) => {
                let session = CaptureSession {
                    lens: bound.lens,
                    display_id: metrics.display_id,
                    aspect_ratio,
                    rotation,
                    use_cases: vec![UseCase::Preview, UseCase::VideoCapture],
                    quality: bound.quality,
                };

                info!(
                    "Bound {} camera via {} ({} {}x{}, {}, {:?})",
                    lens,
                    self.provider.name(),
                    aspect_ratio,
                    metrics.width_px,
                    metrics.height_px,
                    rotation,
                    bound.quality
                );

                self.session = Some(session.clone());
                Ok(session)
            }
            Err(e) => {
                error!("Failed to bind use cases: {}", e);
                Err(e)
            }
        }
    }

    /// Flip the lens and rebind with the current display parameters
    pub async fn toggle_lens(&mut self) -> CameraResult<CaptureSession> {
        let lens = self.lens.toggled();
        self.lens = lens;
        info!("Switching to {} camera", lens);

        let Some((metrics, rotation)) = self.display else {
            return Err(CameraError::NotBound);
        };

        self.bind(lens, metrics, rotation).await
    }

    /// Apply a rotation change if it concerns the bound display
    ///
    /// Only the target rotation of the live use cases changes; nothing is
    /// rebound. Returns whether the session was updated.
    pub fn on_display_changed(&mut self, display_id: DisplayId, rotation: Rotation) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        if session.display_id != display_id {
            debug!("Ignoring rotation of {}", display_id);
            return false;
        }

        if session.rotation == rotation {
            return false;
        }

        session.rotation = rotation;
        if let Some((_, current)) = self.display.as_mut() {
            *current = rotation;
        }
        self.provider.set_target_rotation(rotation);

        info!("Target rotation of {} set to {}", display_id, rotation);
        true
    }

    /// Unbind everything the provider holds
    pub async fn release(&mut self) {
        if self.session.take().is_some() || self.provider.is_bound() {
            debug!("Releasing camera binding");
        }
        self.provider.unbind_all().await;
    }
}
