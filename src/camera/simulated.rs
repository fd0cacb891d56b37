// Simulated camera hardware
//
// Behaves like a single physical camera module with one or two lenses.
// Each tick of the configured interval stands for one recorded second, so
// tests can run a full 21 second recording in a fraction of a second while
// the event stream looks exactly like the real one:
//
//   Start -> Status (one per tick) -> Finalize
//
// The recording stops on request or when the duration limit is reached.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::backend::{BoundCamera, CameraProvider, LensFacing, UseCaseConfig, DEFAULT_STATUS_INTERVAL};
use super::quality::Quality;
use crate::display::Rotation;
use crate::error::{CameraError, CameraResult};
use crate::recording::{FinalizeError, RecordEvent, RecordingStats};
use crate::storage::{MediaStore, OutputOptions};

/// Configuration for the simulated camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Lenses physically present (empty = no camera available)
    pub lenses: Vec<LensFacing>,

    /// Qualities the encoder accepts
    pub supported_qualities: Vec<Quality>,

    /// Wall-clock time per simulated recorded second
    pub tick_interval: Duration,

    /// Encoded bytes produced per recorded second
    pub bytes_per_second: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            lenses: vec![LensFacing::Back, LensFacing::Front],
            supported_qualities: vec![Quality::Hd, Quality::Fhd],
            tick_interval: DEFAULT_STATUS_INTERVAL,
            bytes_per_second: 1_250_000, // ~10 Mbit/s
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    lens: LensFacing,
    rotation: Rotation,
}

struct ActiveRecording {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

pub struct SimulatedCamera {
    config: SimulatorConfig,
    store: Arc<dyn MediaStore>,
    binding: Option<Binding>,
    recording: Option<ActiveRecording>,
    bind_count: usize,
}

impl SimulatedCamera {
    pub fn new(config: SimulatorConfig, store: Arc<dyn MediaStore>) -> Self {
        info!(
            "Simulated camera initialized: lenses {:?}, tick {:?}",
            config.lenses, config.tick_interval
        );

        Self {
            config,
            store,
            binding: None,
            recording: None,
            bind_count: 0,
        }
    }

    /// Rotation of the live use cases, if bound
    pub fn target_rotation(&self) -> Option<Rotation> {
        self.binding.map(|b| b.rotation)
    }

    /// Number of successful binds so far
    pub fn bind_count(&self) -> usize {
        self.bind_count
    }

    fn is_recording(&self) -> bool {
        self.recording
            .as_ref()
            .map(|r| !r.task.is_finished())
            .unwrap_or(false)
    }
}

#[async_trait::async_trait]
impl CameraProvider for SimulatedCamera {
    async fn bind(&mut self, lens: LensFacing, config: &UseCaseConfig) -> CameraResult<BoundCamera> {
        if self.config.lenses.is_empty() {
            return Err(CameraError::BindingFailed {
                lens,
                reason: "no camera provider available".to_string(),
            });
        }

        if !self.config.lenses.contains(&lens) {
            return Err(CameraError::BindingFailed {
                lens,
                reason: format!("no {} camera on this device", lens),
            });
        }

        if self.binding.is_some() {
            return Err(CameraError::BindingFailed {
                lens,
                reason: "camera already in use".to_string(),
            });
        }

        let quality = config
            .quality_selector
            .select(&self.config.supported_qualities)
            .ok_or_else(|| CameraError::BindingFailed {
                lens,
                reason: "no supported recording quality".to_string(),
            })?;

        self.binding = Some(Binding {
            lens,
            rotation: config.rotation,
        });
        self.bind_count += 1;

        debug!(
            "Simulated {} camera bound ({}, {}, {:?})",
            lens, config.aspect_ratio, config.rotation, quality
        );

        Ok(BoundCamera { lens, quality })
    }

    async fn unbind_all(&mut self) {
        if let Some(mut recording) = self.recording.take() {
            // Unbinding the video use case terminates the recording
            if let Some(stop_tx) = recording.stop_tx.take() {
                let _ = stop_tx.send(());
            }
            if let Err(e) = recording.task.await {
                error!("Recording task panicked: {}", e);
            }
        }

        if let Some(binding) = self.binding.take() {
            debug!("Simulated {} camera unbound", binding.lens);
        }
    }

    fn set_target_rotation(&mut self, rotation: Rotation) {
        if let Some(binding) = self.binding.as_mut() {
            binding.rotation = rotation;
        }
    }

    async fn start_recording(
        &mut self,
        output: &OutputOptions,
    ) -> CameraResult<mpsc::Receiver<RecordEvent>> {
        if self.binding.is_none() {
            return Err(CameraError::NotBound);
        }

        if self.is_recording() {
            return Err(CameraError::RecordingInProgress(
                crate::recording::RecordingState::Active,
            ));
        }

        let output_uri = self.store.allocate(&output.descriptor)?;

        let (event_tx, event_rx) = mpsc::channel(32);
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let tick = self.config.tick_interval;
        let bytes_per_second = self.config.bytes_per_second;
        let limit_secs = output.duration_limit.as_secs();
        let name = output.descriptor.display_name.clone();

        let task = tokio::spawn(async move {
            let mut stats = RecordingStats::default();

            if event_tx.send(RecordEvent::Start { stats }).await.is_err() {
                warn!("Recording {} has no event listener", name);
                return;
            }

            let mut ticker = tokio::time::interval(tick.max(Duration::from_millis(1)));
            // First tick completes immediately
            ticker.tick().await;

            let mut error = None;
            loop {
                if limit_secs > 0 && stats.recorded_duration.as_secs() >= limit_secs {
                    error = Some(FinalizeError::DurationLimitReached);
                    break;
                }

                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        stats.recorded_duration += Duration::from_secs(1);
                        stats.recorded_bytes += bytes_per_second;
                        if event_tx.send(RecordEvent::Status { stats }).await.is_err() {
                            break;
                        }
                    }
                }
            }

            if stats.recorded_bytes == 0 {
                error = Some(FinalizeError::NoValidData);
            }

            debug!("Simulated recording {} finalizing", name);
            let _ = event_tx
                .send(RecordEvent::Finalize {
                    stats,
                    output_uri,
                    error,
                })
                .await;
        });

        self.recording = Some(ActiveRecording {
            stop_tx: Some(stop_tx),
            task,
        });

        Ok(event_rx)
    }

    async fn stop_recording(&mut self) -> CameraResult<()> {
        if let Some(recording) = self.recording.as_mut() {
            if let Some(stop_tx) = recording.stop_tx.take() {
                // Recording may already have finished on its own
                let _ = stop_tx.send(());
            }
        }
        Ok(())
    }

    fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
