use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::camera::{LensFacing, Quality, QualitySelector, SimulatorConfig};
use crate::display::{DisplayId, DisplayMetrics, Rotation};
use crate::permissions::Permission;
use crate::recording::RecorderConfig;
use crate::session::SessionConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub camera: CameraConfig,
    pub display: DisplayConfig,
    pub storage: StorageConfig,
    pub platform: PlatformConfig,
    #[serde(default)]
    pub simulator: SimulatorSection,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    pub backend: String,
    #[serde(default)]
    pub initial_lens: LensFacing,
    pub output_prefix: String,
    pub duration_limit_secs: u64,
    pub with_audio: bool,
    #[serde(default)]
    pub quality_selector: QualitySelector,
}

#[derive(Debug, Deserialize)]
pub struct DisplayConfig {
    pub id: u32,
    pub width_px: u32,
    pub height_px: u32,
    #[serde(default)]
    pub rotation: Rotation,
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    pub output_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct PlatformConfig {
    pub api_level: u32,
    #[serde(default)]
    pub granted_permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize)]
pub struct SimulatorSection {
    pub lenses: Vec<LensFacing>,
    pub supported_qualities: Vec<Quality>,
    pub tick_ms: u64,
    pub bytes_per_second: u64,
}

impl Default for SimulatorSection {
    fn default() -> Self {
        let defaults = SimulatorConfig::default();
        Self {
            lenses: defaults.lenses,
            supported_qualities: defaults.supported_qualities,
            tick_ms: defaults.tick_interval.as_millis() as u64,
            bytes_per_second: defaults.bytes_per_second,
        }
    }
}

impl Config {
    /// Load from a config file, overridable with `CAMERA_SESSION__*` variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CAMERA_SESSION").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            initial_lens: self.camera.initial_lens,
            recorder: RecorderConfig {
                output_prefix: self.camera.output_prefix.clone(),
                duration_limit: Duration::from_secs(self.camera.duration_limit_secs),
                with_audio: self.camera.with_audio,
            },
            quality_selector: self.camera.quality_selector.clone(),
            api_level: self.platform.api_level,
            ..SessionConfig::default()
        }
    }

    pub fn display_metrics(&self) -> DisplayMetrics {
        DisplayMetrics {
            display_id: DisplayId(self.display.id),
            width_px: self.display.width_px,
            height_px: self.display.height_px,
        }
    }

    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            lenses: self.simulator.lenses.clone(),
            supported_qualities: self.simulator.supported_qualities.clone(),
            tick_interval: Duration::from_millis(self.simulator.tick_ms),
            bytes_per_second: self.simulator.bytes_per_second,
        }
    }

    /// Storage directory with `~` expanded
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.output_dir).into_owned())
    }
}
