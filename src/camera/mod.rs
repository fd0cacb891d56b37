pub mod backend;
pub mod quality;
pub mod simulated;

pub use backend::{
    AspectRatio, BoundCamera, CameraProvider, CameraProviderFactory, LensFacing, UseCase,
    UseCaseConfig,
};
pub use quality::{FallbackStrategy, Quality, QualitySelector};
pub use simulated::{SimulatedCamera, SimulatorConfig};
