pub mod camera;
pub mod config;
pub mod display;
pub mod error;
pub mod http;
pub mod permissions;
pub mod recording;
pub mod session;
pub mod storage;

pub use camera::{
    AspectRatio, CameraProvider, CameraProviderFactory, LensFacing, Quality, QualitySelector,
    SimulatedCamera, SimulatorConfig,
};
pub use config::Config;
pub use display::{DisplayEvent, DisplayId, DisplayMetrics, DisplayMonitor, DisplaySubscription, Rotation};
pub use error::{CameraError, CameraResult};
pub use http::{create_router, AppState};
pub use permissions::{Permission, PermissionGate, StaticPermissionGate};
pub use recording::{
    format_duration, RecordEvent, RecorderConfig, RecordingState, RecordingStateMachine, UiState,
};
pub use session::{CaptureSession, CaptureSessionManager, SessionConfig, SessionController, SessionHandle, StatusSnapshot};
pub use storage::{DirectoryMediaStore, MediaStore, MemoryMediaStore, SavedRecording};
