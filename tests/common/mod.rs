// Shared test doubles
//
// `ScriptedCamera` is a camera provider whose recording events are injected
// by the test through `ScriptedControls`, so event order (including illegal
// sequences) is fully under test control.

#![allow(dead_code)]

use camera_session::camera::{BoundCamera, CameraProvider, LensFacing, Quality, UseCaseConfig};
use camera_session::display::{DisplayId, DisplayMetrics, Rotation};
use camera_session::recording::{RecordEvent, RecordingStats};
use camera_session::storage::OutputOptions;
use camera_session::CameraResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Clone, Default)]
pub struct ScriptedControls {
    pub binds: Arc<AtomicUsize>,
    pub unbinds: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    pub rotation: Arc<Mutex<Option<Rotation>>>,
    pub outputs: Arc<Mutex<Vec<OutputOptions>>>,
    events: Arc<Mutex<Option<mpsc::Sender<RecordEvent>>>>,
}

impl ScriptedControls {
    /// Deliver an event on the current recording's stream
    pub async fn emit(&self, event: RecordEvent) {
        let tx = self
            .events
            .lock()
            .unwrap()
            .clone()
            .expect("no recording started");
        tx.send(event).await.expect("controller dropped the stream");
    }

    /// Close the current recording's stream without a Finalize
    pub fn close_stream(&self) {
        self.events.lock().unwrap().take();
    }

    pub fn binds(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn rotation(&self) -> Option<Rotation> {
        *self.rotation.lock().unwrap()
    }
}

pub struct ScriptedCamera {
    controls: ScriptedControls,
    bound: bool,
}

impl ScriptedCamera {
    pub fn new() -> (Self, ScriptedControls) {
        let controls = ScriptedControls::default();
        (
            Self {
                controls: controls.clone(),
                bound: false,
            },
            controls,
        )
    }
}

#[async_trait::async_trait]
impl CameraProvider for ScriptedCamera {
    async fn bind(&mut self, lens: LensFacing, config: &UseCaseConfig) -> CameraResult<BoundCamera> {
        self.bound = true;
        self.controls.binds.fetch_add(1, Ordering::SeqCst);
        *self.controls.rotation.lock().unwrap() = Some(config.rotation);
        Ok(BoundCamera {
            lens,
            quality: Quality::Hd,
        })
    }

    async fn unbind_all(&mut self) {
        if self.bound {
            self.controls.unbinds.fetch_add(1, Ordering::SeqCst);
        }
        self.bound = false;
        *self.controls.rotation.lock().unwrap() = None;
    }

    fn set_target_rotation(&mut self, rotation: Rotation) {
        *self.controls.rotation.lock().unwrap() = Some(rotation);
    }

    async fn start_recording(
        &mut self,
        output: &OutputOptions,
    ) -> CameraResult<mpsc::Receiver<RecordEvent>> {
        let (tx, rx) = mpsc::channel(32);
        *self.controls.events.lock().unwrap() = Some(tx);
        self.controls.outputs.lock().unwrap().push(output.clone());
        Ok(rx)
    }

    async fn stop_recording(&mut self) -> CameraResult<()> {
        self.controls.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_bound(&self) -> bool {
        self.bound
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub fn phone_display() -> DisplayMetrics {
    DisplayMetrics {
        display_id: DisplayId(0),
        width_px: 1080,
        height_px: 1920,
    }
}

pub fn stats(secs: u64) -> RecordingStats {
    RecordingStats::new(Duration::from_secs(secs), secs * 1_000_000)
}
