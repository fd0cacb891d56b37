// Media storage for finished recordings
//
// The core never touches raw file handles. A recording is described by a
// `ContentDescriptor`; the store allocates an output URI for it before the
// hardware starts writing, and records a catalogue entry once the hardware
// reports the recording finalized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{CameraError, CameraResult};

pub const VIDEO_MIME_TYPE: &str = "video/mp4";

/// Catalogue file kept in the root of a `DirectoryMediaStore`
pub const CATALOGUE_FILE: &str = "recordings.jsonl";

/// Media collection a recording is inserted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCollection {
    ExternalVideo,
}

/// Describes the content to create, not where its bytes live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDescriptor {
    pub display_name: String,
    pub mime_type: String,
    pub collection: MediaCollection,
}

impl ContentDescriptor {
    /// `<prefix>-recording-<epoch-millis>.mp4`
    pub fn for_recording(prefix: &str, at: DateTime<Utc>) -> Self {
        Self {
            display_name: format!("{}-recording-{}.mp4", prefix, at.timestamp_millis()),
            mime_type: VIDEO_MIME_TYPE.to_string(),
            collection: MediaCollection::ExternalVideo,
        }
    }
}

/// Everything the hardware needs to produce one recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    pub descriptor: ContentDescriptor,
    /// Hardware stops on its own once this much has been recorded
    pub duration_limit: Duration,
    pub with_audio: bool,
}

/// Catalogue entry for a finalized recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRecording {
    pub descriptor: ContentDescriptor,
    pub output_uri: String,
    pub duration: Duration,
    pub saved_at: DateTime<Utc>,
}

/// Media storage trait
///
/// Implementations:
/// - Directory: files under a root directory plus a JSON-lines catalogue
/// - Memory: in-process catalogue (tests)
pub trait MediaStore: Send + Sync {
    /// Reserve an output location for `descriptor`
    ///
    /// The location exists once this returns, even if the hardware never
    /// writes to it.
    fn allocate(&self, descriptor: &ContentDescriptor) -> CameraResult<String>;

    /// Record a finalized recording in the catalogue
    fn persist(&self, recording: &SavedRecording) -> CameraResult<()>;

    /// All catalogued recordings, oldest first
    fn list(&self) -> CameraResult<Vec<SavedRecording>>;
}

/// Media store backed by a directory on disk
pub struct DirectoryMediaStore {
    root: PathBuf,
    // Serializes catalogue appends
    catalogue: Mutex<PathBuf>,
}

impl DirectoryMediaStore {
    pub fn new(root: impl AsRef<Path>) -> CameraResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        info!("Media store initialized at {}", root.display());

        let catalogue = root.join(CATALOGUE_FILE);
        Ok(Self {
            root,
            catalogue: Mutex::new(catalogue),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MediaStore for DirectoryMediaStore {
    fn allocate(&self, descriptor: &ContentDescriptor) -> CameraResult<String> {
        let path = self.root.join(&descriptor.display_name);
        // Reserve the entry; the recorder fills it in
        OpenOptions::new().create(true).write(true).open(&path)?;

        let uri = format!("file://{}", path.display());
        debug!("Allocated {} for {}", uri, descriptor.display_name);
        Ok(uri)
    }

    fn persist(&self, recording: &SavedRecording) -> CameraResult<()> {
        let catalogue = self
            .catalogue
            .lock()
            .map_err(|_| CameraError::Storage("catalogue lock poisoned".to_string()))?;

        let mut line = serde_json::to_string(recording)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&*catalogue)?;
        file.write_all(line.as_bytes())?;

        info!(
            "Saved recording {} ({:.1}s) to {}",
            recording.descriptor.display_name,
            recording.duration.as_secs_f64(),
            recording.output_uri
        );

        Ok(())
    }

    fn list(&self) -> CameraResult<Vec<SavedRecording>> {
        let catalogue = self
            .catalogue
            .lock()
            .map_err(|_| CameraError::Storage("catalogue lock poisoned".to_string()))?;

        if !catalogue.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(fs::File::open(&*catalogue)?);
        let mut recordings = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            recordings.push(serde_json::from_str(&line)?);
        }

        Ok(recordings)
    }
}

/// In-memory media store
#[derive(Default)]
pub struct MemoryMediaStore {
    recordings: Mutex<Vec<SavedRecording>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaStore for MemoryMediaStore {
    fn allocate(&self, descriptor: &ContentDescriptor) -> CameraResult<String> {
        Ok(format!("memory://videos/{}", descriptor.display_name))
    }

    fn persist(&self, recording: &SavedRecording) -> CameraResult<()> {
        self.recordings
            .lock()
            .map_err(|_| CameraError::Storage("catalogue lock poisoned".to_string()))?
            .push(recording.clone());
        Ok(())
    }

    fn list(&self) -> CameraResult<Vec<SavedRecording>> {
        Ok(self
            .recordings
            .lock()
            .map_err(|_| CameraError::Storage("catalogue lock poisoned".to_string()))?
            .clone())
    }
}
