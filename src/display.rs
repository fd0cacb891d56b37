// Display geometry and rotation notifications
//
// The display subsystem publishes rotation changes keyed by display id.
// Listeners are explicit subscriptions: `DisplayMonitor::register` returns a
// `DisplaySubscription` that forwards events to a session controller until it
// is dropped or unregistered.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::CameraError;
use crate::session::SessionHandle;

/// Identifier of a physical or virtual display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayId(pub u32);

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "display-{}", self.0)
    }
}

/// Surface rotation of a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Rotation0,
    Rotation90,
    Rotation180,
    Rotation270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Rotation0 => 0,
            Rotation::Rotation90 => 90,
            Rotation::Rotation180 => 180,
            Rotation::Rotation270 => 270,
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = CameraError;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Rotation0),
            90 => Ok(Rotation::Rotation90),
            180 => Ok(Rotation::Rotation180),
            270 => Ok(Rotation::Rotation270),
            other => Err(CameraError::InvalidRotation(other)),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Real size of a display in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub display_id: DisplayId,
    pub width_px: u32,
    pub height_px: u32,
}

/// Rotation change notification for one display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayEvent {
    pub display_id: DisplayId,
    pub rotation: Rotation,
}

/// Source of display rotation notifications
#[derive(Debug, Clone)]
pub struct DisplayMonitor {
    events: broadcast::Sender<DisplayEvent>,
}

impl DisplayMonitor {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self { events }
    }

    /// Publish a rotation change; returns how many listeners received it
    pub fn publish(&self, event: DisplayEvent) -> usize {
        debug!("Display {} rotated to {}", event.display_id, event.rotation);
        // No listeners is not an error, the event is simply dropped
        self.events.send(event).unwrap_or(0)
    }

    /// Register a session controller as a display listener
    ///
    /// Events are forwarded unfiltered; the controller compares the display
    /// id with its bound display before touching the capture session.
    pub fn register(&self, session: SessionHandle) -> DisplaySubscription {
        let mut rx = self.events.subscribe();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if session
                            .display_changed(event.display_id, event.rotation)
                            .await
                            .is_err()
                        {
                            // Controller gone, nothing left to notify
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Display listener lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Display listener stopped");
        });

        info!("Display listener registered");

        DisplaySubscription { task: Some(task) }
    }

    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }
}

impl Default for DisplayMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration of a display listener, released on drop
pub struct DisplaySubscription {
    task: Option<JoinHandle<()>>,
}

impl DisplaySubscription {
    /// Stop forwarding display events
    pub fn unregister(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Display listener unregistered");
        }
    }
}

impl Drop for DisplaySubscription {
    fn drop(&mut self) {
        self.release();
    }
}
