// Runtime permission checks
//
// Camera and microphone access are always required; media-location access
// is required from API level 29 on. Missing permissions are requested once.
// Any denial aborts activation: no camera binding is attempted and the
// caller gets `PermissionDenied`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{error, info};

use crate::error::{CameraError, CameraResult};

/// First platform API level that needs media-location access
pub const MEDIA_LOCATION_API_LEVEL: u32 = 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Camera,
    RecordAudio,
    AccessMediaLocation,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Permission::Camera => "CAMERA",
            Permission::RecordAudio => "RECORD_AUDIO",
            Permission::AccessMediaLocation => "ACCESS_MEDIA_LOCATION",
        };
        f.write_str(name)
    }
}

/// Permissions the recorder needs on the given platform API level
pub fn required_permissions(api_level: u32) -> Vec<Permission> {
    let mut permissions = vec![Permission::Camera, Permission::RecordAudio];
    if api_level >= MEDIA_LOCATION_API_LEVEL {
        permissions.push(Permission::AccessMediaLocation);
    }
    permissions
}

/// Platform permission subsystem
#[async_trait::async_trait]
pub trait PermissionGate: Send + Sync {
    /// Check a permission without prompting
    fn is_granted(&self, permission: Permission) -> bool;

    /// Prompt for the given permissions; returns the ones granted
    async fn request(&self, permissions: &[Permission]) -> Vec<Permission>;
}

/// Make sure every required permission is granted before activation
pub async fn ensure_granted(gate: &dyn PermissionGate, api_level: u32) -> CameraResult<()> {
    let required = required_permissions(api_level);

    let missing: Vec<Permission> = required
        .iter()
        .copied()
        .filter(|p| !gate.is_granted(*p))
        .collect();

    if missing.is_empty() {
        return Ok(());
    }

    info!("Requesting permissions: {:?}", missing);
    let granted = gate.request(&missing).await;

    let denied: Vec<Permission> = missing
        .into_iter()
        .filter(|p| !granted.contains(p))
        .collect();

    if denied.is_empty() {
        info!("All permissions granted");
        Ok(())
    } else {
        error!("Permissions denied: {:?}", denied);
        Err(CameraError::PermissionDenied(denied))
    }
}

/// Permission gate with a fixed answer set
///
/// Already-held permissions pass the check; requests grant whatever is in
/// `grantable`.
#[derive(Debug, Clone, Default)]
pub struct StaticPermissionGate {
    held: HashSet<Permission>,
    grantable: HashSet<Permission>,
}

impl StaticPermissionGate {
    pub fn new(held: &[Permission], grantable: &[Permission]) -> Self {
        Self {
            held: held.iter().copied().collect(),
            grantable: grantable.iter().copied().collect(),
        }
    }

    /// Every permission already held
    pub fn all_granted() -> Self {
        Self::new(
            &[
                Permission::Camera,
                Permission::RecordAudio,
                Permission::AccessMediaLocation,
            ],
            &[],
        )
    }
}

#[async_trait::async_trait]
impl PermissionGate for StaticPermissionGate {
    fn is_granted(&self, permission: Permission) -> bool {
        self.held.contains(&permission)
    }

    async fn request(&self, permissions: &[Permission]) -> Vec<Permission> {
        permissions
            .iter()
            .copied()
            .filter(|p| self.grantable.contains(p))
            .collect()
    }
}
