// Local push surface and the permission gate in front of it.
//
// The host platform supplies both; the defaults here are for headless runs.

use serde::{Deserialize, Serialize};

use crate::core::error::{PermissionError, PushError};

/// Current notification permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// Not asked yet
    #[default]
    Unknown,
    Granted,
    Denied,
    /// Platform has no local notification capability
    Unsupported,
}

pub trait PermissionProvider: Send + Sync {
    fn request(&self) -> Result<PermissionState, PermissionError>;
}

pub trait PushSurface: Send + Sync {
    fn show(&self, title: &str, body: &str) -> Result<(), PushError>;
}

/// Provider for platforms without local notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessPermissions;

impl PermissionProvider for HeadlessPermissions {
    fn request(&self) -> Result<PermissionState, PermissionError> {
        Ok(PermissionState::Unsupported)
    }
}

/// Provider that always answers with a fixed state.
#[derive(Debug, Clone, Copy)]
pub struct FixedPermission(pub PermissionState);

impl PermissionProvider for FixedPermission {
    fn request(&self) -> Result<PermissionState, PermissionError> {
        Ok(self.0)
    }
}

/// Push surface that writes to the log instead of a desktop notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPushSurface;

impl PushSurface for LogPushSurface {
    fn show(&self, title: &str, body: &str) -> Result<(), PushError> {
        log::info!("[push] {}: {}", title, body);
        Ok(())
    }
}
