//! ## hushlist-core::host
//! **Boundary between the filter and the host notification platform**
//!
//! The host owns event dispatch: it calls the subscribed
//! [`NotificationListener`] once per posted notification, possibly from several
//! of its own threads. Permission negotiation and app enumeration are also host
//! concerns and only appear here as traits.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::events::{CancelTarget, NotificationEvent};

/// First host API level with key addressing and active-notification listing.
pub const KEYED_API_LEVEL: u32 = 21;

/// What the host lets the filter do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    /// Cancellation by opaque key is available.
    pub keyed_cancel: bool,
    /// Currently visible notifications can be listed.
    pub enumerate_visible: bool,
}

impl HostCapabilities {
    pub fn from_api_level(level: u32) -> Self {
        let modern = level >= KEYED_API_LEVEL;
        Self {
            keyed_cancel: modern,
            enumerate_visible: modern,
        }
    }
}

/// Receives notification-posted callbacks from the host.
pub trait NotificationListener: Send + Sync {
    fn on_notification_posted(&self, event: &NotificationEvent);
}

pub trait NotificationHost: Send + Sync {
    fn capabilities(&self) -> HostCapabilities;

    /// Starts delivering posted notifications to `listener`.
    fn subscribe(&self, listener: Arc<dyn NotificationListener>) -> Result<(), HostError>;

    /// Stops delivery. Unsubscribing when nothing is subscribed is a no-op.
    fn unsubscribe(&self);

    /// Removes one notification from the visible surface.
    fn cancel(&self, target: &CancelTarget) -> Result<(), HostError>;

    /// Notifications currently visible. Fails with [`HostError::Unsupported`]
    /// when `enumerate_visible` is not available.
    fn list_visible(&self) -> Result<Vec<NotificationEvent>, HostError>;
}

/// Result of asking the host for notification access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessOutcome {
    Granted,
    Denied,
    /// The user was sent to the system settings; the answer arrives later.
    SettingsOpened,
}

/// Permission state as seen by the control surface.
pub trait AccessGate: Send + Sync {
    fn post_permission_granted(&self) -> bool;
    fn listener_access_granted(&self) -> bool;
    fn request_access(&self) -> AccessOutcome;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledApp {
    pub identifier: String,
    pub display_name: String,
    #[serde(default)]
    pub system: bool,
}

pub trait AppCatalog: Send + Sync {
    fn installed_apps(&self) -> Result<Vec<InstalledApp>, HostError>;

    /// Installed apps without the system ones.
    fn user_apps(&self) -> Result<Vec<InstalledApp>, HostError> {
        Ok(self
            .installed_apps()?
            .into_iter()
            .filter(|app| !app.system)
            .collect())
    }
}
