//! Notification-posted events and how to address them for cancellation.

use serde::{Deserialize, Serialize};

use crate::host::HostCapabilities;

/// One notification as reported by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Identifier of the application that posted the notification.
    pub app_id: String,

    /// Host-assigned opaque key. Older hosts do not assign one.
    pub key: Option<String>,

    /// Optional tag supplied by the posting application.
    pub tag: Option<String>,

    /// Numeric id supplied by the posting application.
    pub id: i32,

    /// Host timestamp, informational only.
    pub posted_at: u64,
}

/// Addresses a single notification on the host.
///
/// Both variants resolve to the same underlying notification; which one is used
/// depends on what the host supports.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancelTarget {
    Key(String),
    Legacy {
        app_id: String,
        tag: Option<String>,
        id: i32,
    },
}

impl NotificationEvent {
    pub fn new(app_id: impl Into<String>, id: i32) -> Self {
        Self {
            app_id: app_id.into(),
            key: None,
            tag: None,
            id,
            posted_at: 0,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_posted_at(mut self, posted_at: u64) -> Self {
        self.posted_at = posted_at;
        self
    }

    /// Picks key addressing when the host supports it and the event carries a
    /// key, the `(app, tag, id)` triple otherwise.
    pub fn cancel_target(&self, caps: &HostCapabilities) -> CancelTarget {
        match (&self.key, caps.keyed_cancel) {
            (Some(key), true) => CancelTarget::Key(key.clone()),
            _ => CancelTarget::Legacy {
                app_id: self.app_id.clone(),
                tag: self.tag.clone(),
                id: self.id,
            },
        }
    }
}

impl std::fmt::Display for CancelTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelTarget::Key(key) => write!(f, "{key}"),
            CancelTarget::Legacy { app_id, tag, id } => {
                write!(f, "{app_id}|{}|{id}", tag.as_deref().unwrap_or("-"))
            }
        }
    }
}
