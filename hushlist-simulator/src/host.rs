//! Simulated notification host.
//!
//! `post` plays the role of the platform dispatcher: it puts the notification in
//! the visible tray and then calls the subscribed listener on the caller's
//! thread. No lock is held during the callback, so the listener may call back
//! into `cancel` or `list_visible`.

use std::collections::BTreeMap;
use std::sync::Arc;

use blake3::Hasher;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use hushlist_core::error::HostError;
use hushlist_core::events::{CancelTarget, NotificationEvent};
use hushlist_core::host::{
    AccessGate, AccessOutcome, AppCatalog, HostCapabilities, InstalledApp, NotificationHost,
    NotificationListener,
};

#[derive(Debug, Default)]
struct Tray {
    visible: BTreeMap<String, NotificationEvent>,
    cancelled: Vec<CancelTarget>,
    fail_next: usize,
    clock: u64,
}

#[derive(Debug, Clone, Copy)]
struct Access {
    post: bool,
    listener: bool,
    grant_on_request: bool,
}

pub struct SimulatedHost {
    caps: HostCapabilities,
    tray: Mutex<Tray>,
    listener: RwLock<Option<Arc<dyn NotificationListener>>>,
    access: Mutex<Access>,
    apps: Vec<InstalledApp>,
}

/// Key layout used by the host: `user|app|id|tag`.
fn host_key(app_id: &str, tag: Option<&str>, id: i32) -> String {
    format!("0|{}|{}|{}", app_id, id, tag.unwrap_or("null"))
}

impl SimulatedHost {
    pub fn new(api_level: u32) -> Self {
        Self {
            caps: HostCapabilities::from_api_level(api_level),
            tray: Mutex::new(Tray::default()),
            listener: RwLock::new(None),
            access: Mutex::new(Access {
                post: true,
                listener: true,
                grant_on_request: true,
            }),
            apps: Vec::new(),
        }
    }

    pub fn with_apps(mut self, apps: Vec<InstalledApp>) -> Self {
        self.apps = apps;
        self
    }

    /// Sets the permission state. With `grant_on_request`, `request_access`
    /// grants whatever is missing.
    pub fn set_access(&self, post: bool, listener: bool, grant_on_request: bool) {
        *self.access.lock() = Access {
            post,
            listener,
            grant_on_request,
        };
    }

    /// Posts a notification and dispatches it to the subscribed listener.
    /// Re-posting the same `(app, tag, id)` replaces the visible entry.
    pub fn post(&self, app_id: &str, tag: Option<&str>, id: i32) -> NotificationEvent {
        let key = host_key(app_id, tag, id);
        let event = {
            let mut tray = self.tray.lock();
            tray.clock += 1;
            let mut event = NotificationEvent::new(app_id, id).with_posted_at(tray.clock);
            event.tag = tag.map(str::to_owned);
            if self.caps.keyed_cancel {
                event.key = Some(key.clone());
            }
            tray.visible.insert(key, event.clone());
            event
        };

        let listener = self.listener.read().clone();
        match listener {
            Some(listener) => listener.on_notification_posted(&event),
            None => trace!(app_id, "No listener subscribed"),
        }
        event
    }

    /// Makes the next `count` cancellations fail.
    pub fn fail_next_cancels(&self, count: usize) {
        self.tray.lock().fail_next = count;
    }

    /// Visible notifications ordered by host key.
    pub fn visible(&self) -> Vec<NotificationEvent> {
        self.tray.lock().visible.values().cloned().collect()
    }

    /// Sorted app ids of the visible notifications, one entry per notification.
    pub fn visible_apps(&self) -> Vec<String> {
        let mut apps: Vec<String> = self
            .tray
            .lock()
            .visible
            .values()
            .map(|event| event.app_id.clone())
            .collect();
        apps.sort();
        apps
    }

    /// Successful cancellations in the order they happened.
    pub fn cancellations(&self) -> Vec<CancelTarget> {
        self.tray.lock().cancelled.clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.listener.read().is_some()
    }

    /// BLAKE3 digest of the visible host keys, hex encoded.
    pub fn tray_hash(&self) -> String {
        let tray = self.tray.lock();
        let mut hasher = Hasher::new();
        for key in tray.visible.keys() {
            hasher.update(key.as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

impl NotificationHost for SimulatedHost {
    fn capabilities(&self) -> HostCapabilities {
        self.caps
    }

    fn subscribe(&self, listener: Arc<dyn NotificationListener>) -> Result<(), HostError> {
        let mut slot = self.listener.write();
        if slot.is_some() {
            return Err(HostError::AlreadySubscribed);
        }
        *slot = Some(listener);
        debug!("Listener subscribed");
        Ok(())
    }

    fn unsubscribe(&self) {
        if self.listener.write().take().is_some() {
            debug!("Listener unsubscribed");
        }
    }

    fn cancel(&self, target: &CancelTarget) -> Result<(), HostError> {
        let mut tray = self.tray.lock();
        if tray.fail_next > 0 {
            tray.fail_next -= 1;
            return Err(HostError::CancelRejected(target.to_string()));
        }

        let key = match target {
            CancelTarget::Key(key) => {
                if !self.caps.keyed_cancel {
                    return Err(HostError::Unsupported("key cancellation"));
                }
                key.clone()
            }
            CancelTarget::Legacy { app_id, tag, id } => host_key(app_id, tag.as_deref(), *id),
        };

        // Cancelling something no longer visible is not an error on the host.
        if tray.visible.remove(&key).is_none() {
            trace!(%key, "Cancel target not visible");
        }
        tray.cancelled.push(target.clone());
        Ok(())
    }

    fn list_visible(&self) -> Result<Vec<NotificationEvent>, HostError> {
        if !self.caps.enumerate_visible {
            return Err(HostError::Unsupported("listing visible notifications"));
        }
        Ok(self.visible())
    }
}

impl AccessGate for SimulatedHost {
    fn post_permission_granted(&self) -> bool {
        self.access.lock().post
    }

    fn listener_access_granted(&self) -> bool {
        self.access.lock().listener
    }

    fn request_access(&self) -> AccessOutcome {
        let mut access = self.access.lock();
        if !access.post {
            if !access.grant_on_request {
                return AccessOutcome::Denied;
            }
            access.post = true;
        }
        if !access.listener {
            if !access.grant_on_request {
                return AccessOutcome::SettingsOpened;
            }
            access.listener = true;
        }
        AccessOutcome::Granted
    }
}

impl AppCatalog for SimulatedHost {
    fn installed_apps(&self) -> Result<Vec<InstalledApp>, HostError> {
        Ok(self.apps.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl NotificationListener for Counting {
        fn on_notification_posted(&self, _event: &NotificationEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn post_dispatches_to_listener() {
        let host = SimulatedHost::new(34);
        let listener = Arc::new(Counting::default());
        host.subscribe(listener.clone()).unwrap();

        let event = host.post("com.a", Some("chat"), 1);
        assert_eq!(event.key.as_deref(), Some("0|com.a|1|chat"));
        assert_eq!(listener.0.load(Ordering::SeqCst), 1);

        host.unsubscribe();
        host.post("com.a", None, 2);
        assert_eq!(listener.0.load(Ordering::SeqCst), 1);
        assert_eq!(host.visible().len(), 2);
    }

    #[test]
    fn double_subscribe_is_rejected() {
        let host = SimulatedHost::new(34);
        host.subscribe(Arc::new(Counting::default())).unwrap();
        assert_eq!(
            host.subscribe(Arc::new(Counting::default())),
            Err(HostError::AlreadySubscribed)
        );
    }

    #[test]
    fn legacy_host_has_no_keys_or_listing() {
        let host = SimulatedHost::new(19);
        let event = host.post("com.a", None, 5);
        assert!(event.key.is_none());
        assert!(matches!(
            host.list_visible(),
            Err(HostError::Unsupported(_))
        ));
        assert!(matches!(
            host.cancel(&CancelTarget::Key("0|com.a|5|null".into())),
            Err(HostError::Unsupported(_))
        ));

        host.cancel(&event.cancel_target(&host.capabilities()))
            .unwrap();
        assert!(host.visible().is_empty());
    }

    #[test]
    fn key_and_triple_address_same_notification() {
        let host = SimulatedHost::new(30);
        let a = host.post("com.a", Some("t"), 1);
        host.post("com.a", Some("t"), 2);

        host.cancel(&CancelTarget::Legacy {
            app_id: "com.a".into(),
            tag: Some("t".into()),
            id: 2,
        })
        .unwrap();
        host.cancel(&CancelTarget::Key(a.key.unwrap())).unwrap();
        assert!(host.visible().is_empty());
        assert_eq!(host.cancellations().len(), 2);
    }

    #[test]
    fn injected_failures() {
        let host = SimulatedHost::new(30);
        let event = host.post("com.a", None, 1);
        let target = event.cancel_target(&host.capabilities());

        host.fail_next_cancels(1);
        assert!(matches!(
            host.cancel(&target),
            Err(HostError::CancelRejected(_))
        ));
        assert_eq!(host.visible().len(), 1);
        host.cancel(&target).unwrap();
        assert!(host.visible().is_empty());
    }

    #[test]
    fn tray_hash_tracks_visible_set() {
        let host = SimulatedHost::new(30);
        let empty = host.tray_hash();
        let event = host.post("com.a", None, 1);
        let one = host.tray_hash();
        assert_ne!(empty, one);
        host.cancel(&event.cancel_target(&host.capabilities()))
            .unwrap();
        assert_eq!(host.tray_hash(), empty);
    }

    #[test]
    fn access_requests() {
        let host = SimulatedHost::new(34);
        host.set_access(true, false, false);
        assert_eq!(host.request_access(), AccessOutcome::SettingsOpened);

        host.set_access(false, false, false);
        assert_eq!(host.request_access(), AccessOutcome::Denied);

        host.set_access(false, false, true);
        assert_eq!(host.request_access(), AccessOutcome::Granted);
        assert!(host.post_permission_granted() && host.listener_access_granted());
    }
}
