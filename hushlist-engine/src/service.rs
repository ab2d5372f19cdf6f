//! Notification filtering service.
//!
//! Lifecycle is `Inactive -> Active -> Inactive`. While active the filter is
//! subscribed to the host as its notification listener and a single command
//! worker applies frames from the command bus in arrival order. Host callbacks
//! and the worker share the block-list; neither path ever aborts on a bad
//! command or a rejected cancellation.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::KeyValue;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, instrument, trace, warn, Instrument};

use hushlist_core::blocklist::BlockList;
use hushlist_core::channel::{CommandBus, CommandSender};
use hushlist_core::command::{Command, Decoded, Intent};
use hushlist_core::events::NotificationEvent;
use hushlist_core::host::{HostCapabilities, NotificationHost, NotificationListener};
use hushlist_telemetry::{EventLogger, MetricsRecorder};

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Inactive,
    Active,
}

enum Lifecycle {
    Inactive,
    Active { worker: JoinHandle<()> },
}

/// Postings remembered after a cancel claim.
const RECENT_CAPACITY: usize = 4096;

/// Bounded record of recently claimed postings. A notification reachable from
/// both a block sweep and its own posted callback is cancelled by whichever
/// path claims it first.
#[derive(Debug, Default)]
struct RecentSuppressions {
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl RecentSuppressions {
    fn claim(&mut self, posting: &str) -> bool {
        if !self.seen.insert(posting.to_owned()) {
            return false;
        }
        self.order.push_back(posting.to_owned());
        if self.order.len() > RECENT_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }

    fn release(&mut self, posting: &str) {
        if self.seen.remove(posting) {
            self.order.retain(|p| p != posting);
        }
    }
}

/// State shared between host callbacks and the command worker.
struct Filter {
    host: Arc<dyn NotificationHost>,
    blocklist: BlockList,
    action: String,
    metrics: Arc<MetricsRecorder>,
    active: AtomicBool,
    recent: Mutex<RecentSuppressions>,
    frames_handled: watch::Sender<u64>,
}

impl Filter {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn handle_frame(&self, frame: &[u8]) {
        if !self.is_active() {
            debug!("Service inactive, command frame discarded");
        } else {
            match Command::decode(&self.action, frame) {
                Ok(Decoded::Command(command)) => self.apply(&command),
                Ok(Decoded::Foreign) => trace!("Ignoring frame for another action"),
                Err(e) => {
                    warn!(error = %e, "Discarding undecodable command frame");
                    self.metrics.commands_malformed.inc();
                }
            }
        }
        self.frames_handled.send_modify(|handled| *handled += 1);
    }

    fn apply(&self, command: &Command) {
        let app_id = match command.target() {
            Ok(app_id) => app_id,
            Err(e) => {
                warn!(intent = command.intent.as_str(), error = %e, "Discarding malformed command");
                self.metrics.commands_malformed.inc();
                return;
            }
        };

        debug!(app_id, intent = command.intent.as_str(), "Applying command");
        self.metrics.commands.inc();
        match command.intent {
            Intent::Block => {
                self.block(app_id);
            }
            Intent::Unblock => {
                self.unblock(app_id);
            }
        }
    }

    /// Blocks `app_id` and sweeps its visible notifications. Returns how many
    /// were suppressed by the sweep.
    fn block(&self, app_id: &str) -> usize {
        let inserted = self.blocklist.add(app_id);
        self.metrics.blocked_apps.set(self.blocklist.len() as i64);
        info!(
            app_id,
            inserted,
            blocked = ?self.blocklist.snapshot(),
            "Added to blocked apps"
        );
        self.sweep(app_id)
    }

    /// Already suppressed notifications stay suppressed.
    fn unblock(&self, app_id: &str) -> bool {
        let removed = self.blocklist.remove(app_id);
        self.metrics.blocked_apps.set(self.blocklist.len() as i64);
        info!(
            app_id,
            removed,
            blocked = ?self.blocklist.snapshot(),
            "Removed from blocked apps"
        );
        removed
    }

    fn sweep(&self, app_id: &str) -> usize {
        let caps = self.host.capabilities();
        if !caps.enumerate_visible {
            debug!(app_id, "Host cannot list visible notifications, sweep skipped");
            return 0;
        }

        let visible = match self.host.list_visible() {
            Ok(visible) => visible,
            Err(e) => {
                warn!(app_id, error = %e, "Listing visible notifications failed, sweep skipped");
                return 0;
            }
        };

        let swept = visible
            .iter()
            .filter(|event| event.app_id == app_id)
            .filter(|event| self.suppress(event, &caps))
            .count();
        debug!(app_id, swept, "Sweep complete");
        swept
    }

    /// Cancels one posting unless another path already claimed it.
    fn suppress(&self, event: &NotificationEvent, caps: &HostCapabilities) -> bool {
        let target = event.cancel_target(caps);
        let posting = format!("{}@{}", target, event.posted_at);
        if !self.recent.lock().claim(&posting) {
            trace!(app_id = %event.app_id, %target, "Notification already suppressed");
            return false;
        }

        match self.host.cancel(&target) {
            Ok(()) => {
                self.metrics.suppressed.inc();
                EventLogger::record(
                    "notification_suppressed",
                    &[
                        KeyValue::new("app_id", event.app_id.clone()),
                        KeyValue::new("target", target.to_string()),
                    ],
                );
                true
            }
            Err(e) => {
                self.recent.lock().release(&posting);
                warn!(app_id = %event.app_id, %target, error = %e, "Failed to cancel notification");
                self.metrics.suppression_failures.inc();
                false
            }
        }
    }
}

impl NotificationListener for Filter {
    fn on_notification_posted(&self, event: &NotificationEvent) {
        if !self.is_active() {
            return;
        }
        self.metrics.notifications.inc();
        if self.blocklist.contains(&event.app_id) {
            debug!(app_id = %event.app_id, "Blocking notification");
            self.suppress(event, &self.host.capabilities());
        }
    }
}

pub struct FilterService {
    filter: Arc<Filter>,
    bus: CommandBus,
    lifecycle: Mutex<Lifecycle>,
}

impl FilterService {
    pub fn new(
        host: Arc<dyn NotificationHost>,
        bus: CommandBus,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            filter: Arc::new(Filter {
                host,
                blocklist: BlockList::new(),
                action: bus.action().to_owned(),
                metrics,
                active: AtomicBool::new(false),
                recent: Mutex::new(RecentSuppressions::default()),
                frames_handled: watch::Sender::new(0),
            }),
            bus,
            lifecycle: Mutex::new(Lifecycle::Inactive),
        }
    }

    pub fn state(&self) -> ServiceState {
        match *self.lifecycle.lock() {
            Lifecycle::Inactive => ServiceState::Inactive,
            Lifecycle::Active { .. } => ServiceState::Active,
        }
    }

    /// Subscribes to the host and the command bus. Must run inside a tokio
    /// runtime, which hosts the command worker.
    #[instrument(level = "info", name = "filter_start", skip(self))]
    pub fn start(&self) -> Result<(), ServiceError> {
        let mut lifecycle = self.lifecycle.lock();
        if matches!(*lifecycle, Lifecycle::Active { .. }) {
            return Err(ServiceError::AlreadyActive);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ServiceError::NoRuntime)?;

        self.filter.active.store(true, Ordering::SeqCst);
        if let Err(e) = self.filter.host.subscribe(self.filter.clone()) {
            self.filter.active.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        let mut receiver = self.bus.register();
        let filter = self.filter.clone();
        let worker = runtime.spawn(
            async move {
                while let Some(frame) = receiver.recv().await {
                    filter.handle_frame(&frame);
                }
                debug!("Command receiver closed");
            }
            .instrument(info_span!("command_worker")),
        );

        *lifecycle = Lifecycle::Active { worker };
        info!("Notification filter active");
        Ok(())
    }

    /// Unsubscribes from the host and the bus, waits for the command worker and
    /// resets the block-list.
    #[instrument(level = "info", name = "filter_stop", skip(self))]
    pub async fn stop(&self) -> Result<(), ServiceError> {
        let worker = match std::mem::replace(&mut *self.lifecycle.lock(), Lifecycle::Inactive) {
            Lifecycle::Active { worker } => worker,
            Lifecycle::Inactive => return Err(ServiceError::NotActive),
        };

        self.filter.active.store(false, Ordering::SeqCst);
        self.filter.host.unsubscribe();
        self.bus.unregister();
        worker.await?;

        self.filter.blocklist.clear();
        self.filter.metrics.blocked_apps.set(0);
        info!("Notification filter inactive");
        Ok(())
    }

    /// Host callback entry point; also reachable through the listener the
    /// service subscribes on start.
    pub fn on_notification_posted(&self, event: &NotificationEvent) {
        self.filter.on_notification_posted(event);
    }

    /// Decodes and applies one command frame as the worker would.
    pub fn handle_frame(&self, frame: &[u8]) {
        self.filter.handle_frame(frame);
    }

    pub fn apply(&self, command: &Command) -> Result<(), ServiceError> {
        self.ensure_active()?;
        self.filter.apply(command);
        Ok(())
    }

    /// Blocks `app_id` and suppresses its visible notifications. Returns the
    /// number swept.
    pub fn block(&self, app_id: &str) -> Result<usize, ServiceError> {
        self.ensure_active()?;
        Ok(self.filter.block(app_id))
    }

    pub fn unblock(&self, app_id: &str) -> Result<bool, ServiceError> {
        self.ensure_active()?;
        Ok(self.filter.unblock(app_id))
    }

    pub fn is_blocked(&self, app_id: &str) -> bool {
        self.filter.blocklist.contains(app_id)
    }

    pub fn blocked_apps(&self) -> Vec<String> {
        self.filter.blocklist.snapshot()
    }

    /// Frames taken off the bus so far, whatever their outcome.
    pub fn frames_handled(&self) -> u64 {
        *self.filter.frames_handled.borrow()
    }

    /// Waits until at least `expected` frames have been handled.
    pub async fn settle(&self, expected: u64, timeout: Duration) -> Result<(), ServiceError> {
        let mut handled = self.filter.frames_handled.subscribe();
        let reached = tokio::time::timeout(timeout, async move {
            handled.wait_for(|n| *n >= expected).await.is_ok()
        })
        .await;
        match reached {
            Ok(true) => Ok(()),
            _ => Err(ServiceError::Stalled {
                handled: self.frames_handled(),
                expected,
            }),
        }
    }

    pub fn sender(&self) -> CommandSender {
        self.bus.sender()
    }

    fn ensure_active(&self) -> Result<(), ServiceError> {
        match self.state() {
            ServiceState::Active => Ok(()),
            ServiceState::Inactive => Err(ServiceError::NotActive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hushlist_core::command::DEFAULT_ACTION;
    use hushlist_core::error::HostError;
    use hushlist_core::events::CancelTarget;
    use hushlist_simulator::SimulatedHost;
    use parking_lot::RwLock;
    use proptest::prelude::*;
    use std::collections::{BTreeSet, HashSet};
    use std::thread;
    use tracing_test::traced_test;

    const SETTLE: Duration = Duration::from_secs(5);

    struct Fixture {
        host: Arc<SimulatedHost>,
        service: FilterService,
        metrics: Arc<MetricsRecorder>,
    }

    fn fixture(api_level: u32) -> Fixture {
        let host = Arc::new(SimulatedHost::new(api_level));
        let metrics = Arc::new(MetricsRecorder::new().unwrap());
        let bus = CommandBus::new(DEFAULT_ACTION, 256);
        let service = FilterService::new(host.clone(), bus, metrics.clone());
        Fixture {
            host,
            service,
            metrics,
        }
    }

    async fn send(fx: &Fixture, command: Command) {
        let before = fx.service.frames_handled();
        fx.service.sender().dispatch(&command).unwrap();
        fx.service.settle(before + 1, SETTLE).await.unwrap();
    }

    #[tokio::test]
    async fn block_unblock_scenario() {
        let fx = fixture(34);
        fx.service.start().unwrap();

        fx.host.post("com.a", None, 1);
        assert!(fx.host.cancellations().is_empty());

        send(&fx, Command::block("com.a")).await;
        assert!(fx.service.is_blocked("com.a"));
        // The first notification is swept on block.
        assert_eq!(fx.host.cancellations().len(), 1);

        let second = fx.host.post("com.a", None, 2);
        assert_eq!(
            fx.host.cancellations().last(),
            Some(&CancelTarget::Key(second.key.clone().unwrap()))
        );
        assert_eq!(fx.host.cancellations().len(), 2);

        send(&fx, Command::unblock("com.a")).await;
        assert!(!fx.service.is_blocked("com.a"));

        fx.host.post("com.a", None, 3);
        assert_eq!(fx.host.cancellations().len(), 2);
        assert_eq!(fx.host.visible_apps(), vec!["com.a".to_string()]);

        fx.service.stop().await.unwrap();
    }

    #[tokio::test]
    async fn suppresses_each_matching_event_once() {
        let fx = fixture(34);
        fx.service.start().unwrap();
        fx.service.block("com.a").unwrap();

        for id in 0..5 {
            fx.host.post("com.a", Some("chat"), id);
            fx.host.post("com.b", Some("chat"), id);
        }

        let cancelled = fx.host.cancellations();
        assert_eq!(cancelled.len(), 5);
        assert!(cancelled
            .iter()
            .all(|t| matches!(t, CancelTarget::Key(k) if k.contains("|com.a|"))));
        assert_eq!(fx.host.visible_apps().len(), 5);
        assert_eq!(fx.metrics.suppressed.get(), 5);
        assert_eq!(fx.metrics.notifications.get(), 10);
    }

    /// Delivers the posted callback for every visible notification while the
    /// sweep is listing them, as a host dispatching on another thread could.
    struct EchoingHost {
        inner: SimulatedHost,
        listener: RwLock<Option<Arc<dyn NotificationListener>>>,
    }

    impl NotificationHost for EchoingHost {
        fn capabilities(&self) -> HostCapabilities {
            self.inner.capabilities()
        }

        fn subscribe(&self, listener: Arc<dyn NotificationListener>) -> Result<(), HostError> {
            *self.listener.write() = Some(listener);
            Ok(())
        }

        fn unsubscribe(&self) {
            self.listener.write().take();
        }

        fn cancel(&self, target: &CancelTarget) -> Result<(), HostError> {
            self.inner.cancel(target)
        }

        fn list_visible(&self) -> Result<Vec<NotificationEvent>, HostError> {
            let visible = self.inner.list_visible()?;
            let listener = self.listener.read().clone();
            if let Some(listener) = listener {
                for event in &visible {
                    listener.on_notification_posted(event);
                }
            }
            Ok(visible)
        }
    }

    #[tokio::test]
    async fn callback_racing_the_sweep_cancels_once() {
        let host = Arc::new(EchoingHost {
            inner: SimulatedHost::new(34),
            listener: RwLock::new(None),
        });
        host.inner.post("com.a", None, 1);
        let metrics = Arc::new(MetricsRecorder::new().unwrap());
        let service = FilterService::new(
            host.clone(),
            CommandBus::new(DEFAULT_ACTION, 8),
            metrics.clone(),
        );
        service.start().unwrap();

        // The callback claimed the notification, so the sweep skips it.
        assert_eq!(service.block("com.a").unwrap(), 0);
        assert_eq!(
            host.inner.cancellations(),
            vec![CancelTarget::Key("0|com.a|1|null".into())]
        );
        assert_eq!(metrics.suppressed.get(), 1);

        // Reposting under the same key is a new notification.
        let repost = host.inner.post("com.a", None, 1);
        service.on_notification_posted(&repost);
        assert_eq!(host.inner.cancellations().len(), 2);
        assert!(host.inner.visible().is_empty());
        service.stop().await.unwrap();
    }

    #[tokio::test]
    async fn late_callback_after_sweep_is_ignored() {
        let fx = fixture(34);
        let event = fx.host.post("com.a", None, 1);
        fx.service.start().unwrap();

        assert_eq!(fx.service.block("com.a").unwrap(), 1);
        fx.service.on_notification_posted(&event);

        assert_eq!(fx.host.cancellations().len(), 1);
        assert_eq!(fx.metrics.suppressed.get(), 1);
        fx.service.stop().await.unwrap();
    }

    #[test]
    fn recent_suppressions_claim_release_and_evict() {
        let mut recent = RecentSuppressions::default();
        assert!(recent.claim("k@1"));
        assert!(!recent.claim("k@1"));
        recent.release("k@1");
        assert!(recent.claim("k@1"));

        for i in 0..RECENT_CAPACITY {
            assert!(recent.claim(&format!("other@{}", i)));
        }
        assert_eq!(recent.order.len(), RECENT_CAPACITY);
        // The oldest claim was evicted.
        assert!(recent.claim("k@1"));
    }

    #[tokio::test]
    async fn apply_requires_active_service() {
        let fx = fixture(34);
        assert!(matches!(
            fx.service.apply(&Command::block("com.a")),
            Err(ServiceError::NotActive)
        ));

        fx.service.start().unwrap();
        fx.service.apply(&Command::block("com.a")).unwrap();
        assert!(fx.service.is_blocked("com.a"));
        fx.service.apply(&Command::unblock("com.a")).unwrap();
        assert!(fx.service.blocked_apps().is_empty());
        assert_eq!(fx.metrics.commands.get(), 2);
        fx.service.stop().await.unwrap();
    }

    #[tokio::test]
    async fn settle_reports_stall() {
        let fx = fixture(34);
        fx.service.start().unwrap();
        assert!(matches!(
            fx.service.settle(1, Duration::from_millis(20)).await,
            Err(ServiceError::Stalled {
                handled: 0,
                expected: 1
            })
        ));
        fx.service.stop().await.unwrap();
    }

    #[tokio::test]
    async fn sweep_only_touches_the_blocked_app() {
        let fx = fixture(30);
        fx.host.post("com.a", None, 1);
        fx.host.post("com.a", Some("x"), 2);
        fx.host.post("com.b", None, 1);
        fx.host.post("com.c", None, 1);

        fx.service.start().unwrap();
        let swept = fx.service.block("com.a").unwrap();

        assert_eq!(swept, 2);
        assert_eq!(
            fx.host.visible_apps(),
            vec!["com.b".to_string(), "com.c".to_string()]
        );
    }

    #[tokio::test]
    async fn legacy_host_uses_triples_and_skips_sweep() {
        let fx = fixture(19);
        fx.host.post("com.a", None, 1);
        fx.service.start().unwrap();

        assert_eq!(fx.service.block("com.a").unwrap(), 0);
        assert_eq!(fx.host.visible_apps(), vec!["com.a".to_string()]);

        fx.host.post("com.a", Some("t"), 9);
        assert_eq!(
            fx.host.cancellations(),
            vec![CancelTarget::Legacy {
                app_id: "com.a".into(),
                tag: Some("t".into()),
                id: 9,
            }]
        );
    }

    #[tokio::test]
    async fn unblock_does_not_resurrect() {
        let fx = fixture(34);
        fx.service.start().unwrap();
        fx.service.block("com.a").unwrap();
        fx.host.post("com.a", None, 1);
        assert!(fx.host.visible().is_empty());

        fx.service.unblock("com.a").unwrap();
        assert!(fx.host.visible().is_empty());
        assert_eq!(fx.host.cancellations().len(), 1);
    }

    #[traced_test]
    #[tokio::test]
    async fn malformed_commands_leave_state_unchanged() {
        let fx = fixture(34);
        fx.service.start().unwrap();
        fx.service.block("com.keep").unwrap();

        send(
            &fx,
            Command {
                identifier: None,
                intent: Intent::Unblock,
            },
        )
        .await;
        send(&fx, Command::unblock("")).await;

        let before = fx.service.frames_handled();
        let sender = fx.service.sender();
        sender.send_frame("{not json".into());
        sender.send_frame(r#"{"action":"other.app.ACTION","packageName":"com.keep","block":false}"#.into());
        fx.service.settle(before + 2, SETTLE).await.unwrap();

        assert_eq!(fx.service.blocked_apps(), vec!["com.keep".to_string()]);
        assert_eq!(fx.metrics.commands_malformed.get(), 3);
        assert_eq!(fx.service.state(), ServiceState::Active);
        assert!(logs_contain("Discarding malformed command"));
        assert!(logs_contain("Discarding undecodable command frame"));
    }

    #[traced_test]
    #[tokio::test]
    async fn cancel_failure_does_not_stop_listener() {
        let fx = fixture(34);
        fx.service.start().unwrap();
        fx.service.block("com.a").unwrap();

        fx.host.fail_next_cancels(1);
        fx.host.post("com.a", None, 1);
        fx.host.post("com.a", None, 2);

        assert_eq!(fx.metrics.suppression_failures.get(), 1);
        assert_eq!(fx.metrics.suppressed.get(), 1);
        assert_eq!(fx.host.visible().len(), 1);
        assert!(logs_contain("Failed to cancel notification"));
    }

    #[tokio::test]
    async fn lifecycle_transitions() {
        let fx = fixture(34);
        assert_eq!(fx.service.state(), ServiceState::Inactive);
        assert!(matches!(
            fx.service.stop().await,
            Err(ServiceError::NotActive)
        ));
        assert!(matches!(
            fx.service.block("com.a"),
            Err(ServiceError::NotActive)
        ));

        fx.service.start().unwrap();
        assert!(fx.host.is_subscribed());
        assert!(matches!(
            fx.service.start(),
            Err(ServiceError::AlreadyActive)
        ));

        fx.service.block("com.a").unwrap();
        fx.service.stop().await.unwrap();
        assert_eq!(fx.service.state(), ServiceState::Inactive);
        assert!(!fx.host.is_subscribed());
        assert!(fx.service.blocked_apps().is_empty());

        // Events and commands while inactive have no effect.
        fx.host.post("com.a", None, 1);
        fx.service.handle_frame(&Command::block("com.a").encode(DEFAULT_ACTION).unwrap());
        assert!(fx.host.cancellations().is_empty());
        assert!(fx.service.blocked_apps().is_empty());

        fx.service.start().unwrap();
        send(&fx, Command::block("com.b")).await;
        assert_eq!(fx.service.blocked_apps(), vec!["com.b".to_string()]);
        fx.service.stop().await.unwrap();
    }

    #[test]
    fn start_requires_runtime() {
        let fx = fixture(34);
        assert!(matches!(fx.service.start(), Err(ServiceError::NoRuntime)));
        assert!(!fx.host.is_subscribed());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_events_and_commands() {
        let fx = fixture(34);
        fx.service.start().unwrap();
        fx.service.block("com.noisy").unwrap();

        let posters: Vec<_> = (0..4)
            .map(|t| {
                let host = fx.host.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        host.post("com.noisy", None, t * 1_000 + i);
                        host.post("com.quiet", None, t * 1_000 + i);
                    }
                })
            })
            .collect();

        let sender = fx.service.sender();
        for i in 0..50 {
            let app = format!("com.toggle{}", i % 5);
            sender.dispatch(&Command::block(app.clone())).unwrap();
            sender.dispatch(&Command::unblock(app)).unwrap();
        }

        for poster in posters {
            poster.join().unwrap();
        }
        fx.service.settle(100, SETTLE).await.unwrap();

        assert_eq!(fx.metrics.suppressed.get(), 1_000);
        assert_eq!(fx.service.blocked_apps(), vec!["com.noisy".to_string()]);
        assert!(fx
            .host
            .visible_apps()
            .iter()
            .all(|app| app == "com.quiet"));
        fx.service.stop().await.unwrap();
    }

    const APPS: [&str; 3] = ["com.a", "com.b", "com.c"];

    #[derive(Debug, Clone)]
    enum Op {
        Post(usize, i32),
        Block(usize),
        Unblock(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..APPS.len(), 0..4i32).prop_map(|(app, id)| Op::Post(app, id)),
            (0..APPS.len()).prop_map(Op::Block),
            (0..APPS.len()).prop_map(Op::Unblock),
        ]
    }

    proptest! {
        #[test]
        fn tray_follows_block_list_model(ops in proptest::collection::vec(op(), 1..48)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let guard = rt.enter();
            let fx = fixture(34);
            fx.service.start().unwrap();
            drop(guard);

            let mut blocked = HashSet::new();
            let mut visible = BTreeSet::new();
            let mut cancels = 0usize;
            for op in &ops {
                match *op {
                    Op::Post(app, id) => {
                        fx.host.post(APPS[app], None, id);
                        if blocked.contains(&app) {
                            cancels += 1;
                        } else {
                            visible.insert((app, id));
                        }
                    }
                    Op::Block(app) => {
                        fx.service.block(APPS[app]).unwrap();
                        blocked.insert(app);
                        let before = visible.len();
                        visible.retain(|(a, _)| *a != app);
                        cancels += before - visible.len();
                    }
                    Op::Unblock(app) => {
                        fx.service.unblock(APPS[app]).unwrap();
                        blocked.remove(&app);
                    }
                }
            }

            let mut expected_visible: Vec<String> =
                visible.iter().map(|(a, _)| APPS[*a].to_string()).collect();
            expected_visible.sort();
            let mut expected_blocked: Vec<String> =
                blocked.iter().map(|a| APPS[*a].to_string()).collect();
            expected_blocked.sort();

            prop_assert_eq!(fx.host.visible_apps(), expected_visible);
            prop_assert_eq!(fx.host.cancellations().len(), cancels);
            prop_assert_eq!(fx.metrics.suppressed.get(), cancels as u64);
            prop_assert_eq!(fx.service.blocked_apps(), expected_blocked);

            rt.block_on(fx.service.stop()).unwrap();
        }
    }
}
