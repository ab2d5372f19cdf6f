//! ## hushlist-telemetry::metrics
//! **Prometheus counters for the filter**

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub notifications: IntCounter,
    pub suppressed: IntCounter,
    pub suppression_failures: IntCounter,
    pub commands: IntCounter,
    pub commands_malformed: IntCounter,
    pub blocked_apps: IntGauge,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let notifications = IntCounter::new(
            "hushlist_notifications_total",
            "Notification-posted events seen while active",
        )?;
        let suppressed = IntCounter::new(
            "hushlist_suppressed_total",
            "Notifications cancelled because their app is blocked",
        )?;
        let suppression_failures = IntCounter::new(
            "hushlist_suppression_failures_total",
            "Cancellations rejected by the host",
        )?;
        let commands = IntCounter::new("hushlist_commands_total", "Commands applied")?;
        let commands_malformed = IntCounter::new(
            "hushlist_commands_malformed_total",
            "Command frames discarded as malformed",
        )?;
        let blocked_apps = IntGauge::new("hushlist_blocked_apps", "Apps currently blocked")?;

        registry.register(Box::new(notifications.clone()))?;
        registry.register(Box::new(suppressed.clone()))?;
        registry.register(Box::new(suppression_failures.clone()))?;
        registry.register(Box::new(commands.clone()))?;
        registry.register(Box::new(commands_malformed.clone()))?;
        registry.register(Box::new(blocked_apps.clone()))?;

        Ok(Self {
            registry,
            notifications,
            suppressed,
            suppression_failures,
            commands,
            commands_malformed,
            blocked_apps,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
