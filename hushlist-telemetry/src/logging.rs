//! ## hushlist-telemetry::logging
//! **Structured logging with tracing and OpenTelemetry attributes**

use hushlist_config::TelemetryConfig;
use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `RUST_LOG` takes precedence over the
    /// configured level. Returns `false` when a subscriber was already set.
    pub fn init(config: &TelemetryConfig) -> bool {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase()));

        let builder = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE);

        if config.json {
            builder.json().try_init().is_ok()
        } else {
            builder.try_init().is_ok()
        }
    }

    /// Emits one service event with its attributes.
    #[inline]
    pub fn record(event_type: &str, metadata: &[KeyValue]) {
        let span = info_span!(
            "service_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );
        span.in_scope(|| {
            tracing::info!(metadata = ?metadata, "Service event occurred");
        });
    }

    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "service_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );

        async {
            tracing::info!(metadata = ?metadata, "Service event occurred");
        }
        .instrument(span)
        .await
    }
}
