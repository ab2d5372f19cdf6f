/*!
# Runtime

Replays a [`Scenario`] against a simulated host: the filter is started, host
posts are dispatched to it, block/unblock steps go through the control surface
and the command bus, and expectations are checked along the way. The service is
stopped whether or not the steps succeed.
*/

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use opentelemetry::KeyValue;
use tracing::{info, instrument, warn};

use hushlist_config::HushlistConfig;
use hushlist_core::channel::{CommandBus, Delivery};
use hushlist_core::host::NotificationHost;
use hushlist_simulator::{Scenario, SimulatedHost, Step};
use hushlist_telemetry::{EventLogger, MetricsRecorder};

use crate::control::ControlSurface;
use crate::error::{ControlError, EngineError, ServiceError};
use crate::service::FilterService;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub steps: usize,
    /// Hex BLAKE3 digest of the visible tray after the last step.
    pub tray_hash: String,
    pub visible: Vec<String>,
    pub blocked: Vec<String>,
    pub suppressed: u64,
    pub suppression_failures: u64,
    /// Commands the transport dropped.
    pub dropped: usize,
    /// Requests the control surface refused.
    pub rejected: usize,
}

struct Session<'a> {
    host: &'a SimulatedHost,
    service: &'a FilterService,
    control: &'a ControlSurface,
    bus: &'a CommandBus,
    queued: u64,
    dropped: usize,
    rejected: usize,
}

impl Session<'_> {
    async fn run(&mut self, steps: &[Step]) -> Result<(), EngineError> {
        for (idx, step) in steps.iter().enumerate() {
            match step {
                Step::Post(post) => {
                    self.host.post(&post.app, post.tag.as_deref(), post.id);
                }
                Step::Block(app) => {
                    let result = self.control.request_block(app);
                    self.track(result).await?;
                }
                Step::Unblock(app) => {
                    let result = self.control.request_unblock(app);
                    self.track(result).await?;
                }
                Step::RawFrame(frame) => {
                    let delivery = self.bus.sender().send_frame(Bytes::from(frame.clone()));
                    self.track(Ok(delivery)).await?;
                }
                Step::FailCancels(count) => self.host.fail_next_cancels(*count),
                Step::ExpectVisible(expected) => {
                    check(idx, expected, self.host.visible_apps())?;
                }
                Step::ExpectBlocked(expected) => {
                    check(idx, expected, self.service.blocked_apps())?;
                }
            }
        }
        Ok(())
    }

    /// Waits for queued commands to be applied so later steps observe them.
    async fn track(&mut self, result: Result<Delivery, ControlError>) -> Result<(), EngineError> {
        match result {
            Ok(Delivery::Queued) => {
                self.queued += 1;
                self.service.settle(self.queued, SETTLE_TIMEOUT).await?;
            }
            Ok(Delivery::Dropped) => self.dropped += 1,
            Err(e) => {
                warn!(error = %e, "Control surface refused request");
                self.rejected += 1;
            }
        }
        Ok(())
    }
}

fn check(step: usize, expected: &[String], actual: Vec<String>) -> Result<(), EngineError> {
    let mut expected = expected.to_vec();
    expected.sort();
    if expected == actual {
        Ok(())
    } else {
        Err(EngineError::Expectation {
            step,
            expected,
            actual,
        })
    }
}

/// A step failure takes precedence over a teardown failure, which is only
/// logged in that case.
fn finish(
    outcome: Result<(), EngineError>,
    stopped: Result<(), ServiceError>,
) -> Result<(), EngineError> {
    match (outcome, stopped) {
        (Err(step), Err(teardown)) => {
            warn!(error = %teardown, "Filter teardown failed after a step error");
            Err(step)
        }
        (Err(step), Ok(())) => Err(step),
        (Ok(()), stopped) => Ok(stopped?),
    }
}

/// Replays `scenario` and returns the final tray state. With `validate_hash`,
/// a different final tray hash is an error.
#[instrument(level = "info", name = "replay_scenario", skip_all)]
pub async fn replay_scenario(
    scenario: &Scenario,
    config: &HushlistConfig,
    metrics: Arc<MetricsRecorder>,
    validate_hash: Option<&str>,
) -> Result<ReplayReport, EngineError> {
    let host = Arc::new(scenario.build_host(config.host.api_level));
    let bus = CommandBus::new(config.channel.action.clone(), config.channel.capacity);
    let service = FilterService::new(host.clone(), bus.clone(), metrics.clone());
    let control = ControlSurface::new(bus.sender(), host.clone());

    info!(
        steps = scenario.steps.len(),
        capabilities = ?host.capabilities(),
        "Replaying scenario"
    );

    service.start()?;
    let mut session = Session {
        host: &host,
        service: &service,
        control: &control,
        bus: &bus,
        queued: 0,
        dropped: 0,
        rejected: 0,
    };
    let outcome = session.run(&scenario.steps).await;
    let (dropped, rejected) = (session.dropped, session.rejected);

    // Snapshot before stopping: teardown resets the block-list.
    let blocked = service.blocked_apps();
    let stopped = service.stop().await;
    finish(outcome, stopped)?;

    let report = ReplayReport {
        steps: scenario.steps.len(),
        tray_hash: host.tray_hash(),
        visible: host.visible_apps(),
        blocked,
        suppressed: metrics.suppressed.get(),
        suppression_failures: metrics.suppression_failures.get(),
        dropped,
        rejected,
    };

    EventLogger::log_event(
        "replay_complete",
        vec![
            KeyValue::new("steps", report.steps as i64),
            KeyValue::new("suppressed", report.suppressed as i64),
            KeyValue::new("tray_hash", report.tray_hash.clone()),
        ],
    )
    .await;

    if let Some(expected) = validate_hash {
        if expected != report.tray_hash {
            return Err(EngineError::HashMismatch {
                expected: expected.to_owned(),
                actual: report.tray_hash,
            });
        }
    }

    Ok(report)
}
