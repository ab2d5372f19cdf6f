use thiserror::Error;
use tokio::task::JoinError;

use hushlist_config::ConfigError;
use hushlist_core::error::{ChannelError, HostError};
use hushlist_simulator::ScenarioError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Service is already active")]
    AlreadyActive,

    #[error("Service is not active")]
    NotActive,

    #[error("Service must be started inside a tokio runtime")]
    NoRuntime,

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Command worker failed: {0}")]
    Worker(#[from] JoinError),

    #[error("Command worker stalled: handled {handled} of {expected} frames")]
    Stalled { handled: u64, expected: u64 },
}

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("Package name is required")]
    MissingIdentifier,

    #[error("Notification listener access has not been granted")]
    ListenerAccessRequired,

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Step {step}: expected {expected:?}, found {actual:?}")]
    Expectation {
        step: usize,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Tray hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}
