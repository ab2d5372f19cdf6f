use thiserror::Error;

/// Failures decoding a command frame.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command frame is not valid JSON: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Command is missing a package name")]
    MissingIdentifier,
}

/// Local failures before a command reaches the transport.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors reported at the host boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("Host does not support {0}")]
    Unsupported(&'static str),

    #[error("Host rejected cancellation: {0}")]
    CancelRejected(String),

    #[error("A listener is already subscribed")]
    AlreadySubscribed,

    #[error("Host call failed: {0}")]
    Failed(String),
}
