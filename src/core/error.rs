use thiserror::Error;

use super::contacts::model::Channel;

/// Errors surfaced to whoever wires the monitoring core together.
///
/// Classification and dispatch never return these; they only come from
/// startup, configuration and sample decoding.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed sample: {0}")]
    Json(#[from] serde_json::Error),

    #[error("a global alert bus is already installed")]
    AlreadyInstalled,

    #[error("no tokio runtime available for contact fan-out")]
    NoRuntime,
}

pub type Result<T> = std::result::Result<T, MonitorError>;

/// Failure of a single contact/channel send.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("{channel} transport unavailable: {reason}")]
    Unavailable { channel: Channel, reason: String },

    #[error("{channel} message to {phone} rejected: {reason}")]
    Rejected {
        channel: Channel,
        phone: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("notification permission request failed: {0}")]
    Request(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("local notification rejected: {0}")]
    Rejected(String),
}
