//! # Notify Error Types

use thiserror::Error;

/// Result type alias for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Failures while publishing or delivering an event.
///
/// None of these are ever surfaced to an HTTP caller: the API logs them at
/// `warn` and carries on.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The fan-out channel has been shut down.
    #[error("Notification channel closed")]
    ChannelClosed,

    /// An event could not be encoded for the wire.
    #[error("Failed to encode notification: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing to a WebSocket client failed.
    #[error("Transport error: {0}")]
    Transport(String),
}
