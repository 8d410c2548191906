//! Transport errors.

use thiserror::Error;

/// Failures of the underlying duplex connection.
///
/// These never reach callers of the channel; the background task logs them
/// and reconnects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connect failed: {0}")]
    Connect(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Receive(String),

    #[error("Connection closed")]
    Closed,
}
