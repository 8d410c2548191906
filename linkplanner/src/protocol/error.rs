//! Wire protocol errors.

use thiserror::Error;

/// Errors raised while encoding or decoding channel frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame is not valid JSON, or a field has the wrong type.
    #[error("Malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame is valid JSON but not an object.
    #[error("Frame is not a JSON object")]
    NotAnObject,

    /// Object matches none of the known message families.
    #[error("Unrecognized message shape (keys: {0})")]
    UnknownShape(String),
}
