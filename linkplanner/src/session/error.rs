//! Session errors.

use thiserror::Error;

use crate::coord::CoordError;
use crate::geometry::GeometryError;
use crate::protocol::ProtocolError;

/// Errors returned synchronously by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("Invalid area of interest [{start}, {end}]; need 0 <= start < end <= 1")]
    InvalidAoi { start: f64, end: f64 },

    #[error("No link has been requested yet")]
    NoActiveLink,

    #[error("Failed to encode request: {0}")]
    Protocol(#[from] ProtocolError),
}
