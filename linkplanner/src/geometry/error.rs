//! Validation errors for link geometry.

use thiserror::Error;

/// Errors raised for degenerate link geometry input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A profile needs at least two samples to define a link.
    #[error("Profile has {0} sample(s); at least 2 are required")]
    TooFewSamples(usize),

    /// Sample spacing must be finite and positive.
    #[error("Invalid sample spacing: {0} m")]
    InvalidSpacing(f64),

    /// Frequency must be finite and positive.
    #[error("Invalid frequency: {0} GHz")]
    InvalidFrequency(f64),

    /// Fresnel zone order must be at least 1.
    #[error("Invalid Fresnel zone order: {0}")]
    InvalidZone(u32),

    /// Radio heights and elevation samples must be finite.
    #[error("Non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
