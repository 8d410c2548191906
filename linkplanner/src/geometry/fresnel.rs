//! Fresnel zone envelope around the line of sight.

use serde::Serialize;

/// Speed of light in vacuum (m/s).
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Wavelength in meters for a frequency in GHz.
#[inline]
pub fn wavelength_m(frequency_ghz: f64) -> f64 {
    SPEED_OF_LIGHT_M_S / (frequency_ghz * 1e9)
}

/// Fresnel zone half-width at every sample index.
///
/// The width is zero at both ends and widest at the midpoint. Callers
/// validate `len >= 2`, a positive spacing and a positive frequency.
pub(crate) fn half_widths(len: usize, spacing_m: f64, frequency_ghz: f64, zone: u32) -> Vec<f64> {
    let wavelength = wavelength_m(frequency_ghz);
    let last = len - 1;
    let d_total = last as f64 * spacing_m;
    let n = zone as f64;

    (0..len)
        .map(|i| {
            let d1 = i as f64 * spacing_m;
            let d2 = (last - i) as f64 * spacing_m;
            (n * d1 * d2 * wavelength / d_total).sqrt()
        })
        .collect()
}

/// One sample of the Fresnel envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FresnelPoint {
    /// Distance from the transmitter in meters.
    pub distance: f64,
    /// Lower edge of the zone (absolute height, m).
    pub lower: f64,
    /// Upper edge of the zone (absolute height, m).
    pub upper: f64,
}

impl FresnelPoint {
    /// Full width of the zone at this sample.
    #[inline]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Fresnel zone envelope along a link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FresnelEnvelope {
    points: Vec<FresnelPoint>,
}

impl FresnelEnvelope {
    pub(crate) fn new(points: Vec<FresnelPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[FresnelPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sample distances (m).
    pub fn distances(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.distance).collect()
    }

    /// Lower bounds (m), in sample order.
    pub fn lower_bounds(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.lower).collect()
    }

    /// Widest full width of the envelope.
    pub fn max_width(&self) -> f64 {
        self.points.iter().map(FresnelPoint::width).fold(0.0, f64::max)
    }
}
