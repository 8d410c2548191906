//! Link profile geometry
//!
//! Pure functions that turn an elevation profile and two radio heights into an
//! Earth-curvature adjusted line of sight and its Fresnel zone envelope.
//!
//! # Example
//!
//! ```
//! use linkplanner::geometry::{compute_link_profile, ElevationProfile, LinkParameters};
//!
//! let terrain = ElevationProfile::new(vec![100.0; 5], 250.0).unwrap();
//! let params = LinkParameters::new(10.0, 10.0, 5.0);
//! let profile = compute_link_profile(&terrain, &params).unwrap();
//!
//! assert_eq!(profile.line_of_sight().len(), 5);
//! assert_eq!(profile.fresnel().points()[0].lower, profile.fresnel().points()[0].upper);
//! ```
//!
//! All arithmetic is `f64` with no shortcuts, so recomputing with the same
//! inputs yields bit-identical output.

mod curvature;
mod error;
mod fresnel;

pub use error::GeometryError;
pub use fresnel::{wavelength_m, FresnelEnvelope, FresnelPoint, SPEED_OF_LIGHT_M_S};

use serde::Serialize;

/// Default Fresnel zone order.
pub const DEFAULT_FRESNEL_ZONE: u32 = 1;

/// Terrain elevation sampled at a fixed spacing along the link.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationProfile {
    samples: Vec<f64>,
    spacing_m: f64,
}

impl ElevationProfile {
    /// Creates a profile, rejecting fewer than two samples or a bad spacing.
    pub fn new(samples: Vec<f64>, spacing_m: f64) -> Result<Self, GeometryError> {
        if samples.len() < 2 {
            return Err(GeometryError::TooFewSamples(samples.len()));
        }
        if !spacing_m.is_finite() || spacing_m <= 0.0 {
            return Err(GeometryError::InvalidSpacing(spacing_m));
        }
        if let Some(&bad) = samples.iter().find(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite {
                what: "elevation sample",
                value: bad,
            });
        }
        Ok(Self { samples, spacing_m })
    }

    /// Creates a profile whose samples span `total_distance_m` end to end.
    pub fn spanning(samples: Vec<f64>, total_distance_m: f64) -> Result<Self, GeometryError> {
        if samples.len() < 2 {
            return Err(GeometryError::TooFewSamples(samples.len()));
        }
        let spacing = total_distance_m / (samples.len() - 1) as f64;
        Self::new(samples, spacing)
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn spacing_m(&self) -> f64 {
        self.spacing_m
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; a valid profile has at least two samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Distance from the first to the last sample.
    pub fn total_distance_m(&self) -> f64 {
        (self.samples.len() - 1) as f64 * self.spacing_m
    }

    /// Elevation under the transmitter.
    pub fn first(&self) -> f64 {
        self.samples[0]
    }

    /// Elevation under the receiver.
    pub fn last(&self) -> f64 {
        self.samples[self.samples.len() - 1]
    }
}

/// Radio and RF parameters for a link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkParameters {
    /// Transmitter height above the first terrain sample (m).
    pub tx_height_m: f64,
    /// Receiver height above the last terrain sample (m).
    pub rx_height_m: f64,
    /// Center frequency (GHz).
    pub frequency_ghz: f64,
    /// Fresnel zone order (1 = first zone).
    pub fresnel_zone: u32,
}

impl LinkParameters {
    /// Creates parameters for the first Fresnel zone.
    pub fn new(tx_height_m: f64, rx_height_m: f64, frequency_ghz: f64) -> Self {
        Self {
            tx_height_m,
            rx_height_m,
            frequency_ghz,
            fresnel_zone: DEFAULT_FRESNEL_ZONE,
        }
    }

    /// Sets the Fresnel zone order.
    pub fn with_zone(mut self, zone: u32) -> Self {
        self.fresnel_zone = zone;
        self
    }

    /// Checks every field without touching a profile.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.frequency_ghz.is_finite() || self.frequency_ghz <= 0.0 {
            return Err(GeometryError::InvalidFrequency(self.frequency_ghz));
        }
        if self.fresnel_zone == 0 {
            return Err(GeometryError::InvalidZone(self.fresnel_zone));
        }
        if !self.tx_height_m.is_finite() {
            return Err(GeometryError::NonFinite {
                what: "transmitter height",
                value: self.tx_height_m,
            });
        }
        if !self.rx_height_m.is_finite() {
            return Err(GeometryError::NonFinite {
                what: "receiver height",
                value: self.rx_height_m,
            });
        }
        Ok(())
    }
}

/// Line of sight and Fresnel envelope for one link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkProfile {
    line_of_sight: Vec<f64>,
    fresnel: FresnelEnvelope,
    spacing_m: f64,
    terrain: Vec<f64>,
}

impl LinkProfile {
    /// Absolute height of the RF path at each sample.
    pub fn line_of_sight(&self) -> &[f64] {
        &self.line_of_sight
    }

    pub fn fresnel(&self) -> &FresnelEnvelope {
        &self.fresnel
    }

    pub fn spacing_m(&self) -> f64 {
        self.spacing_m
    }

    /// Widest full Fresnel zone width along the link.
    pub fn max_fresnel_width(&self) -> f64 {
        self.fresnel.max_width()
    }

    /// Clearance of the Fresnel lower bound above terrain at each sample.
    ///
    /// Negative values mean terrain intrudes into the zone.
    pub fn clearance(&self) -> Vec<f64> {
        self.fresnel
            .points()
            .iter()
            .zip(&self.terrain)
            .map(|(p, ground)| p.lower - ground)
            .collect()
    }
}

/// Computes the curvature-adjusted line of sight and Fresnel envelope.
///
/// The radio heights in `params` are relative to the first and last terrain
/// samples; the returned heights are absolute.
pub fn compute_link_profile(
    terrain: &ElevationProfile,
    params: &LinkParameters,
) -> Result<LinkProfile, GeometryError> {
    params.validate()?;

    let len = terrain.len();
    let spacing = terrain.spacing_m();
    let tx_abs = params.tx_height_m + terrain.first();
    let rx_abs = params.rx_height_m + terrain.last();

    let los = curvature::line_of_sight(tx_abs, rx_abs, len, spacing);
    let widths = fresnel::half_widths(len, spacing, params.frequency_ghz, params.fresnel_zone);

    let points = los
        .iter()
        .zip(&widths)
        .enumerate()
        .map(|(i, (h, w))| FresnelPoint {
            distance: i as f64 * spacing,
            lower: h - w,
            upper: h + w,
        })
        .collect();

    Ok(LinkProfile {
        line_of_sight: los,
        fresnel: FresnelEnvelope::new(points),
        spacing_m: spacing,
        terrain: terrain.samples().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn flat_terrain() -> ElevationProfile {
        ElevationProfile::new(vec![100.0; 5], 250.0).unwrap()
    }

    #[test]
    fn test_single_sample_rejected() {
        let result = ElevationProfile::new(vec![100.0], 10.0);
        assert_eq!(result, Err(GeometryError::TooFewSamples(1)));
    }

    #[test]
    fn test_empty_profile_rejected() {
        assert!(matches!(
            ElevationProfile::spanning(vec![], 100.0),
            Err(GeometryError::TooFewSamples(0))
        ));
    }

    #[test]
    fn test_invalid_spacing_rejected() {
        assert!(matches!(
            ElevationProfile::new(vec![1.0, 2.0], 0.0),
            Err(GeometryError::InvalidSpacing(_))
        ));
        assert!(matches!(
            ElevationProfile::new(vec![1.0, 2.0], f64::NAN),
            Err(GeometryError::InvalidSpacing(_))
        ));
    }

    #[test]
    fn test_spanning_divides_by_intervals() {
        let p = ElevationProfile::spanning(vec![0.0; 11], 1000.0).unwrap();
        assert_eq!(p.spacing_m(), 100.0);
        assert_eq!(p.total_distance_m(), 1000.0);
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let params = LinkParameters::new(10.0, 10.0, 0.0);
        let result = compute_link_profile(&flat_terrain(), &params);
        assert_eq!(result, Err(GeometryError::InvalidFrequency(0.0)));
    }

    #[test]
    fn test_negative_frequency_rejected() {
        let params = LinkParameters::new(10.0, 10.0, -2.4);
        assert!(compute_link_profile(&flat_terrain(), &params).is_err());
    }

    #[test]
    fn test_zone_zero_rejected() {
        let params = LinkParameters::new(10.0, 10.0, 5.0).with_zone(0);
        assert_eq!(
            compute_link_profile(&flat_terrain(), &params),
            Err(GeometryError::InvalidZone(0))
        );
    }

    /// Five flat samples 250 m apart, 10 m masts, 5 GHz.
    #[test]
    fn test_flat_five_sample_scenario() {
        let params = LinkParameters::new(10.0, 10.0, 5.0);
        let profile = compute_link_profile(&flat_terrain(), &params).unwrap();
        let los = profile.line_of_sight();

        assert!((los[0] - 110.0).abs() < 1e-6);
        assert!((los[4] - 110.0).abs() < 1e-6);
        assert!(los[2] < los[1] && los[2] < los[3], "curve dips at midpoint");
        assert!(los[2] > 109.9, "dip over 1 km is a couple of centimeters");

        let widths: Vec<f64> = profile.fresnel().points().iter().map(|p| p.width()).collect();
        let max = widths.iter().cloned().fold(0.0, f64::max);
        assert_eq!(widths[2], max);

        let again = compute_link_profile(&flat_terrain(), &params).unwrap();
        assert_eq!(profile, again, "recomputation must be deterministic");
    }

    #[test]
    fn test_fresnel_distances_follow_spacing() {
        let params = LinkParameters::new(10.0, 10.0, 5.0);
        let profile = compute_link_profile(&flat_terrain(), &params).unwrap();
        assert_eq!(
            profile.fresnel().distances(),
            vec![0.0, 250.0, 500.0, 750.0, 1000.0]
        );
    }

    #[test]
    fn test_clearance_negative_under_hill() {
        let terrain = ElevationProfile::new(vec![100.0, 100.0, 140.0, 100.0, 100.0], 250.0).unwrap();
        let params = LinkParameters::new(10.0, 10.0, 5.0);
        let profile = compute_link_profile(&terrain, &params).unwrap();
        let clearance = profile.clearance();
        assert!(clearance[2] < 0.0);
        assert!(clearance[1] > 0.0);
    }

    proptest! {
        /// The line of sight starts and ends at the absolute radio heights.
        #[test]
        fn prop_boundary_exactness(
            samples in prop::collection::vec(0.0f64..3000.0, 2..64),
            spacing in 1.0f64..500.0,
            tx in 0.0f64..200.0,
            rx in 0.0f64..200.0,
            freq in 0.5f64..80.0,
        ) {
            let terrain = ElevationProfile::new(samples.clone(), spacing).unwrap();
            let profile = compute_link_profile(&terrain, &LinkParameters::new(tx, rx, freq)).unwrap();
            let los = profile.line_of_sight();
            let last = los.len() - 1;
            prop_assert_eq!(los[0], tx + samples[0]);
            prop_assert_eq!(los[last], rx + samples[last]);
        }

        /// The Fresnel envelope has zero width at both ends.
        #[test]
        fn prop_fresnel_pinches(
            len in 2usize..64,
            spacing in 1.0f64..500.0,
            freq in 0.5f64..80.0,
        ) {
            let terrain = ElevationProfile::new(vec![50.0; len], spacing).unwrap();
            let profile = compute_link_profile(&terrain, &LinkParameters::new(5.0, 5.0, freq)).unwrap();
            let points = profile.fresnel().points();
            prop_assert_eq!(points[0].width(), 0.0);
            prop_assert_eq!(points[len - 1].width(), 0.0);
        }
    }
}
