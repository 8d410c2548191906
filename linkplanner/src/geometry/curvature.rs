//! Earth-curvature adjusted line of sight.
//!
//! The link is modelled in polar coordinates around the Earth's center. The
//! transmitter sits at angle 0 and radius `R + tx`, the receiver at angle
//! `θ_end = (n - 1) · spacing / R` and radius `R + rx`. The straight chord
//! between them is projected radially back onto every sample angle, which
//! gives the height of the RF path above the curved ground:
//!
//! ```text
//! h(i) = b / (sin θ - m cos θ) - R,   θ = i · spacing / R
//! ```
//!
//! where `m` and `b` are the slope and intercept of the chord in Cartesian
//! projection.

use crate::coord::EARTH_RADIUS_M;

/// Chord slopes closer to vertical than this use the vertical-line limit.
const VERTICAL_CHORD_EPSILON: f64 = 1e-12;

/// Computes the line-of-sight height at every sample index.
///
/// `tx_height_m` and `rx_height_m` are absolute heights (above sea level) of
/// the two radios. Index 0 equals `tx_height_m` and the last index equals
/// `rx_height_m` exactly.
///
/// Callers validate `len >= 2` and a positive spacing.
pub(crate) fn line_of_sight(tx_height_m: f64, rx_height_m: f64, len: usize, spacing_m: f64) -> Vec<f64> {
    let r1 = EARTH_RADIUS_M + tx_height_m;
    let r2 = EARTH_RADIUS_M + rx_height_m;
    let theta_end = (len - 1) as f64 * spacing_m / EARTH_RADIUS_M;

    let (x1, y1) = (r1, 0.0);
    let (x2, y2) = (r2 * theta_end.cos(), r2 * theta_end.sin());

    let mut los: Vec<f64> = if (x2 - x1).abs() < VERTICAL_CHORD_EPSILON {
        (0..len)
            .map(|i| {
                let theta = i as f64 * spacing_m / EARTH_RADIUS_M;
                x1 / theta.cos() - EARTH_RADIUS_M
            })
            .collect()
    } else {
        let m = (y2 - y1) / (x2 - x1);
        let b = y2 - m * x2;
        (0..len)
            .map(|i| {
                let theta = i as f64 * spacing_m / EARTH_RADIUS_M;
                b / (theta.sin() - m * theta.cos()) - EARTH_RADIUS_M
            })
            .collect()
    };

    // The chord passes through both radios; pin them against rounding.
    los[0] = tx_height_m;
    los[len - 1] = rx_height_m;
    los
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_match_radio_heights() {
        let los = line_of_sight(110.0, 140.0, 11, 500.0);
        assert_eq!(los.len(), 11);
        assert_eq!(los[0], 110.0);
        assert_eq!(los[10], 140.0);
    }

    #[test]
    fn test_equal_heights_dip_at_midpoint() {
        let los = line_of_sight(110.0, 110.0, 5, 250.0);
        let mid = los[2];
        assert!(mid < 110.0, "midpoint should dip below the endpoints");

        // Sagitta of a 1 km chord: d^2 / (8R)
        let expected_dip = 1000.0_f64.powi(2) / (8.0 * EARTH_RADIUS_M);
        assert!(((110.0 - mid) - expected_dip).abs() < 1e-4);
    }

    #[test]
    fn test_longer_spacing_dips_more() {
        let short = line_of_sight(110.0, 110.0, 5, 250.0);
        let long = line_of_sight(110.0, 110.0, 5, 2500.0);
        assert!(long[2] < short[2]);
    }

    #[test]
    fn test_two_sample_profile() {
        let los = line_of_sight(50.0, 75.0, 2, 1000.0);
        assert_eq!(los, vec![50.0, 75.0]);
    }

    #[test]
    fn test_equal_heights_end_exactly() {
        let los = line_of_sight(110.0, 110.0, 5, 250.0);
        assert_eq!(los[0], 110.0);
        assert_eq!(los[4], 110.0);
        assert!(los[1..4].iter().all(|h| *h < 110.0));
    }
}
