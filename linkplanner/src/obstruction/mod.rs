//! Obstruction interval detection
//!
//! Compares the Fresnel zone (or the bare line of sight) with an
//! independently sampled LiDAR surface and reports where the surface rises
//! above it.
//!
//! The LiDAR and link profiles are sampled at different distances and
//! resolutions, so one of them is resampled onto the other's axis first. Two
//! entry points exist, one per direction:
//!
//! | Function                    | Resampled | Axis of the output        |
//! |-----------------------------|-----------|---------------------------|
//! | [`obstructions_by_distance`]| Fresnel   | LiDAR distances (meters)  |
//! | [`obstructions_by_index`]   | LiDAR     | link sample index         |
//!
//! # Scan rule
//!
//! `diff[i] = link[i] - lidar[i]`. An interval opens at the first index where
//! `diff < 0` and closes at the first later index where `diff >= 0`. An
//! interval still open when the scan ends closes at the last index.

pub mod interpolate;

use serde::{Deserialize, Serialize};

use crate::geometry::{FresnelEnvelope, LinkProfile};

/// A stretch of the link where the surface intrudes.
///
/// `start` is where the intrusion begins and `end` the first sample where the
/// link is clear again, or the final sample if it never clears.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstructionInterval {
    pub start: f64,
    pub end: f64,
}

impl ObstructionInterval {
    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

/// One LiDAR surface sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LidarSample {
    /// Distance from the transmitter (m).
    pub distance: f64,
    /// Surface height above sea level (m).
    pub height: f64,
}

/// LiDAR surface heights along the link, ascending by distance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LidarProfile {
    samples: Vec<LidarSample>,
}

impl LidarProfile {
    pub fn new(samples: Vec<LidarSample>) -> Self {
        Self { samples }
    }

    /// Builds a profile from `[distance, height]` pairs as the backend sends them.
    pub fn from_pairs(pairs: &[[f64; 2]]) -> Self {
        Self {
            samples: pairs
                .iter()
                .map(|[distance, height]| LidarSample {
                    distance: *distance,
                    height: *height,
                })
                .collect(),
        }
    }

    pub fn samples(&self) -> &[LidarSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn distances(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.distance).collect()
    }

    pub fn heights(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.height).collect()
    }

    /// Highest surface point, if any.
    pub fn max_height(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.height).reduce(f64::max)
    }
}

/// Finds where the LiDAR surface intrudes into the Fresnel zone.
///
/// The Fresnel lower bound is resampled onto the LiDAR distances; intervals
/// are reported in those distances (meters).
pub fn obstructions_by_distance(
    fresnel: &FresnelEnvelope,
    lidar: &LidarProfile,
) -> Vec<ObstructionInterval> {
    if lidar.is_empty() || fresnel.is_empty() {
        return Vec::new();
    }
    let axis = lidar.distances();
    let lower = interpolate::linear(&axis, &fresnel.distances(), &fresnel.lower_bounds());
    let diff: Vec<f64> = lower
        .iter()
        .zip(lidar.samples())
        .map(|(link, surface)| link - surface.height)
        .collect();
    scan(&diff, |i| axis[i])
}

/// Finds where the LiDAR surface rises above the line of sight.
///
/// The LiDAR surface is resampled onto the link's sample distances
/// (`i · spacing`); intervals are reported as sample indices.
pub fn obstructions_by_index(
    line_of_sight: &[f64],
    spacing_m: f64,
    lidar: &LidarProfile,
) -> Vec<ObstructionInterval> {
    if lidar.is_empty() || line_of_sight.is_empty() {
        return Vec::new();
    }
    let axis: Vec<f64> = (0..line_of_sight.len())
        .map(|i| i as f64 * spacing_m)
        .collect();
    let surface = interpolate::linear(&axis, &lidar.distances(), &lidar.heights());
    let diff: Vec<f64> = line_of_sight
        .iter()
        .zip(&surface)
        .map(|(link, surface)| link - surface)
        .collect();
    scan(&diff, |i| i as f64)
}

/// Fresnel-zone obstructions for a computed link profile, in meters.
pub fn profile_obstructions(profile: &LinkProfile, lidar: &LidarProfile) -> Vec<ObstructionInterval> {
    obstructions_by_distance(profile.fresnel(), lidar)
}

fn scan(diff: &[f64], position: impl Fn(usize) -> f64) -> Vec<ObstructionInterval> {
    let mut intervals = Vec::new();
    let mut open: Option<usize> = None;
    let last = diff.len().saturating_sub(1);

    for (i, d) in diff.iter().enumerate() {
        if *d < 0.0 {
            open.get_or_insert(i);
        } else if let Some(start) = open.take() {
            intervals.push(ObstructionInterval {
                start: position(start),
                end: position(i),
            });
        }

        if i == last {
            if let Some(start) = open.take() {
                intervals.push(ObstructionInterval {
                    start: position(start),
                    end: position(i),
                });
            }
        }
    }
    intervals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{compute_link_profile, ElevationProfile, LinkParameters};

    fn flat_link() -> LinkProfile {
        let terrain = ElevationProfile::new(vec![100.0; 11], 100.0).unwrap();
        compute_link_profile(&terrain, &LinkParameters::new(20.0, 20.0, 5.0)).unwrap()
    }

    fn lidar_at(heights: &[f64], step: f64) -> LidarProfile {
        LidarProfile::new(
            heights
                .iter()
                .enumerate()
                .map(|(i, h)| LidarSample {
                    distance: i as f64 * step,
                    height: *h,
                })
                .collect(),
        )
    }

    #[test]
    fn test_all_clear_yields_no_intervals() {
        let link = flat_link();
        let lidar = lidar_at(&[101.0; 21], 50.0);
        assert!(profile_obstructions(&link, &lidar).is_empty());
    }

    #[test]
    fn test_all_obstructed_yields_single_full_interval() {
        let link = flat_link();
        let lidar = lidar_at(&[500.0; 21], 50.0);
        let intervals = profile_obstructions(&link, &lidar);
        assert_eq!(
            intervals,
            vec![ObstructionInterval {
                start: 0.0,
                end: 1000.0
            }]
        );
    }

    #[test]
    fn test_empty_lidar_is_not_an_error() {
        let link = flat_link();
        assert!(profile_obstructions(&link, &LidarProfile::default()).is_empty());
        assert!(
            obstructions_by_index(link.line_of_sight(), link.spacing_m(), &LidarProfile::default())
                .is_empty()
        );
    }

    #[test]
    fn test_tree_in_the_middle_by_distance() {
        let link = flat_link();
        let mut heights = vec![100.0; 21];
        heights[9] = 150.0;
        heights[10] = 150.0;
        heights[11] = 150.0;
        let lidar = lidar_at(&heights, 50.0);

        let intervals = profile_obstructions(&link, &lidar);
        assert_eq!(
            intervals,
            vec![ObstructionInterval {
                start: 450.0,
                end: 600.0
            }]
        );
    }

    #[test]
    fn test_two_obstructions_are_ascending_and_disjoint() {
        let link = flat_link();
        let mut heights = vec![100.0; 21];
        heights[4] = 200.0;
        heights[15] = 200.0;
        heights[16] = 200.0;
        let lidar = lidar_at(&heights, 50.0);

        let intervals = profile_obstructions(&link, &lidar);
        assert_eq!(intervals.len(), 2);
        assert!(intervals[0].end <= intervals[1].start);
        assert_eq!(intervals[0].start, 200.0);
        assert_eq!(intervals[1].end, 850.0);
    }

    #[test]
    fn test_obstruction_running_to_the_end_closes_at_last_sample() {
        let link = flat_link();
        let mut heights = vec![100.0; 21];
        for h in heights.iter_mut().skip(18) {
            *h = 300.0;
        }
        let lidar = lidar_at(&heights, 50.0);

        let intervals = profile_obstructions(&link, &lidar);
        assert_eq!(
            intervals,
            vec![ObstructionInterval {
                start: 900.0,
                end: 1000.0
            }]
        );
    }

    #[test]
    fn test_by_index_reports_sample_indices() {
        let link = flat_link();
        let mut heights = vec![100.0; 21];
        // Surface peaks between link samples 3 and 5.
        heights[7] = 200.0;
        heights[8] = 200.0;
        let lidar = lidar_at(&heights, 50.0);

        let intervals = obstructions_by_index(link.line_of_sight(), link.spacing_m(), &lidar);
        assert_eq!(
            intervals,
            vec![ObstructionInterval {
                start: 4.0,
                end: 5.0
            }]
        );
    }

    #[test]
    fn test_by_index_all_obstructed() {
        let link = flat_link();
        let lidar = lidar_at(&[400.0; 3], 500.0);
        let intervals = obstructions_by_index(link.line_of_sight(), link.spacing_m(), &lidar);
        assert_eq!(
            intervals,
            vec![ObstructionInterval {
                start: 0.0,
                end: 10.0
            }]
        );
    }

    #[test]
    fn test_from_pairs() {
        let lidar = LidarProfile::from_pairs(&[[0.0, 10.0], [5.0, 12.5]]);
        assert_eq!(lidar.len(), 2);
        assert_eq!(lidar.heights(), vec![10.0, 12.5]);
        assert_eq!(lidar.max_height(), Some(12.5));
    }

    #[test]
    fn test_scan_single_sample() {
        assert_eq!(
            scan(&[-1.0], |i| i as f64),
            vec![ObstructionInterval { start: 0.0, end: 0.0 }]
        );
        assert!(scan(&[], |i| i as f64).is_empty());
    }
}
