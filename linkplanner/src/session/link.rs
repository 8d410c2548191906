//! Per-link profile state.
//!
//! Terrain and LiDAR arrive as separate responses, in either order, and are
//! merged by distance. The analysis is recomputed from scratch whenever any
//! input changes.

use serde::Serialize;

use crate::coord::haversine_distance_m;
use crate::geometry::{compute_link_profile, ElevationProfile, GeometryError, LinkParameters, LinkProfile};
use crate::obstruction::{profile_obstructions, LidarProfile, ObstructionInterval};
use crate::protocol::{LidarResponse, TerrainResponse};

/// Radio height used until the caller sets one (m).
pub const DEFAULT_RADIO_HEIGHT_M: f64 = 10.0;

/// LiDAR surface availability.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LidarState {
    /// Not reported yet.
    #[default]
    Absent,
    Available(LidarProfile),
    /// The backend reported an error instead of a profile.
    Unavailable(String),
}

/// Result of one recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkAnalysis {
    pub profile: LinkProfile,
    /// `None` while LiDAR is absent or unavailable.
    pub obstructions: Option<Vec<ObstructionInterval>>,
    /// The backend is still refining the LiDAR surface.
    pub still_loading: bool,
    pub distance_m: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct LinkState {
    pub(crate) params: LinkParameters,
    elevation: Option<Vec<f64>>,
    /// `(lat, lng)` of the first and last terrain samples.
    endpoints: Option<((f64, f64), (f64, f64))>,
    lidar: LidarState,
    distance_m: Option<f64>,
    still_loading: bool,
}

impl LinkState {
    pub(crate) fn new(params: LinkParameters) -> Self {
        Self {
            params,
            elevation: None,
            endpoints: None,
            lidar: LidarState::Absent,
            distance_m: None,
            still_loading: false,
        }
    }

    /// Forgets everything the backend said about the previous link.
    pub(crate) fn reset_profiles(&mut self) {
        self.elevation = None;
        self.endpoints = None;
        self.lidar = LidarState::Absent;
        self.distance_m = None;
        self.still_loading = false;
    }

    pub(crate) fn elevation(&self) -> Option<&[f64]> {
        self.elevation.as_deref()
    }

    pub(crate) fn lidar(&self) -> &LidarState {
        &self.lidar
    }

    pub(crate) fn apply_terrain(&mut self, response: &TerrainResponse) {
        self.elevation = Some(response.elevations());
        self.endpoints = match (response.terrain_profile.first(), response.terrain_profile.last()) {
            (Some(a), Some(b)) => Some(((a.lat, a.lng), (b.lat, b.lng))),
            _ => None,
        };
        if self.distance_m.is_none() {
            self.distance_m = response.dist;
        }
    }

    pub(crate) fn terrain_failed(&mut self) {
        self.elevation = None;
        self.endpoints = None;
    }

    pub(crate) fn apply_lidar(&mut self, response: &LidarResponse) {
        self.lidar = LidarState::Available(LidarProfile::from_pairs(&response.lidar_profile));
        if let Some(dist) = response.dist {
            self.distance_m = Some(dist);
        }
        self.still_loading = response.still_loading;
    }

    pub(crate) fn lidar_failed(&mut self, error: &str) {
        self.lidar = LidarState::Unavailable(error.to_string());
        self.still_loading = false;
    }

    pub(crate) fn apply_distance(&mut self, dist: f64) {
        self.distance_m = Some(dist);
    }

    /// Link length: reported distance, else great-circle between terrain ends.
    fn distance(&self) -> Option<f64> {
        self.distance_m.or_else(|| {
            self.endpoints
                .map(|((lat1, lng1), (lat2, lng2))| haversine_distance_m(lat1, lng1, lat2, lng2))
        })
    }

    /// `None` until terrain (and a length) are known.
    pub(crate) fn analyze(&self) -> Option<Result<LinkAnalysis, GeometryError>> {
        let samples = self.elevation.as_ref()?;
        let distance_m = self.distance()?;
        Some(self.analyze_with(samples, distance_m))
    }

    fn analyze_with(&self, samples: &[f64], distance_m: f64) -> Result<LinkAnalysis, GeometryError> {
        let terrain = ElevationProfile::spanning(samples.to_vec(), distance_m)?;
        let profile = compute_link_profile(&terrain, &self.params)?;
        let obstructions = match &self.lidar {
            LidarState::Available(lidar) => Some(profile_obstructions(&profile, lidar)),
            LidarState::Absent | LidarState::Unavailable(_) => None,
        };
        Ok(LinkAnalysis {
            profile,
            obstructions,
            still_loading: self.still_loading,
            distance_m,
        })
    }
}
