//! Per-transmitter building coverage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::key::{BuildingKey, Footprint};
use super::status::CoverageStatus;

/// Coverage verdict for one building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageRecord {
    /// Outer ring of the building footprint, if known.
    pub footprint: Option<Footprint>,
    pub status: CoverageStatus,
}

/// A building and its status, flattened for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildingCoverage {
    pub key: BuildingKey,
    pub footprint: Option<Footprint>,
    pub status: CoverageStatus,
}

/// Count of buildings per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoverageSummary {
    pub serviceable: usize,
    pub unserviceable: usize,
    pub unknown: usize,
}

/// Building feature as the backend reports it.
///
/// `{ "geometry": {"type": "Polygon", "coordinates": [[...]]},
///    "properties": {"msftid": 123, "serviceable": "serviceable"} }`
#[derive(Debug, Clone, Deserialize)]
struct BuildingFeature {
    #[serde(default)]
    geometry: Option<PolygonGeometry>,
    #[serde(default)]
    properties: BuildingProperties,
}

#[derive(Debug, Clone, Deserialize)]
struct PolygonGeometry {
    #[serde(default)]
    coordinates: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct BuildingProperties {
    #[serde(default)]
    msftid: Option<u64>,
    #[serde(default)]
    serviceable: Option<String>,
}

/// Map of building to serviceability for one transmitter.
///
/// Sets are immutable snapshots: a new backend result replaces the whole set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageSet {
    records: BTreeMap<BuildingKey, CoverageRecord>,
}

impl CoverageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from backend building features.
    ///
    /// Features with neither an id nor a footprint cannot be keyed and are
    /// skipped. A missing status means unknown.
    pub fn from_features(features: &[Value]) -> Self {
        let mut set = CoverageSet::new();
        for raw in features {
            let feature: BuildingFeature = match serde_json::from_value(raw.clone()) {
                Ok(f) => f,
                Err(e) => {
                    debug!(error = %e, "Skipping malformed building feature");
                    continue;
                }
            };
            let footprint = feature
                .geometry
                .and_then(|g| g.coordinates.into_iter().next())
                .filter(|ring| !ring.is_empty());
            if feature.properties.msftid.is_none() && footprint.is_none() {
                debug!("Skipping building feature without id or footprint");
                continue;
            }
            let status = CoverageStatus::from_wire(feature.properties.serviceable.as_deref());
            set.insert(feature.properties.msftid, footprint, status);
        }
        set
    }

    /// Inserts or overwrites a building.
    pub fn insert(&mut self, id: Option<u64>, footprint: Option<Footprint>, status: CoverageStatus) {
        let key = BuildingKey::for_building(id, footprint.as_deref().unwrap_or(&[]));
        self.records.insert(key, CoverageRecord { footprint, status });
    }

    pub(crate) fn insert_record(&mut self, key: BuildingKey, record: CoverageRecord) {
        self.records.insert(key, record);
    }

    pub(crate) fn record_mut(&mut self, key: &BuildingKey) -> Option<&mut CoverageRecord> {
        self.records.get_mut(key)
    }

    /// Status of a building; buildings not in the set are unknown.
    pub fn status(&self, key: &BuildingKey) -> CoverageStatus {
        self.records
            .get(key)
            .map(|r| r.status)
            .unwrap_or(CoverageStatus::Unknown)
    }

    /// Whether the set holds a known verdict for the building.
    pub fn includes(&self, key: &BuildingKey) -> bool {
        self.status(key) != CoverageStatus::Unknown
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BuildingKey, &CoverageRecord)> {
        self.records.iter()
    }

    pub fn summary(&self) -> CoverageSummary {
        let mut summary = CoverageSummary::default();
        for record in self.records.values() {
            match record.status {
                CoverageStatus::Serviceable => summary.serviceable += 1,
                CoverageStatus::Unserviceable => summary.unserviceable += 1,
                CoverageStatus::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    /// Flattens into `(footprint, status)` rows for the rendering layer.
    pub fn to_flat_list(&self) -> Vec<BuildingCoverage> {
        self.records
            .iter()
            .map(|(key, record)| BuildingCoverage {
                key: key.clone(),
                footprint: record.footprint.clone(),
                status: record.status,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(id: u64, status: Option<&str>) -> Value {
        json!({
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]]},
            "properties": {"msftid": id, "serviceable": status}
        })
    }

    #[test]
    fn test_from_features() {
        let set = CoverageSet::from_features(&[
            feature(1, Some("serviceable")),
            feature(2, Some("unserviceable")),
            feature(3, None),
        ]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.status(&BuildingKey::Id(1)), CoverageStatus::Serviceable);
        assert_eq!(set.status(&BuildingKey::Id(2)), CoverageStatus::Unserviceable);
        assert_eq!(set.status(&BuildingKey::Id(3)), CoverageStatus::Unknown);
    }

    #[test]
    fn test_feature_without_id_keys_by_footprint() {
        let raw = json!({
            "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]},
            "properties": {"serviceable": "serviceable"}
        });
        let set = CoverageSet::from_features(&[raw]);
        let key = BuildingKey::from_footprint(&[[1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]);
        assert_eq!(set.status(&key), CoverageStatus::Serviceable);
    }

    #[test]
    fn test_unkeyable_and_malformed_features_are_skipped() {
        let set = CoverageSet::from_features(&[
            json!({"properties": {"serviceable": "serviceable"}}),
            json!("not a feature"),
            feature(9, Some("serviceable")),
        ]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_missing_building_is_unknown() {
        let set = CoverageSet::new();
        assert_eq!(set.status(&BuildingKey::Id(5)), CoverageStatus::Unknown);
        assert!(!set.includes(&BuildingKey::Id(5)));
    }

    #[test]
    fn test_summary_counts() {
        let set = CoverageSet::from_features(&[
            feature(1, Some("serviceable")),
            feature(2, Some("serviceable")),
            feature(3, Some("unserviceable")),
        ]);
        assert_eq!(
            set.summary(),
            CoverageSummary {
                serviceable: 2,
                unserviceable: 1,
                unknown: 0
            }
        );
    }

    #[test]
    fn test_flat_list_carries_footprints() {
        let set = CoverageSet::from_features(&[feature(7, Some("serviceable"))]);
        let rows = set.to_flat_list();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, BuildingKey::Id(7));
        assert_eq!(rows[0].footprint.as_ref().map(|f| f.len()), Some(4));
    }
}
