//! Tri-state building serviceability.

use serde::{Deserialize, Serialize};

/// Whether a transmitter can serve a building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverageStatus {
    Serviceable,
    Unserviceable,
    #[default]
    Unknown,
}

impl CoverageStatus {
    /// Merges a status already in the union with an incoming one.
    ///
    /// | current       | incoming      | result        |
    /// |---------------|---------------|---------------|
    /// | serviceable   | any           | serviceable   |
    /// | unserviceable | any           | incoming      |
    /// | unknown       | serviceable   | serviceable   |
    /// | unknown       | other         | unknown       |
    pub fn combine(self, incoming: CoverageStatus) -> CoverageStatus {
        match self {
            CoverageStatus::Serviceable => CoverageStatus::Serviceable,
            CoverageStatus::Unserviceable => incoming,
            CoverageStatus::Unknown => {
                if incoming == CoverageStatus::Serviceable {
                    CoverageStatus::Serviceable
                } else {
                    CoverageStatus::Unknown
                }
            }
        }
    }

    /// Parses the backend's status string; anything unrecognized is unknown.
    pub fn from_wire(value: Option<&str>) -> CoverageStatus {
        match value {
            Some("serviceable") => CoverageStatus::Serviceable,
            Some("unserviceable") => CoverageStatus::Unserviceable,
            _ => CoverageStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageStatus::Serviceable => "serviceable",
            CoverageStatus::Unserviceable => "unserviceable",
            CoverageStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
