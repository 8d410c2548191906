//! Building coverage aggregation
//!
//! Each transmitter (access point or sector) owns a [`CoverageSet`] mapping
//! buildings to a tri-state verdict. [`union`] merges the sets of several
//! transmitters into the single view the map renders.
//!
//! # Merge rules
//!
//! 1. A building serviceable in any set is serviceable in the union.
//! 2. A building unserviceable in every set that knows it is unserviceable.
//! 3. Otherwise it is unknown.
//!
//! # Example
//!
//! ```
//! use linkplanner::coverage::{union, BuildingKey, CoverageSet, CoverageStatus};
//!
//! let mut north = CoverageSet::new();
//! north.insert(Some(1), None, CoverageStatus::Unserviceable);
//! let mut south = CoverageSet::new();
//! south.insert(Some(1), None, CoverageStatus::Serviceable);
//!
//! let merged = union([&north, &south]);
//! assert_eq!(merged.status(&BuildingKey::Id(1)), CoverageStatus::Serviceable);
//! ```

mod aggregator;
mod key;
mod set;
mod status;

pub use aggregator::union;
pub use key::{BuildingKey, Footprint};
pub use set::{BuildingCoverage, CoverageRecord, CoverageSet, CoverageSummary};
pub use status::CoverageStatus;
