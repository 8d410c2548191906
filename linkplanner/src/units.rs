//! Metric/imperial conversions for user-facing heights and distances.

use serde::{Deserialize, Serialize};

const MILES_PER_KM: f64 = 0.621371;
const FT_PER_M: f64 = 3.28084;

/// Unit system the UI collaborator enters heights in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Us,
}

impl UnitSystem {
    /// Converts a height entered in this unit system to meters.
    pub fn height_to_m(self, value: f64) -> f64 {
        match self {
            UnitSystem::Metric => value,
            UnitSystem::Us => ft_to_m(value),
        }
    }

    /// Parses a unit system name (`metric` or `us`), case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "metric" => Some(UnitSystem::Metric),
            "us" | "imperial" => Some(UnitSystem::Us),
            _ => None,
        }
    }
}

#[inline]
pub fn km_to_miles(km: f64) -> f64 {
    km * MILES_PER_KM
}

#[inline]
pub fn m_to_ft(m: f64) -> f64 {
    m * FT_PER_M
}

#[inline]
pub fn ft_to_m(ft: f64) -> f64 {
    ft / FT_PER_M
}
