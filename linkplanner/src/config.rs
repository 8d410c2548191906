//! Planner configuration.
//!
//! Every setting has a built-in default; an optional INI file overrides
//! individual keys.
//!
//! # Example Configuration (INI)
//!
//! ```ini
//! [channel]
//! url = ws://planner.example.net/ws
//! reconnect_delay_ms = 1000
//! request_timeout_ms = 30000
//!
//! [session]
//! frequency_ghz = 5.8
//! fresnel_zone = 1
//! units = us
//! ```

use std::path::Path;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::geometry::DEFAULT_FRESNEL_ZONE;
use crate::units::UnitSystem;

// =============================================================================
// Defaults
// =============================================================================

/// Default backend endpoint.
pub const DEFAULT_URL: &str = "ws://127.0.0.1:8000/ws/";

/// Delay between a close and the next connect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Default center frequency for new links (GHz).
pub const DEFAULT_FREQUENCY_GHZ: f64 = 5.0;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {section}.{key}: {value:?}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },
}

impl From<ini::Error> for ConfigError {
    fn from(err: ini::Error) -> Self {
        match err {
            ini::Error::Io(e) => ConfigError::Io(e),
            ini::Error::Parse(e) => ConfigError::Parse(e.to_string()),
        }
    }
}

// =============================================================================
// Channel
// =============================================================================

/// Request channel settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub url: String,
    /// Fixed delay before each reconnect attempt.
    pub reconnect_delay: Duration,
    /// Age after which an unanswered request stops matching responses.
    /// `None` keeps requests live until replaced or cancelled.
    pub request_timeout: Option<Duration>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            request_timeout: None,
        }
    }
}

impl ChannelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

// =============================================================================
// Session
// =============================================================================

/// Link planning session settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub default_frequency_ghz: f64,
    pub fresnel_zone: u32,
    /// Unit system of radio heights passed to the session.
    pub units: UnitSystem,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_frequency_ghz: DEFAULT_FREQUENCY_GHZ,
            fresnel_zone: DEFAULT_FRESNEL_ZONE,
            units: UnitSystem::Metric,
        }
    }
}

impl SessionConfig {
    pub fn with_frequency_ghz(mut self, ghz: f64) -> Self {
        self.default_frequency_ghz = ghz;
        self
    }

    pub fn with_fresnel_zone(mut self, zone: u32) -> Self {
        self.fresnel_zone = zone;
        self
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = units;
        self
    }
}

// =============================================================================
// Top level
// =============================================================================

/// All planner settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerConfig {
    pub channel: ChannelConfig,
    pub session: SessionConfig,
}

impl PlannerConfig {
    /// Loads settings from an INI file on top of the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    /// Parses INI text on top of the defaults.
    pub fn from_ini_str(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = PlannerConfig::default();

        if let Some(section) = ini.section(Some("channel")) {
            if let Some(url) = section.get("url") {
                config.channel.url = url.trim().to_string();
            }
            if let Some(ms) = section.get("reconnect_delay_ms") {
                config.channel.reconnect_delay =
                    Duration::from_millis(parse_value("channel", "reconnect_delay_ms", ms)?);
            }
            if let Some(ms) = section.get("request_timeout_ms") {
                let ms: u64 = parse_value("channel", "request_timeout_ms", ms)?;
                // 0 disables the timeout
                config.channel.request_timeout = (ms > 0).then(|| Duration::from_millis(ms));
            }
        }

        if let Some(section) = ini.section(Some("session")) {
            if let Some(ghz) = section.get("frequency_ghz") {
                let ghz: f64 = parse_value("session", "frequency_ghz", ghz)?;
                if !ghz.is_finite() || ghz <= 0.0 {
                    return Err(invalid("session", "frequency_ghz", ghz.to_string()));
                }
                config.session.default_frequency_ghz = ghz;
            }
            if let Some(zone) = section.get("fresnel_zone") {
                let zone: u32 = parse_value("session", "fresnel_zone", zone)?;
                if zone == 0 {
                    return Err(invalid("session", "fresnel_zone", zone.to_string()));
                }
                config.session.fresnel_zone = zone;
            }
            if let Some(units) = section.get("units") {
                config.session.units = UnitSystem::parse(units.trim())
                    .ok_or_else(|| invalid("session", "units", units.to_string()))?;
            }
        }

        Ok(config)
    }
}

fn parse_value<T: std::str::FromStr>(
    section: &'static str,
    key: &'static str,
    raw: &str,
) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| invalid(section, key, raw.to_string()))
}

fn invalid(section: &'static str, key: &'static str, value: String) -> ConfigError {
    ConfigError::InvalidValue {
        section,
        key,
        value,
    }
}
