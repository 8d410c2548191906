//! Messages received from the backend.
//!
//! Three families share the socket, told apart by their keys:
//!
//! ```text
//! has "handler"               -> ProfileResponse  (lidar | terrain | link)
//! "type" is a status event    -> StatusMessage    (ap.status, ap.viewshed, ...)
//! "type" + "uuid" + "value"   -> TypedResponse    (answers to typed requests)
//! ```

use serde::Deserialize;
use serde_json::Value;

use super::error::ProtocolError;
use super::outbound::Aoi;

fn full_aoi() -> [f64; 2] {
    [Aoi::FULL.start(), Aoi::FULL.end()]
}

fn is_full(aoi: &[f64; 2]) -> bool {
    aoi[0] == 0.0 && aoi[1] == 1.0
}

// =============================================================================
// Profile family
// =============================================================================

/// LiDAR surface profile along the link.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LidarResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub hash: String,
    #[serde(default = "full_aoi")]
    pub aoi: [f64; 2],
    /// `[distance_m, height_m]` pairs.
    #[serde(default)]
    pub lidar_profile: Vec<[f64; 2]>,
    /// Total link length in metres.
    #[serde(default)]
    pub dist: Option<f64>,
    /// Data source; a string or a list of strings.
    #[serde(default)]
    pub source: Option<Value>,
    /// Resolution label of the surface data.
    #[serde(default)]
    pub res: Option<String>,
    #[serde(default)]
    pub url: Option<Value>,
    #[serde(default)]
    pub bb: Vec<f64>,
    #[serde(default)]
    pub tx: Option<[f64; 2]>,
    #[serde(default)]
    pub rx: Option<[f64; 2]>,
    /// More tiles are still loading; a fuller profile will follow.
    #[serde(default)]
    pub still_loading: bool,
}

impl LidarResponse {
    pub fn is_full_aoi(&self) -> bool {
        is_full(&self.aoi)
    }
}

/// One terrain sample.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TerrainPoint {
    pub elevation: f64,
    pub lat: f64,
    pub lng: f64,
}

/// Bare-earth terrain profile along the link.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TerrainResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub hash: String,
    #[serde(default = "full_aoi")]
    pub aoi: [f64; 2],
    #[serde(default)]
    pub terrain_profile: Vec<TerrainPoint>,
    #[serde(default)]
    pub dist: Option<f64>,
    #[serde(default)]
    pub source: Option<Value>,
}

impl TerrainResponse {
    pub fn is_full_aoi(&self) -> bool {
        is_full(&self.aoi)
    }

    pub fn elevations(&self) -> Vec<f64> {
        self.terrain_profile.iter().map(|p| p.elevation).collect()
    }
}

/// Link summary (currently just the length).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub dist: Option<f64>,
}

/// Response to a link request, one per handler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "handler", rename_all = "lowercase")]
pub enum ProfileResponse {
    Lidar(LidarResponse),
    Terrain(TerrainResponse),
    Link(LinkResponse),
}

impl ProfileResponse {
    pub fn hash(&self) -> &str {
        match self {
            ProfileResponse::Lidar(r) => &r.hash,
            ProfileResponse::Terrain(r) => &r.hash,
            ProfileResponse::Link(r) => &r.hash,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ProfileResponse::Lidar(r) => r.error.as_deref(),
            ProfileResponse::Terrain(r) => r.error.as_deref(),
            ProfileResponse::Link(r) => r.error.as_deref(),
        }
    }
}

// =============================================================================
// Status family
// =============================================================================

/// Building features attached to an access point status.
///
/// Accepted either as a bare array or as a GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CoveragePayload {
    Features(Vec<Value>),
    Collection { features: Vec<Value> },
}

impl CoveragePayload {
    pub fn features(&self) -> &[Value] {
        match self {
            CoveragePayload::Features(f) => f,
            CoveragePayload::Collection { features } => features,
        }
    }
}

const STATUS_TYPES: &[&str] = &[
    "standard.message",
    "std_msg",
    "ap.status",
    "ap_status",
    "ap.viewshed",
    "ap_viewshed",
    "ap.viewshed_progress",
    "ap_viewshed_progress",
    "ap.unexpected_error",
    "ap_unexpected_error",
    "cpe.sector_created",
    "cpe_sector_created",
];

/// Event pushed by the backend, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum StatusMessage {
    /// Plain message without a handler.
    #[serde(rename = "standard.message", alias = "std_msg")]
    Standard {
        #[serde(default)]
        uuid: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },

    /// Access point processing status, optionally with computed coverage.
    #[serde(rename = "ap.status", alias = "ap_status")]
    ApStatus {
        uuid: String,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        coverage: Option<CoveragePayload>,
    },

    /// Viewshed tiles are ready.
    #[serde(rename = "ap.viewshed", alias = "ap_viewshed")]
    ApViewshed {
        uuid: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        maxzoom: Option<u8>,
        #[serde(default)]
        minzoom: Option<u8>,
    },

    #[serde(rename = "ap.viewshed_progress", alias = "ap_viewshed_progress")]
    ViewshedProgress {
        uuid: String,
        #[serde(default)]
        progress: Option<Value>,
        #[serde(default)]
        time_remaining: Option<f64>,
    },

    #[serde(rename = "ap.unexpected_error", alias = "ap_unexpected_error")]
    UnexpectedError {
        uuid: String,
        #[serde(default)]
        msg: String,
    },

    /// Sector creation changed the CPE set. Not tied to any request.
    #[serde(rename = "cpe.sector_created", alias = "cpe_sector_created")]
    SectorCreated {
        #[serde(default)]
        added_features: Vec<Value>,
        #[serde(default)]
        deleted_features: Vec<Value>,
    },
}

impl StatusMessage {
    fn is_status_type(t: &str) -> bool {
        STATUS_TYPES.contains(&t)
    }

    pub fn uuid(&self) -> Option<&str> {
        match self {
            StatusMessage::Standard { uuid, .. } => uuid.as_deref(),
            StatusMessage::ApStatus { uuid, .. }
            | StatusMessage::ApViewshed { uuid, .. }
            | StatusMessage::ViewshedProgress { uuid, .. }
            | StatusMessage::UnexpectedError { uuid, .. } => Some(uuid),
            StatusMessage::SectorCreated { .. } => None,
        }
    }
}

// =============================================================================
// Typed family
// =============================================================================

/// Answer to a typed request, correlated by `uuid`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypedResponse {
    #[serde(rename = "type")]
    pub response_type: String,
    pub uuid: String,
    #[serde(default)]
    pub value: Value,
}

// =============================================================================
// Dispatch
// =============================================================================

/// Any decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Profile(ProfileResponse),
    Status(StatusMessage),
    Typed(TypedResponse),
}

impl InboundMessage {
    /// Decodes one text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;

        let has_handler = object.contains_key("handler");
        let is_status = object
            .get("type")
            .and_then(Value::as_str)
            .map(StatusMessage::is_status_type);
        let has_uuid = object.contains_key("uuid");

        match (has_handler, is_status) {
            (true, _) => Ok(InboundMessage::Profile(serde_json::from_value(value)?)),
            (false, Some(true)) => Ok(InboundMessage::Status(serde_json::from_value(value)?)),
            (false, Some(false)) if has_uuid => {
                Ok(InboundMessage::Typed(serde_json::from_value(value)?))
            }
            _ => {
                let keys: Vec<&str> = object.keys().map(String::as_str).collect();
                Err(ProtocolError::UnknownShape(keys.join(",")))
            }
        }
    }

    /// Token echoed from the request, if the message carries one.
    pub fn correlation(&self) -> Option<&str> {
        match self {
            InboundMessage::Profile(p) => Some(p.hash()).filter(|h| !h.is_empty()),
            InboundMessage::Status(s) => s.uuid(),
            InboundMessage::Typed(t) => Some(t.uuid.as_str()),
        }
    }
}
