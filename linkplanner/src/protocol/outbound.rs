//! Requests sent to the backend.
//!
//! Every request is tagged with a fresh [`RequestId`] when it is sent. The
//! encoder also returns the correlation token the backend will echo back in
//! its responses, which is what the channel's slots remember.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::error::ProtocolError;
use crate::coord::LngLat;

/// Logical request type. Each kind has one slot in the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Terrain/LiDAR link profile.
    Link,
    /// Access point coverage status.
    AccessPoint,
    /// Market polygon query (buildings, income, providers, speeds).
    Polygon,
    /// Single-geography lookup by census block group (grant area).
    GrantGeography,
    /// Single-geography lookup by zip code.
    ZipGeography,
    /// Single-geography lookup by state and county code.
    CountyGeography,
    /// Single-geography lookup by census block.
    CensusBlockGeography,
    /// Viewshed computation for a point.
    Viewshed,
}

impl RequestKind {
    pub const ALL: [RequestKind; 8] = [
        RequestKind::Link,
        RequestKind::AccessPoint,
        RequestKind::Polygon,
        RequestKind::GrantGeography,
        RequestKind::ZipGeography,
        RequestKind::CountyGeography,
        RequestKind::CensusBlockGeography,
        RequestKind::Viewshed,
    ];

    /// `request_type` value for kinds of the typed request family.
    pub fn request_type(&self) -> Option<&'static str> {
        match self {
            RequestKind::Link | RequestKind::AccessPoint => None,
            RequestKind::Polygon => Some("standard_polygon"),
            RequestKind::GrantGeography => Some("grant_geography"),
            RequestKind::ZipGeography => Some("zip_geography"),
            RequestKind::CountyGeography => Some("county_geography"),
            RequestKind::CensusBlockGeography => Some("census_block_geography"),
            RequestKind::Viewshed => Some("viewshed"),
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::Link => "link",
            RequestKind::AccessPoint => "access_point",
            other => other.request_type().unwrap_or("unknown"),
        };
        f.write_str(name)
    }
}

/// Identifier attached to one outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fractional sub-range `[start, end]` of a link profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", try_from = "[f64; 2]")]
pub struct Aoi {
    start: f64,
    end: f64,
}

impl Aoi {
    /// The whole link.
    pub const FULL: Aoi = Aoi {
        start: 0.0,
        end: 1.0,
    };

    /// Creates an AOI; requires `0 <= start < end <= 1`.
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if (0.0..=1.0).contains(&start) && (0.0..=1.0).contains(&end) && start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn is_full(&self) -> bool {
        self.start == 0.0 && self.end == 1.0
    }
}

impl Default for Aoi {
    fn default() -> Self {
        Aoi::FULL
    }
}

impl From<Aoi> for [f64; 2] {
    fn from(aoi: Aoi) -> Self {
        [aoi.start, aoi.end]
    }
}

impl TryFrom<[f64; 2]> for Aoi {
    type Error = String;

    fn try_from(value: [f64; 2]) -> Result<Self, Self::Error> {
        Aoi::new(value[0], value[1]).ok_or_else(|| format!("invalid aoi {:?}", value))
    }
}

impl fmt::Display for Aoi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.end)
    }
}

/// Link profile query between two radios.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkQuery {
    pub tx: LngLat,
    pub rx: LngLat,
    /// Caller's identifier for the link being edited (`fbid` on the wire).
    pub client_id: String,
    pub aoi: Aoi,
    pub frequency_ghz: f64,
}

impl LinkQuery {
    pub fn new(tx: LngLat, rx: LngLat, client_id: impl Into<String>, frequency_ghz: f64) -> Self {
        Self {
            tx,
            rx,
            client_id: client_id.into(),
            aoi: Aoi::FULL,
            frequency_ghz,
        }
    }

    pub fn with_aoi(mut self, aoi: Aoi) -> Self {
        self.aoi = aoi;
        self
    }

    /// Key the session uses to skip re-sending an identical query.
    pub fn dedupe_key(&self) -> String {
        format!("{},{},{},{}", self.tx, self.rx, self.client_id, self.aoi)
    }
}

/// Request of the typed family: `{request_type, uuid, ...fields}`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRequest {
    kind: RequestKind,
    fields: Map<String, Value>,
}

impl TypedRequest {
    /// Buildings, income, providers and speeds inside a geometry collection.
    pub fn polygon(include: Value) -> Self {
        Self::with_fields(RequestKind::Polygon, [("include", include)])
    }

    pub fn grant_geography(cbgid: impl Into<String>) -> Self {
        Self::with_fields(RequestKind::GrantGeography, [("cbgid", Value::String(cbgid.into()))])
    }

    pub fn zip_geography(zip: impl Into<String>) -> Self {
        Self::with_fields(RequestKind::ZipGeography, [("zip", Value::String(zip.into()))])
    }

    pub fn county_geography(statecode: impl Into<String>, countycode: impl Into<String>) -> Self {
        Self::with_fields(
            RequestKind::CountyGeography,
            [
                ("statecode", Value::String(statecode.into())),
                ("countycode", Value::String(countycode.into())),
            ],
        )
    }

    pub fn census_block_geography(blockcode: impl Into<String>) -> Self {
        Self::with_fields(
            RequestKind::CensusBlockGeography,
            [("blockcode", Value::String(blockcode.into()))],
        )
    }

    /// Viewshed from a point at a given antenna height and radius.
    pub fn viewshed(center: LngLat, height_m: f64, radius_m: f64) -> Self {
        Self::with_fields(
            RequestKind::Viewshed,
            [
                ("center", json!(center)),
                ("height", json!(height_m)),
                ("radius", json!(radius_m)),
            ],
        )
    }

    fn with_fields<const N: usize>(kind: RequestKind, fields: [(&str, Value); N]) -> Self {
        Self {
            kind,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Any request the channel can send.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundRequest {
    Link(LinkQuery),
    /// Coverage status of one access point or sector.
    AccessPoint { transmitter: String },
    Typed(TypedRequest),
}

/// A serialized request and the token its responses will carry.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRequest {
    pub frame: String,
    pub correlation: String,
}

impl OutboundRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            OutboundRequest::Link(_) => RequestKind::Link,
            OutboundRequest::AccessPoint { .. } => RequestKind::AccessPoint,
            OutboundRequest::Typed(t) => t.kind,
        }
    }

    /// Serializes the request with `id` attached.
    ///
    /// | kind         | id travels in          | responses echo       |
    /// |--------------|------------------------|----------------------|
    /// | link         | `hash` (`key:id`)      | `hash`               |
    /// | access point | not sent               | `uuid` (transmitter) |
    /// | typed        | `uuid`                 | `uuid`               |
    pub fn encode(&self, id: &RequestId) -> Result<EncodedRequest, ProtocolError> {
        let (body, correlation) = match self {
            OutboundRequest::Link(query) => {
                let hash = format!("{}:{}", query.dedupe_key(), id);
                let body = json!({
                    "msg": "link",
                    "tx": query.tx,
                    "rx": query.rx,
                    "fbid": query.client_id,
                    "aoi": query.aoi,
                    "hash": hash,
                    "freq": query.frequency_ghz,
                });
                (body, hash)
            }
            OutboundRequest::AccessPoint { transmitter } => {
                let body = json!({ "msg": "ap", "uuid": transmitter });
                (body, transmitter.clone())
            }
            OutboundRequest::Typed(request) => {
                let uuid = id.to_string();
                let mut body = request.fields.clone();
                body.insert(
                    "request_type".to_string(),
                    Value::String(request.kind.request_type().unwrap_or_default().to_string()),
                );
                body.insert("uuid".to_string(), Value::String(uuid.clone()));
                (Value::Object(body), uuid)
            }
        };
        Ok(EncodedRequest {
            frame: serde_json::to_string(&body)?,
            correlation,
        })
    }
}
