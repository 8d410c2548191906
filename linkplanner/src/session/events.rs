//! Events the session pushes to its consumer.

use serde_json::Value;

use super::link::LinkAnalysis;
use crate::coverage::{BuildingCoverage, CoverageSummary};
use crate::protocol::{ProfileResponse, RequestId, RequestKind, TypedResponse};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Channel connected (`true`) or lost its connection (`false`).
    Connectivity(bool),

    /// Fresh line of sight, Fresnel envelope and obstruction verdict.
    LinkAnalysis(LinkAnalysis),

    /// Profile for a zoomed sub-range; the full-link state is untouched.
    PartialProfile(ProfileResponse),

    /// The backend reported an error for a request.
    BackendError { kind: RequestKind, message: String },

    /// Aggregated coverage of the current transmitter selection changed.
    CoverageUpdated {
        buildings: Vec<BuildingCoverage>,
        summary: CoverageSummary,
    },

    AccessPointStatus {
        transmitter: String,
        status: Option<String>,
    },

    ViewshedReady {
        transmitter: String,
        base_url: Option<String>,
        minzoom: Option<u8>,
        maxzoom: Option<u8>,
    },

    ViewshedProgress {
        transmitter: String,
        progress: Option<Value>,
        time_remaining: Option<f64>,
    },

    /// CPE features changed after a sector was created elsewhere.
    SectorCreated {
        added: Vec<Value>,
        deleted: Vec<Value>,
    },

    /// Answer to [`LinkPlanningSession::request`](super::LinkPlanningSession::request).
    TypedResult {
        kind: RequestKind,
        request_id: RequestId,
        response: TypedResponse,
    },
}
