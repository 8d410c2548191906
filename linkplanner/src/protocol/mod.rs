//! JSON wire protocol spoken over the request channel.
//!
//! Outbound requests carry a correlation token; inbound messages echo it.
//! The channel only needs [`OutboundRequest::encode`],
//! [`InboundMessage::parse`] and [`InboundMessage::correlation`]; the typed
//! payloads are for the session.

mod error;
mod inbound;
mod outbound;

pub use error::ProtocolError;
pub use inbound::{
    CoveragePayload, InboundMessage, LidarResponse, LinkResponse, ProfileResponse, StatusMessage,
    TerrainPoint, TerrainResponse, TypedResponse,
};
pub use outbound::{
    Aoi, EncodedRequest, LinkQuery, OutboundRequest, RequestId, RequestKind, TypedRequest,
};
