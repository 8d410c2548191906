//! Link planning session.
//!
//! Ties the pieces together for one editing session: it turns caller actions
//! into channel requests, routes channel events into link and coverage
//! state, recomputes the analysis, and reports everything as
//! [`SessionEvent`]s.
//!
//! ```text
//! caller ──update_request/zoom/set_*──► LinkPlanningSession ──send──► RequestChannel
//!                                            ▲   │                          │
//!                                            │   └──► SessionEvent (mpsc)   │
//!                                            └─────── ChannelEvent ◄────────┘
//! ```
//!
//! The session is driven by the caller: each [`process_next`] consumes one
//! channel event, and [`run`] loops until shutdown.
//!
//! [`process_next`]: LinkPlanningSession::process_next
//! [`run`]: LinkPlanningSession::run

mod error;
mod events;
mod link;
mod registry;

pub use error::SessionError;
pub use events::SessionEvent;
pub use link::{LidarState, LinkAnalysis, DEFAULT_RADIO_HEIGHT_M};

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::{ChannelEvent, Connectivity, RequestChannel, WebSocketConnector};
use crate::config::{PlannerConfig, SessionConfig};
use crate::coverage::CoverageSet;
use crate::geometry::{GeometryError, LinkParameters};
use crate::protocol::{
    Aoi, InboundMessage, LinkQuery, OutboundRequest, ProfileResponse, RequestId, RequestKind,
    StatusMessage, TypedRequest,
};
use link::LinkState;
use registry::CoverageRegistry;

/// One planning session over a shared request channel.
#[derive(Debug)]
pub struct LinkPlanningSession {
    config: SessionConfig,
    channel: RequestChannel,
    channel_events: mpsc::UnboundedReceiver<ChannelEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
    link: LinkState,
    query: Option<LinkQuery>,
    query_key: Option<String>,
    coverage: CoverageRegistry,
}

impl LinkPlanningSession {
    /// Creates a session on an already spawned channel.
    pub fn new(
        config: SessionConfig,
        channel: RequestChannel,
        channel_events: mpsc::UnboundedReceiver<ChannelEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let params = LinkParameters::new(
            DEFAULT_RADIO_HEIGHT_M,
            DEFAULT_RADIO_HEIGHT_M,
            config.default_frequency_ghz,
        )
        .with_zone(config.fresnel_zone);

        let session = Self {
            config,
            channel,
            channel_events,
            events: events_tx,
            link: LinkState::new(params),
            query: None,
            query_key: None,
            coverage: CoverageRegistry::default(),
        };
        (session, events_rx)
    }

    /// Spawns a WebSocket channel to `config.channel.url` and builds a session on it.
    pub fn connect(config: &PlannerConfig) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let connector = Arc::new(WebSocketConnector::new(config.channel.url.clone()));
        let (channel, channel_events) = RequestChannel::spawn(&config.channel, connector);
        Self::new(config.session.clone(), channel, channel_events)
    }

    pub fn channel(&self) -> &RequestChannel {
        &self.channel
    }

    // =========================================================================
    // Link profile
    // =========================================================================

    /// Requests profiles for a link unless the same link is already loaded.
    ///
    /// Returns the request id, or `None` when the query was a duplicate. A
    /// duplicate that only changes the frequency is applied locally.
    pub fn update_request(&mut self, query: LinkQuery) -> Result<Option<RequestId>, SessionError> {
        let params = LinkParameters {
            frequency_ghz: query.frequency_ghz,
            ..self.link.params
        };
        params.validate()?;

        let key = query.dedupe_key();
        if self.query_key.as_deref() == Some(key.as_str()) {
            debug!(key = %key, "Link request unchanged, not resending");
            if let Some(current) = self.query.as_mut() {
                current.frequency_ghz = query.frequency_ghz;
            }
            if params != self.link.params {
                self.update_params(params)?;
            }
            return Ok(None);
        }

        let request_id = self.channel.send(&OutboundRequest::Link(query.clone()))?;
        self.link.params = params;
        self.link.reset_profiles();
        self.query = Some(query);
        self.query_key = Some(key);
        Ok(Some(request_id))
    }

    /// Requests profiles for the `[start, end]` fraction of the current link.
    pub fn zoom(&mut self, start: f64, end: f64) -> Result<RequestId, SessionError> {
        let aoi = Aoi::new(start, end).ok_or(SessionError::InvalidAoi { start, end })?;
        let query = self
            .query
            .as_ref()
            .ok_or(SessionError::NoActiveLink)?
            .clone()
            .with_aoi(aoi);
        Ok(self.channel.send(&OutboundRequest::Link(query))?)
    }

    /// Sets both radio heights, in the session's unit system.
    pub fn set_radio_heights(&mut self, tx: f64, rx: f64) -> Result<(), SessionError> {
        let units = self.config.units;
        self.update_params(LinkParameters {
            tx_height_m: units.height_to_m(tx),
            rx_height_m: units.height_to_m(rx),
            ..self.link.params
        })
    }

    pub fn set_frequency(&mut self, frequency_ghz: f64) -> Result<(), SessionError> {
        self.update_params(LinkParameters {
            frequency_ghz,
            ..self.link.params
        })
    }

    pub fn set_fresnel_zone(&mut self, zone: u32) -> Result<(), SessionError> {
        self.update_params(self.link.params.with_zone(zone))
    }

    fn update_params(&mut self, params: LinkParameters) -> Result<(), SessionError> {
        params.validate()?;
        self.link.params = params;
        self.recompute();
        Ok(())
    }

    pub fn link_parameters(&self) -> LinkParameters {
        self.link.params
    }

    /// Analysis of the current inputs; `None` until terrain has arrived.
    pub fn current_analysis(&self) -> Option<Result<LinkAnalysis, GeometryError>> {
        self.link.analyze()
    }

    pub fn elevation(&self) -> Option<&[f64]> {
        self.link.elevation()
    }

    pub fn lidar_state(&self) -> &LidarState {
        self.link.lidar()
    }

    fn recompute(&self) {
        match self.link.analyze() {
            None => {}
            Some(Ok(analysis)) => self.emit(SessionEvent::LinkAnalysis(analysis)),
            Some(Err(e)) => {
                warn!(error = %e, "Link analysis failed");
                self.emit(SessionEvent::BackendError {
                    kind: RequestKind::Link,
                    message: e.to_string(),
                });
            }
        }
    }

    // =========================================================================
    // Access points and coverage
    // =========================================================================

    pub fn request_access_point_status(
        &mut self,
        transmitter: impl Into<String>,
    ) -> Result<RequestId, SessionError> {
        let request = OutboundRequest::AccessPoint {
            transmitter: transmitter.into(),
        };
        Ok(self.channel.send(&request)?)
    }

    /// Replaces a transmitter's coverage and republishes the aggregate.
    pub fn set_coverage(&mut self, transmitter: &str, set: CoverageSet) {
        self.coverage.set(transmitter, set);
        self.publish_coverage();
    }

    pub fn remove_transmitter(&mut self, transmitter: &str) -> bool {
        let removed = self.coverage.remove(transmitter);
        if removed {
            self.publish_coverage();
        }
        removed
    }

    /// Restricts the aggregate to these transmitters; empty means all.
    pub fn select_transmitters<I, S>(&mut self, transmitters: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.coverage.select(transmitters);
        self.publish_coverage();
    }

    pub fn coverage_view(&self) -> CoverageSet {
        self.coverage.view()
    }

    /// Transmitters with stored coverage, in the order their coverage arrived.
    pub fn coverage_transmitters(&self) -> impl Iterator<Item = &str> {
        self.coverage.transmitters()
    }

    pub fn transmitter_coverage(&self, transmitter: &str) -> Option<&CoverageSet> {
        self.coverage.get(transmitter)
    }

    fn publish_coverage(&self) {
        let view = self.coverage.view();
        self.emit(SessionEvent::CoverageUpdated {
            buildings: view.to_flat_list(),
            summary: view.summary(),
        });
    }

    // =========================================================================
    // Generic requests
    // =========================================================================

    pub fn request(&mut self, request: TypedRequest) -> Result<RequestId, SessionError> {
        Ok(self.channel.send(&OutboundRequest::Typed(request))?)
    }

    /// Drops any response to the live request of `kind`.
    ///
    /// Cancelling the link lets the same link be requested again.
    pub fn cancel(&mut self, kind: RequestKind) {
        self.channel.cancel(kind);
        if kind == RequestKind::Link {
            self.query_key = None;
        }
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Waits for and handles one channel event. Returns false once the
    /// channel is gone.
    pub async fn process_next(&mut self) -> bool {
        match self.channel_events.recv().await {
            Some(event) => {
                self.handle(event);
                true
            }
            None => false,
        }
    }

    /// Processes events until `shutdown` fires or the channel ends, then
    /// stops the channel.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!("Link planning session running");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                more = self.process_next() => {
                    if !more {
                        break;
                    }
                }
            }
        }
        self.channel.shutdown();
        info!("Link planning session stopped");
    }

    fn handle(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connectivity(c) => {
                self.emit(SessionEvent::Connectivity(c == Connectivity::Connected))
            }
            ChannelEvent::Notification(message) => self.handle_notification(message),
            ChannelEvent::Response {
                kind,
                request_id,
                message,
            } => match message {
                InboundMessage::Profile(profile) => self.handle_profile(profile),
                InboundMessage::Status(status) => self.handle_status(kind, status),
                InboundMessage::Typed(response) => self.emit(SessionEvent::TypedResult {
                    kind,
                    request_id,
                    response,
                }),
            },
        }
    }

    fn handle_profile(&mut self, profile: ProfileResponse) {
        if let Some(error) = profile.error() {
            let message = error.to_string();
            warn!(error = %message, "Backend reported a link error");
            match &profile {
                ProfileResponse::Lidar(r) if r.is_full_aoi() => self.link.lidar_failed(&message),
                ProfileResponse::Terrain(r) if r.is_full_aoi() => {
                    self.link.terrain_failed();
                    self.query_key = None;
                }
                ProfileResponse::Link(_) => self.query_key = None,
                _ => {}
            }
            self.emit(SessionEvent::BackendError {
                kind: RequestKind::Link,
                message,
            });
            self.recompute();
            return;
        }

        match profile {
            ProfileResponse::Terrain(r) if r.is_full_aoi() => {
                self.link.apply_terrain(&r);
                self.recompute();
            }
            ProfileResponse::Lidar(r) if r.is_full_aoi() => {
                self.link.apply_lidar(&r);
                self.recompute();
            }
            ProfileResponse::Link(r) => {
                if let Some(dist) = r.dist {
                    self.link.apply_distance(dist);
                    self.recompute();
                }
            }
            partial => self.emit(SessionEvent::PartialProfile(partial)),
        }
    }

    fn handle_status(&mut self, kind: RequestKind, status: StatusMessage) {
        match status {
            StatusMessage::ApStatus {
                uuid,
                status,
                coverage,
            } => {
                self.emit(SessionEvent::AccessPointStatus {
                    transmitter: uuid.clone(),
                    status,
                });
                if let Some(coverage) = coverage {
                    let set = CoverageSet::from_features(coverage.features());
                    debug!(transmitter = %uuid, buildings = set.len(), "Coverage received");
                    self.set_coverage(&uuid, set);
                }
            }
            StatusMessage::ApViewshed {
                uuid,
                base_url,
                minzoom,
                maxzoom,
            } => self.emit(SessionEvent::ViewshedReady {
                transmitter: uuid,
                base_url,
                minzoom,
                maxzoom,
            }),
            StatusMessage::ViewshedProgress {
                uuid,
                progress,
                time_remaining,
            } => self.emit(SessionEvent::ViewshedProgress {
                transmitter: uuid,
                progress,
                time_remaining,
            }),
            StatusMessage::UnexpectedError { uuid, msg } => {
                warn!(transmitter = %uuid, error = %msg, "Access point processing failed");
                self.emit(SessionEvent::BackendError { kind, message: msg });
            }
            StatusMessage::Standard { error, .. } => {
                if let Some(message) = error {
                    self.emit(SessionEvent::BackendError { kind, message });
                }
            }
            StatusMessage::SectorCreated {
                added_features,
                deleted_features,
            } => self.emit(SessionEvent::SectorCreated {
                added: added_features,
                deleted: deleted_features,
            }),
        }
    }

    fn handle_notification(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::Status(StatusMessage::SectorCreated {
                added_features,
                deleted_features,
            }) => self.emit(SessionEvent::SectorCreated {
                added: added_features,
                deleted: deleted_features,
            }),
            InboundMessage::Status(StatusMessage::Standard {
                error: Some(error), ..
            }) => warn!(error = %error, "Uncorrelated backend error"),
            other => debug!(message = ?other, "Ignoring notification"),
        }
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Session event receiver dropped");
        }
    }
}
