//! The request channel: one persistent connection, one live request per kind.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        RequestChannel                            │
//! │                                                                  │
//! │  send(req) ──► slot.activate(id) ──► Open?  ──yes──► outbound tx │
//! │                                        │                         │
//! │                                        no ──► FIFO (queued)      │
//! │                                                                  │
//! │  background task:                                                │
//! │    Connecting ──► connect() ──► flush FIFO ──► Open              │
//! │        ▲                                        │                │
//! │        │                          frame ──► parse ──► slot match │
//! │        │                                        │     │          │
//! │        │                                        │     ├─► Response
//! │        │                                        │     └─► drop   │
//! │        └── sleep(reconnect_delay) ◄── ClosedRetrying ◄──┘        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! State, slots and the FIFO share one lock, so a frame is either flushed
//! with the queue or written directly; never both and never neither.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::slots::SlotTable;
use super::state::{ChannelState, Connectivity};
use super::transport::{Connection, Connector};
use crate::config::ChannelConfig;
use crate::protocol::{InboundMessage, OutboundRequest, ProtocolError, RequestId, RequestKind};

/// Event delivered to the channel's consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connectivity(Connectivity),
    /// Message answering the live request of `kind`.
    Response {
        kind: RequestKind,
        request_id: RequestId,
        message: InboundMessage,
    },
    /// Server push that answers no request.
    Notification(InboundMessage),
}

struct Inner {
    state: ChannelState,
    queue: VecDeque<String>,
    slots: SlotTable,
    /// Writer of the current connection; `Some` only while open.
    outbound: Option<mpsc::UnboundedSender<String>>,
}

struct Shared {
    inner: Mutex<Inner>,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl Shared {
    fn emit(&self, event: ChannelEvent) {
        if self.events.send(event).is_err() {
            debug!("Channel event receiver dropped");
        }
    }

    fn set_state(&self, state: ChannelState) {
        self.inner.lock().state = state;
    }

    fn route(&self, text: &str) {
        let message = match InboundMessage::parse(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Dropping malformed frame");
                return;
            }
        };

        let Some(token) = message.correlation().map(str::to_owned) else {
            self.emit(ChannelEvent::Notification(message));
            return;
        };

        let matched = self.inner.lock().slots.match_token(&token, Instant::now());
        match matched {
            Some((kind, request_id)) => self.emit(ChannelEvent::Response {
                kind,
                request_id,
                message,
            }),
            None => debug!(token = %token, "Dropping stale response"),
        }
    }
}

/// Handle to the background connection task.
///
/// Cloning yields another handle to the same channel.
#[derive(Clone)]
pub struct RequestChannel {
    shared: Arc<Shared>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for RequestChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestChannel")
            .field("state", &self.state())
            .field("queued", &self.queued_len())
            .finish()
    }
}

impl RequestChannel {
    /// Spawns the connection task and starts connecting.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        config: &ChannelConfig,
        connector: Arc<dyn Connector>,
    ) -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                state: ChannelState::Connecting,
                queue: VecDeque::new(),
                slots: SlotTable::new(config.request_timeout),
                outbound: None,
            }),
            events: events_tx,
        });
        let shutdown = CancellationToken::new();

        tokio::spawn(run(
            Arc::clone(&shared),
            connector,
            config.reconnect_delay,
            shutdown.clone(),
        ));

        (Self { shared, shutdown }, events_rx)
    }

    /// Sends a request, superseding any live request of the same kind.
    ///
    /// Never blocks: while the connection is down the frame is queued and
    /// written when the next connection opens.
    pub fn send(&self, request: &OutboundRequest) -> Result<RequestId, ProtocolError> {
        let kind = request.kind();
        let request_id = RequestId::new();
        let encoded = request.encode(&request_id)?;

        let mut guard = self.shared.inner.lock();
        let inner = &mut *guard;
        inner
            .slots
            .activate(kind, request_id, encoded.correlation, Instant::now());

        let frame = match (&inner.state, &inner.outbound) {
            (ChannelState::Open, Some(tx)) => match tx.send(encoded.frame) {
                Ok(()) => None,
                Err(e) => Some(e.0),
            },
            _ => Some(encoded.frame),
        };
        let queued = frame.is_some();
        if let Some(frame) = frame {
            inner.queue.push_back(frame);
        }
        drop(guard);

        debug!(kind = ?kind, request_id = %request_id, queued, "Request sent");
        Ok(request_id)
    }

    /// Invalidates the live request of `kind`. Nothing is sent to the server.
    pub fn cancel(&self, kind: RequestKind) {
        let previous = self.shared.inner.lock().slots.cancel(kind, Instant::now());
        if let Some(request_id) = previous {
            debug!(kind = ?kind, request_id = %request_id, "Request cancelled");
        }
    }

    pub fn state(&self) -> ChannelState {
        self.shared.inner.lock().state
    }

    /// Frames waiting for the next connection.
    pub fn queued_len(&self) -> usize {
        self.shared.inner.lock().queue.len()
    }

    /// Identifier of the live request of `kind`, if any.
    pub fn active_request(&self, kind: RequestKind) -> Option<RequestId> {
        self.shared.inner.lock().slots.active(kind, Instant::now())
    }

    /// Stops the background task. Queued frames are discarded with it.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

// =============================================================================
// Background task
// =============================================================================

async fn run(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    reconnect_delay: Duration,
    shutdown: CancellationToken,
) {
    info!("Request channel starting");

    loop {
        shared.set_state(ChannelState::Connecting);

        let attempt = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            attempt = connector.connect() => attempt,
        };

        match attempt {
            Ok(connection) => {
                serve(&shared, connection, &shutdown).await;
                shared.emit(ChannelEvent::Connectivity(Connectivity::Disconnected));
            }
            Err(e) => {
                shared.set_state(ChannelState::ClosedRetrying);
                warn!(error = %e, "Connect attempt failed");
            }
        }

        if shutdown.is_cancelled() {
            break;
        }

        debug!(delay_ms = reconnect_delay.as_millis() as u64, "Reconnecting after delay");
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }

    {
        let mut inner = shared.inner.lock();
        inner.state = ChannelState::ClosedRetrying;
        inner.outbound = None;
    }
    info!("Request channel stopped");
}

/// Runs one open connection until it closes or shutdown is requested.
async fn serve(shared: &Shared, connection: Connection, shutdown: &CancellationToken) {
    let Connection {
        mut sink,
        mut stream,
    } = connection;
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    let flushed = {
        let mut guard = shared.inner.lock();
        let inner = &mut *guard;
        let flushed = inner.queue.len();
        for frame in inner.queue.drain(..) {
            // out_rx is alive, so this cannot fail.
            let _ = out_tx.send(frame);
        }
        inner.outbound = Some(out_tx);
        inner.state = ChannelState::Open;
        flushed
    };
    info!(flushed, "Request channel open");
    shared.emit(ChannelEvent::Connectivity(Connectivity::Connected));

    let mut unwritten: Option<String> = None;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            frame = stream.next_frame() => match frame {
                Some(Ok(text)) => shared.route(&text),
                Some(Err(e)) => {
                    warn!(error = %e, "Receive failed");
                    break;
                }
                None => {
                    info!("Connection closed by peer");
                    break;
                }
            },
            Some(frame) = out_rx.recv() => {
                if let Err(e) = sink.send_frame(frame.clone()).await {
                    warn!(error = %e, "Send failed");
                    unwritten = Some(frame);
                    break;
                }
            }
        }
    }

    // Detach the writer and put everything not yet written back at the
    // front of the FIFO, oldest first.
    let mut guard = shared.inner.lock();
    let inner = &mut *guard;
    inner.outbound = None;
    inner.state = ChannelState::ClosedRetrying;
    out_rx.close();
    let mut pending: Vec<String> = unwritten.into_iter().collect();
    while let Ok(frame) = out_rx.try_recv() {
        pending.push(frame);
    }
    let requeued = pending.len();
    for frame in pending.into_iter().rev() {
        inner.queue.push_front(frame);
    }
    drop(guard);

    if requeued > 0 {
        debug!(requeued, "Requeued unwritten frames");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::memory::{memory_transport, MemoryListener};
    use crate::protocol::TypedRequest;
    use serde_json::Value;

    fn test_config() -> ChannelConfig {
        ChannelConfig::default().with_reconnect_delay(Duration::from_millis(10))
    }

    fn spawn() -> (RequestChannel, mpsc::UnboundedReceiver<ChannelEvent>, MemoryListener) {
        let (connector, listener) = memory_transport();
        let (channel, events) = RequestChannel::spawn(&test_config(), Arc::new(connector));
        (channel, events, listener)
    }

    async fn expect_connectivity(events: &mut mpsc::UnboundedReceiver<ChannelEvent>, expected: Connectivity) {
        match events.recv().await {
            Some(ChannelEvent::Connectivity(c)) => assert_eq!(c, expected),
            other => panic!("expected {:?}, got {:?}", expected, other),
        }
    }

    fn uuid_of(frame: &str) -> String {
        let body: Value = serde_json::from_str(frame).unwrap();
        body["uuid"].as_str().unwrap().to_string()
    }

    fn zip_response(uuid: &str) -> String {
        format!(r#"{{"type": "zip_geography", "uuid": "{}", "value": {{}}}}"#, uuid)
    }

    #[tokio::test]
    async fn test_sends_queue_while_connecting() {
        let (channel, _events, _listener) = spawn();
        channel
            .send(&OutboundRequest::Typed(TypedRequest::zip_geography("1")))
            .unwrap();
        channel
            .send(&OutboundRequest::Typed(TypedRequest::zip_geography("2")))
            .unwrap();

        assert_eq!(channel.state(), ChannelState::Connecting);
        assert_eq!(channel.queued_len(), 2);
        channel.shutdown();
    }

    #[tokio::test]
    async fn test_flush_on_open_preserves_order() {
        let (channel, mut events, listener) = spawn();
        for zip in ["a", "b", "c"] {
            channel
                .send(&OutboundRequest::Typed(TypedRequest::zip_geography(zip)))
                .unwrap();
        }

        let mut peer = listener.accept();
        expect_connectivity(&mut events, Connectivity::Connected).await;

        for zip in ["a", "b", "c"] {
            let frame = peer.recv().await.unwrap();
            let body: Value = serde_json::from_str(&frame).unwrap();
            assert_eq!(body["zip"], zip);
        }
        assert_eq!(channel.queued_len(), 0);
        assert_eq!(channel.state(), ChannelState::Open);
        channel.shutdown();
    }

    #[tokio::test]
    async fn test_response_routed_to_live_request() {
        let (channel, mut events, listener) = spawn();
        let mut peer = listener.accept();
        expect_connectivity(&mut events, Connectivity::Connected).await;

        let id = channel
            .send(&OutboundRequest::Typed(TypedRequest::zip_geography("37201")))
            .unwrap();
        let frame = peer.recv().await.unwrap();
        assert!(peer.send(zip_response(&uuid_of(&frame))));

        match events.recv().await {
            Some(ChannelEvent::Response { kind, request_id, .. }) => {
                assert_eq!(kind, RequestKind::ZipGeography);
                assert_eq!(request_id, id);
            }
            other => panic!("expected response, got {:?}", other),
        }
        channel.shutdown();
    }

    #[tokio::test]
    async fn test_superseded_response_is_dropped() {
        let (channel, mut events, listener) = spawn();
        let mut peer = listener.accept();
        expect_connectivity(&mut events, Connectivity::Connected).await;

        channel
            .send(&OutboundRequest::Typed(TypedRequest::zip_geography("1")))
            .unwrap();
        let second = channel
            .send(&OutboundRequest::Typed(TypedRequest::zip_geography("2")))
            .unwrap();
        let first_uuid = uuid_of(&peer.recv().await.unwrap());
        let second_uuid = uuid_of(&peer.recv().await.unwrap());

        peer.send(zip_response(&first_uuid));
        peer.send(zip_response(&second_uuid));

        match events.recv().await {
            Some(ChannelEvent::Response { request_id, .. }) => assert_eq!(request_id, second),
            other => panic!("expected second response, got {:?}", other),
        }
        assert!(events.try_recv().is_err(), "first response must not be dispatched");
        channel.shutdown();
    }

    #[tokio::test]
    async fn test_notification_and_malformed_frames() {
        let (channel, mut events, listener) = spawn();
        let peer = listener.accept();
        expect_connectivity(&mut events, Connectivity::Connected).await;

        peer.send("{not json");
        peer.send(r#"{"type": "cpe.sector_created", "added_features": [], "deleted_features": []}"#);

        match events.recv().await {
            Some(ChannelEvent::Notification(InboundMessage::Status(_))) => {}
            other => panic!("expected notification, got {:?}", other),
        }
        channel.shutdown();
    }

    #[tokio::test]
    async fn test_reconnects_after_close() {
        let (channel, mut events, listener) = spawn();
        let peer = listener.accept();
        expect_connectivity(&mut events, Connectivity::Connected).await;

        drop(peer);
        expect_connectivity(&mut events, Connectivity::Disconnected).await;

        channel
            .send(&OutboundRequest::AccessPoint {
                transmitter: "ap-1".into(),
            })
            .unwrap();

        let mut peer = listener.accept();
        expect_connectivity(&mut events, Connectivity::Connected).await;
        let frame = peer.recv().await.unwrap();
        assert!(frame.contains("ap-1"));
        channel.shutdown();
    }

    #[tokio::test]
    async fn test_cancel_clears_active_request() {
        let (channel, _events, _listener) = spawn();
        let id = channel
            .send(&OutboundRequest::Typed(TypedRequest::grant_geography("470370101001")))
            .unwrap();
        assert_eq!(channel.active_request(RequestKind::GrantGeography), Some(id));

        channel.cancel(RequestKind::GrantGeography);
        assert_eq!(channel.active_request(RequestKind::GrantGeography), None);
        channel.shutdown();
    }
}
