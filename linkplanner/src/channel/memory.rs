//! In-process transport.
//!
//! [`memory_transport`] returns a connector for the channel and a listener
//! standing in for the backend. Each [`MemoryListener::accept`] hands the
//! connector one connection and returns the server end as a [`MemoryPeer`].
//! Dropping the peer closes the connection.
//!
//! ```ignore
//! let (connector, listener) = memory_transport();
//! let (channel, events) = RequestChannel::spawn(&config, Arc::new(connector));
//! let mut peer = listener.accept();
//! let frame = peer.recv().await;
//! ```

use tokio::sync::{mpsc, Mutex};

use super::error::TransportError;
use super::transport::{BoxFuture, Connection, Connector, FrameSink, FrameStream};

/// Creates a connected connector/listener pair.
pub fn memory_transport() -> (MemoryConnector, MemoryListener) {
    let (offer_tx, offer_rx) = mpsc::unbounded_channel();
    (
        MemoryConnector {
            offers: Mutex::new(offer_rx),
        },
        MemoryListener { offers: offer_tx },
    )
}

/// Client side: `connect` waits until the listener accepts.
#[derive(Debug)]
pub struct MemoryConnector {
    offers: Mutex<mpsc::UnboundedReceiver<Connection>>,
}

impl Connector for MemoryConnector {
    fn connect(&self) -> BoxFuture<'_, Result<Connection, TransportError>> {
        Box::pin(async move {
            let mut offers = self.offers.lock().await;
            offers.recv().await.ok_or(TransportError::Closed)
        })
    }
}

/// Server side factory.
#[derive(Debug, Clone)]
pub struct MemoryListener {
    offers: mpsc::UnboundedSender<Connection>,
}

impl MemoryListener {
    /// Offers one connection to the connector.
    pub fn accept(&self) -> MemoryPeer {
        let (to_server, from_client) = mpsc::unbounded_channel();
        let (to_client, from_server) = mpsc::unbounded_channel();
        let connection = Connection {
            sink: Box::new(MemorySink(to_server)),
            stream: Box::new(MemoryStream(from_server)),
        };
        // Connector gone means the channel is shut down; the peer just sees silence.
        let _ = self.offers.send(connection);
        MemoryPeer {
            received: from_client,
            outbound: to_client,
        }
    }
}

/// Server end of one in-memory connection.
#[derive(Debug)]
pub struct MemoryPeer {
    received: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
}

impl MemoryPeer {
    /// Next frame written by the client, `None` once the client side is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.received.recv().await
    }

    /// Frame already written by the client, if any.
    pub fn try_recv(&mut self) -> Option<String> {
        self.received.try_recv().ok()
    }

    /// Pushes a frame to the client. Returns false if the client hung up.
    pub fn send(&self, frame: impl Into<String>) -> bool {
        self.outbound.send(frame.into()).is_ok()
    }
}

struct MemorySink(mpsc::UnboundedSender<String>);

impl FrameSink for MemorySink {
    fn send_frame(&mut self, frame: String) -> BoxFuture<'_, Result<(), TransportError>> {
        let result = self.0.send(frame).map_err(|_| TransportError::Closed);
        Box::pin(async move { result })
    }
}

struct MemoryStream(mpsc::UnboundedReceiver<String>);

impl FrameStream for MemoryStream {
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Result<String, TransportError>>> {
        Box::pin(async move { self.0.recv().await.map(Ok) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_accept_then_connect_exchanges_frames() {
        let (connector, listener) = memory_transport();
        let mut peer = listener.accept();
        let mut connection = connector.connect().await.unwrap();

        connection.sink.send_frame("hello".into()).await.unwrap();
        assert_eq!(peer.recv().await.as_deref(), Some("hello"));

        assert!(peer.send("world"));
        let frame = connection.stream.next_frame().await;
        assert_eq!(frame, Some(Ok("world".to_string())));
    }

    #[tokio::test]
    async fn test_dropping_peer_closes_connection() {
        let (connector, listener) = memory_transport();
        let peer = listener.accept();
        let mut connection = connector.connect().await.unwrap();
        drop(peer);

        assert_eq!(connection.stream.next_frame().await, None);
        assert_eq!(
            connection.sink.send_frame("late".into()).await,
            Err(TransportError::Closed)
        );
    }

    #[tokio::test]
    async fn test_connect_fails_when_listener_dropped() {
        let (connector, listener) = memory_transport();
        drop(listener);
        assert!(matches!(connector.connect().await, Err(TransportError::Closed)));
    }
}
