//! Persistent request/response channel to the planning backend.
//!
//! A single duplex connection carries every request. The channel keeps at
//! most one live request per [`RequestKind`]: sending a new one, or
//! cancelling, makes responses to the previous one stale, and stale
//! responses are dropped before they reach the consumer.
//!
//! While disconnected, outbound frames wait in a FIFO that is flushed, oldest
//! first, exactly once when the next connection opens. Reconnects happen on
//! a fixed delay forever.
//!
//! # Example
//!
//! ```ignore
//! use linkplanner::channel::{RequestChannel, WebSocketConnector};
//!
//! let connector = Arc::new(WebSocketConnector::new(&config.url));
//! let (channel, mut events) = RequestChannel::spawn(&config, connector);
//! channel.send(&OutboundRequest::AccessPoint { transmitter: "ap-1".into() })?;
//! while let Some(event) = events.recv().await { /* ... */ }
//! ```

mod coordinator;
mod error;
pub mod memory;
mod slots;
mod state;
mod transport;
mod websocket;

pub use coordinator::{ChannelEvent, RequestChannel};
pub use error::TransportError;
pub use state::{ChannelState, Connectivity};
pub use transport::{BoxFuture, Connection, Connector, FrameSink, FrameStream};
pub use websocket::WebSocketConnector;
