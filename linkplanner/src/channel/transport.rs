//! Transport abstraction for the request channel.
//!
//! The channel never touches sockets directly. It asks a [`Connector`] for a
//! [`Connection`], writes text frames into its [`FrameSink`] and reads from
//! its [`FrameStream`] until the stream ends.
//!
//! Traits are dyn-compatible (boxed futures) so a connector can be shared as
//! `Arc<dyn Connector>`.

use std::future::Future;
use std::pin::Pin;

use super::error::TransportError;

/// Boxed `Send` future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Write half of a connection.
pub trait FrameSink: Send {
    fn send_frame(&mut self, frame: String) -> BoxFuture<'_, Result<(), TransportError>>;
}

/// Read half of a connection. `None` means the peer closed.
pub trait FrameStream: Send {
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Result<String, TransportError>>>;
}

/// An open duplex connection.
pub struct Connection {
    pub sink: Box<dyn FrameSink>,
    pub stream: Box<dyn FrameStream>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// Opens connections to the backend.
pub trait Connector: Send + Sync {
    fn connect(&self) -> BoxFuture<'_, Result<Connection, TransportError>>;
}
