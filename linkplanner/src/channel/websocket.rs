//! WebSocket transport over `tokio-tungstenite`.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use super::error::TransportError;
use super::transport::{BoxFuture, Connection, Connector, FrameSink, FrameStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to a `ws://` endpoint.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WebSocketConnector {
    fn connect(&self) -> BoxFuture<'_, Result<Connection, TransportError>> {
        Box::pin(async move {
            let (socket, response) = connect_async(self.url.as_str())
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;
            debug!(url = %self.url, status = %response.status(), "WebSocket handshake complete");

            let (sink, stream) = socket.split();
            Ok(Connection {
                sink: Box::new(WsSink(sink)),
                stream: Box::new(WsStream(stream)),
            })
        })
    }
}

struct WsSink(SplitSink<Socket, Message>);

impl FrameSink for WsSink {
    fn send_frame(&mut self, frame: String) -> BoxFuture<'_, Result<(), TransportError>> {
        Box::pin(async move {
            self.0
                .send(Message::Text(frame))
                .await
                .map_err(|e| TransportError::Send(e.to_string()))
        })
    }
}

struct WsStream(SplitStream<Socket>);

impl FrameStream for WsStream {
    fn next_frame(&mut self) -> BoxFuture<'_, Option<Result<String, TransportError>>> {
        Box::pin(async move {
            loop {
                match self.0.next().await? {
                    Ok(Message::Text(text)) => return Some(Ok(text)),
                    Ok(Message::Binary(bytes)) => {
                        return Some(
                            String::from_utf8(bytes)
                                .map_err(|e| TransportError::Receive(e.to_string())),
                        )
                    }
                    Ok(Message::Close(_)) => return None,
                    // Ping/pong are answered by tungstenite itself.
                    Ok(_) => continue,
                    Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
                }
            }
        })
    }
}
