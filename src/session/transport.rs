use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use super::stream::SessionError;
use crate::protocol::ProtocolVariant;

/// One bidirectional, message-oriented connection.
///
/// `recv` returning `None` means the peer closed the transport.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, text: String) -> Result<(), SessionError>;
    async fn recv(&mut self) -> Option<Result<String, SessionError>>;
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// Establishes a transport for one recording activity
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, variant: ProtocolVariant) -> Result<Box<dyn Transport>, SessionError>;
}

/// WebSocket connector against the speech service.
///
/// Authentication rides in a `jwt-<key>` sub-protocol token next to the
/// variant token, because the environment cannot attach an
/// Authorization header to the websocket handshake.
pub struct WsConnector {
    ws_url: String,
    api_key: String,
}

impl WsConnector {
    pub fn new(ws_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, variant: ProtocolVariant) -> Result<Url, SessionError> {
        let raw = format!("{}/{}", self.ws_url.trim_end_matches('/'), variant.ws_path());
        Url::parse(&raw).map_err(|e| SessionError::Configuration(format!("invalid url {raw}: {e}")))
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, variant: ProtocolVariant) -> Result<Box<dyn Transport>, SessionError> {
        let url = self.endpoint(variant)?;

        let request = tokio_tungstenite::tungstenite::http::Request::builder()
            .uri(url.as_str())
            .header(
                "Sec-WebSocket-Protocol",
                format!("{}, jwt-{}", variant.subprotocol(), self.api_key),
            )
            .body(())
            .map_err(|e| SessionError::Configuration(e.to_string()))?;

        let (ws_stream, response) = connect_async(request)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        debug!("Websocket handshake complete: {:?}", response.status());

        Ok(Box::new(WsTransport { inner: ws_stream }))
    }
}

pub struct WsTransport {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, text: String) -> Result<(), SessionError> {
        self.inner
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, SessionError>> {
        loop {
            match self.inner.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text.to_string())),
                Some(Ok(Message::Close(frame))) => {
                    debug!("Websocket closed by peer: {:?}", frame);
                    return None;
                }
                // Pings are answered by the library; binary is not part
                // of the inbound vocabulary.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Some(Err(SessionError::Transport(e.to_string()))),
                None => return None,
            }
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.inner
            .close(None)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))
    }
}
