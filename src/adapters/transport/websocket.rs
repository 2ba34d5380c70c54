//! WebSocket transport over tokio-tungstenite.
//!
//! Each namespace is a path under the base URL (`ws://host:port/<namespace>`).
//! After the upgrade the client sends the handshake frame and waits for
//! `handshake_ack` or `handshake_rejected`, bounded by the handshake timeout.
//! An HTTP 401/403 on upgrade is treated as a rejected handshake as well.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::domain::connection::Handshake;
use crate::domain::events::{Frame, HANDSHAKE_ACK_EVENT, HANDSHAKE_REJECTED_EVENT};
use crate::domain::foundation::RealtimeError;
use crate::ports::{Connector, TransportLink};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Opens WebSocket links to `<base_url>/<namespace>`.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    base_url: String,
    handshake_timeout: Duration,
}

impl WebSocketConnector {
    /// `base_url` may use `http(s)://` or `ws(s)://`.
    pub fn new(base_url: impl Into<String>, handshake_timeout: Duration) -> Self {
        Self {
            base_url: websocket_scheme(&base_url.into()),
            handshake_timeout,
        }
    }

    pub fn endpoint(&self, namespace: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            namespace.trim_start_matches('/')
        )
    }

    async fn establish(&self, url: &str, handshake: &Handshake) -> Result<WsStream, RealtimeError> {
        let (mut stream, _) = connect_async(url).await.map_err(upgrade_error)?;

        let hello = handshake.to_frame().to_text()?;
        stream.send(Message::Text(hello)).await.map_err(transport_error)?;

        await_acknowledgement(&mut stream).await?;
        Ok(stream)
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open(
        &self,
        namespace: &str,
        handshake: &Handshake,
    ) -> Result<Box<dyn TransportLink>, RealtimeError> {
        let url = self.endpoint(namespace);
        tracing::debug!(url = %url, "Opening WebSocket");

        let stream = tokio::time::timeout(self.handshake_timeout, self.establish(&url, handshake))
            .await
            .map_err(|_| {
                RealtimeError::Transport(format!(
                    "handshake timed out after {}ms",
                    self.handshake_timeout.as_millis()
                ))
            })??;

        tracing::debug!(url = %url, "WebSocket handshake accepted");
        Ok(Box::new(WebSocketLink { stream }))
    }
}

/// A handshaken WebSocket.
pub struct WebSocketLink {
    stream: WsStream,
}

#[async_trait]
impl TransportLink for WebSocketLink {
    async fn send(&mut self, frame: &Frame) -> Result<(), RealtimeError> {
        let text = frame.to_text()?;
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(transport_error)
    }

    async fn recv(&mut self) -> Option<Result<Frame, RealtimeError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(transport_error(e))),
            };

            match classify(message) {
                Incoming::Frame(Ok(frame)) => return Some(Ok(frame)),
                Incoming::Frame(Err(e)) => {
                    tracing::warn!(error = %e, "Skipping malformed frame");
                }
                Incoming::Control => {}
                Incoming::Closed => return None,
            }
        }
    }

    async fn close(&mut self) {
        let _ = tokio::time::timeout(CLOSE_TIMEOUT, SinkExt::close(&mut self.stream)).await;
    }
}

enum Incoming {
    Frame(Result<Frame, RealtimeError>),
    Control,
    Closed,
}

fn classify(message: Message) -> Incoming {
    match message {
        Message::Text(text) => Incoming::Frame(Frame::from_text(&text)),
        Message::Binary(bytes) => Incoming::Frame(Frame::from_slice(&bytes)),
        Message::Close(_) => Incoming::Closed,
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Incoming::Control,
    }
}

async fn await_acknowledgement(stream: &mut WsStream) -> Result<(), RealtimeError> {
    let closed = || RealtimeError::Transport("connection closed during handshake".to_string());

    loop {
        let message = stream.next().await.ok_or_else(closed)?.map_err(transport_error)?;

        let frame = match classify(message) {
            Incoming::Frame(Ok(frame)) => frame,
            Incoming::Frame(Err(e)) => {
                tracing::warn!(error = %e, "Skipping malformed frame during handshake");
                continue;
            }
            Incoming::Control => continue,
            Incoming::Closed => return Err(closed()),
        };

        match frame.event.as_str() {
            HANDSHAKE_ACK_EVENT => return Ok(()),
            HANDSHAKE_REJECTED_EVENT => {
                let reason = frame
                    .data
                    .get("reason")
                    .and_then(|r| r.as_str())
                    .unwrap_or("handshake rejected")
                    .to_string();
                return Err(RealtimeError::AuthRejected(reason));
            }
            other => {
                tracing::debug!(event = other, "Ignoring frame received before handshake ack");
            }
        }
    }
}

fn websocket_scheme(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        url.to_string()
    }
}

fn upgrade_error(err: WsError) -> RealtimeError {
    match err {
        WsError::Http(response) => match response.status().as_u16() {
            code @ (401 | 403) => RealtimeError::AuthRejected(format!("upgrade refused with HTTP {}", code)),
            code => RealtimeError::Transport(format!("upgrade failed with HTTP {}", code)),
        },
        other => transport_error(other),
    }
}

fn transport_error(err: WsError) -> RealtimeError {
    RealtimeError::Transport(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_urls_become_websocket_urls() {
        assert_eq!(websocket_scheme("http://localhost:5000"), "ws://localhost:5000");
        assert_eq!(websocket_scheme("https://api.example.org"), "wss://api.example.org");
        assert_eq!(websocket_scheme("ws://already"), "ws://already");
    }

    #[test]
    fn endpoint_joins_namespace_once() {
        let connector = WebSocketConnector::new("http://localhost:5000/", Duration::from_secs(1));
        assert_eq!(connector.endpoint("citizen"), "ws://localhost:5000/citizen");
        assert_eq!(connector.endpoint("/hospital"), "ws://localhost:5000/hospital");
    }

    #[test]
    fn text_and_binary_messages_are_frames() {
        let text = r#"{"event":"new_alert","data":{"incidentId":1}}"#;
        assert!(matches!(classify(Message::Text(text.into())), Incoming::Frame(Ok(_))));
        assert!(matches!(
            classify(Message::Binary(text.as_bytes().to_vec())),
            Incoming::Frame(Ok(_))
        ));
        assert!(matches!(classify(Message::Ping(vec![])), Incoming::Control));
        assert!(matches!(classify(Message::Close(None)), Incoming::Closed));
    }
}
