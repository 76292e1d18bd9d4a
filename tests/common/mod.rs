//! In-process mock of a NapCat WebSocket endpoint.
//!
//! Accepts a single client, records every frame it sends, writes whatever
//! frames the test scripts back to it, and reports how the client left.

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use napcat_bus::{BusConfig, BusConfigBuilder};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for anything a test waits on.
const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// MockBus
// ============================================================================

enum Outbound {
    Frame(String),
    Close,
}

/// How the client ended the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientClose {
    /// Sent a WebSocket Close frame.
    Frame,
    /// Dropped the socket without a Close frame.
    Eof,
}

pub struct MockBus {
    url: String,
    outbound: mpsc::UnboundedSender<Outbound>,
    inbound: mpsc::UnboundedReceiver<Value>,
    request_uri: Option<oneshot::Receiver<String>>,
    client_closed: Option<oneshot::Receiver<ClientClose>>,
}

impl MockBus {
    /// Binds to a random localhost port and serves one client.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();

        let (outbound, mut outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let (uri_tx, uri_rx) = oneshot::channel();
        let (closed_tx, closed_rx) = oneshot::channel();

        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };

            let callback = move |request: &Request, response: Response| {
                let _ = uri_tx.send(request.uri().to_string());
                Ok::<_, ErrorResponse>(response)
            };

            let Ok(ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await else {
                return;
            };
            let (mut write, mut read) = ws.split();

            loop {
                tokio::select! {
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Ok(value) = serde_json::from_str(text.as_str()) {
                                let _ = inbound_tx.send(value);
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            let _ = closed_tx.send(ClientClose::Frame);
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(_)) | None => {
                            let _ = closed_tx.send(ClientClose::Eof);
                            break;
                        }
                    },

                    out = outbound_rx.recv() => match out {
                        Some(Outbound::Frame(text)) => {
                            if write.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        Some(Outbound::Close) | None => {
                            let _ = write.close().await;
                            break;
                        }
                    },
                }
            }
        });

        Self {
            url: format!("ws://127.0.0.1:{port}"),
            outbound,
            inbound,
            request_uri: Some(uri_rx),
            client_closed: Some(closed_rx),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Config builder pointed at this bus.
    pub fn builder(&self) -> BusConfigBuilder {
        BusConfig::builder().endpoint(self.url.clone())
    }

    pub fn config(&self) -> BusConfig {
        self.builder().build().expect("valid config")
    }

    /// Waits for the next frame the client sent.
    pub async fn next_request(&mut self) -> Value {
        timeout(WAIT, self.inbound.recv())
            .await
            .expect("request within timeout")
            .expect("bus still running")
    }

    /// Waits for the handshake and returns the request URI.
    pub async fn request_uri(&mut self) -> String {
        let rx = self.request_uri.take().expect("uri requested once");
        timeout(WAIT, rx)
            .await
            .expect("handshake within timeout")
            .expect("handshake completed")
    }

    /// Waits until the client closes its end of the socket.
    ///
    /// Panics if the client is still connected after the wait bound, or if
    /// the bus closed first.
    pub async fn client_closed(&mut self) -> ClientClose {
        let rx = self.client_closed.take().expect("close awaited once");
        timeout(WAIT, rx)
            .await
            .expect("client closed within timeout")
            .expect("bus saw the client leave")
    }

    /// Answers a request, echoing its token.
    pub fn reply(&self, request: &Value, retcode: i64, data: Value) {
        let (status, msg) = if retcode == 0 {
            ("ok", "")
        } else {
            ("failed", "mock failure")
        };
        self.push(json!({
            "status": status,
            "retcode": retcode,
            "data": data,
            "msg": msg,
            "echo": request["echo"].clone(),
        }));
    }

    pub fn push(&self, frame: Value) {
        self.send_raw(&frame.to_string());
    }

    pub fn send_raw(&self, text: &str) {
        let _ = self.outbound.send(Outbound::Frame(text.to_string()));
    }

    pub fn close(&self) {
        let _ = self.outbound.send(Outbound::Close);
    }
}

// ============================================================================
// Frame Builders
// ============================================================================

/// A group message with the given body segments.
pub fn group_message(group_id: u64, time: i64, segments: Value) -> Value {
    json!({
        "post_type": "message",
        "message_type": "group",
        "sub_type": "normal",
        "message_id": time,
        "group_id": group_id,
        "user_id": 10001,
        "time": time,
        "sender": {"user_id": 10001, "nickname": "alice", "card": ""},
        "message": segments,
    })
}

/// A group message holding one text segment.
pub fn text_message(group_id: u64, time: i64, text: &str) -> Value {
    group_message(group_id, time, json!([{"type": "text", "data": {"text": text}}]))
}

/// A group message holding only an image.
pub fn image_message(group_id: u64, time: i64) -> Value {
    group_message(group_id, time, json!([{"type": "image", "data": {"file": "x.png"}}]))
}
