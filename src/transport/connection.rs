//! WebSocket connection and event loop.
//!
//! This module owns the single duplex connection to the bus, including
//! request/response correlation and push-event routing.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that handles:
//!
//! - Incoming frames from the bus (responses, push events)
//! - Outgoing frames from the Rust API
//! - Request/response correlation by `echo` token
//! - Forwarding push events to the single event consumer
//!
//! When the loop exits, for whatever reason, it publishes the terminal
//! [`ConnectionState`] once and fails every pending request with
//! [`Error::ConnectionLost`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, to_string};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};

use crate::config::BusConfig;
use crate::error::{Error, Result};
use crate::protocol::{Event, InboundFrame, Request, decode};

use super::correlator::Correlator;

// ============================================================================
// Types
// ============================================================================

/// Receiving end of the push-event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Lifecycle of an established connection.
///
/// The connecting phase is the pending [`Connection::connect`] future, so a
/// `Connection` value always starts `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Frames flow both ways.
    Open,
    /// Closed in an orderly way, by either side.
    Closed,
    /// Terminated by a transport error.
    Failed,
}

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write one text frame.
    Send(String),
    /// Close the socket and stop.
    Shutdown,
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to the bus.
///
/// Exclusively owned by the flow that created it. Dropping the connection
/// shuts the socket down; [`Connection::close`] additionally waits for the
/// event loop to finish.
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Waiter table (shared with event loop).
    correlator: Arc<Mutex<Correlator>>,
    /// Push-event receiver until a consumer takes it.
    events: Mutex<Option<EventReceiver>>,
    /// Lifecycle state published by the event loop.
    state: watch::Receiver<ConnectionState>,
    /// Default per-request deadline.
    request_timeout: Duration,
    /// Event loop task.
    task: Option<JoinHandle<()>>,
}

impl Connection {
    /// Dials the configured endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectTimeout`] if the handshake exceeds the connect timeout
    /// - [`Error::ConnectFailed`] if the TCP connect or WebSocket upgrade fails
    pub async fn connect(config: &BusConfig) -> Result<Self> {
        let url = config.connect_url();
        let connect_timeout = config.connect_timeout();

        debug!(endpoint = %config.endpoint(), "Connecting to bus");

        let (ws_stream, _) = timeout(connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| Error::connect_timeout(connect_timeout.as_millis() as u64))?
            .map_err(|e| Error::connect_failed(e.to_string()))?;

        info!(endpoint = %config.endpoint(), "WebSocket connection established");

        Ok(Self::new(ws_stream, config.request_timeout()))
    }

    /// Creates a connection from an established WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    pub(crate) fn new<S>(ws_stream: WebSocketStream<S>, request_timeout: Duration) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Open);
        let correlator = Arc::new(Mutex::new(Correlator::new()));

        let task = tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            Arc::clone(&correlator),
            event_tx,
            state_tx,
        ));

        Self {
            command_tx,
            correlator,
            events: Mutex::new(Some(event_rx)),
            state: state_rx,
            request_timeout,
            task: Some(task),
        }
    }

    /// Takes the push-event receiver.
    ///
    /// Events are delivered in arrival order to exactly one consumer, so
    /// this returns `Some` only on the first call.
    pub fn take_events(&self) -> Option<EventReceiver> {
        self.events.lock().take()
    }

    /// Sends one text frame without waiting for anything in return.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if the connection is no longer open.
    pub fn send_frame(&self, frame: String) -> Result<()> {
        if !self.is_open() {
            return Err(Error::NotConnected);
        }

        self.command_tx
            .send(ConnectionCommand::Send(frame))
            .map_err(|_| Error::NotConnected)
    }

    /// Calls an action and waits for its result with the default timeout.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the connection is already closed
    /// - [`Error::RequestTimeout`] if no response arrives within the timeout
    /// - [`Error::ConnectionLost`] if the connection closes while waiting
    /// - [`Error::RemoteError`] if the bus reports a non-zero `retcode`
    /// - [`Error::Protocol`] if too many requests are pending
    pub async fn request(&self, action: &str, params: Value) -> Result<Value> {
        self.request_with_timeout(action, params, self.request_timeout)
            .await
    }

    /// Calls an action and waits for its result with a custom timeout.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::request`].
    pub async fn request_with_timeout(
        &self,
        action: &str,
        params: Value,
        request_timeout: Duration,
    ) -> Result<Value> {
        // Register before checking the state: a loop exiting after this
        // point fails the entry, one that already exited fails the send.
        let (token, response_rx) = self.correlator.lock().register(action)?;

        let sent = to_string(&Request::new(action, params, token))
            .map_err(Error::from)
            .and_then(|frame| self.send_frame(frame));

        if let Err(e) = sent {
            self.correlator.lock().cancel(&token);
            return Err(e);
        }

        trace!(%token, action, "Request sent");

        match timeout(request_timeout, response_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionLost),
            Err(_) => {
                self.correlator.lock().cancel(&token);
                Err(Error::request_timeout(
                    action,
                    request_timeout.as_millis() as u64,
                ))
            }
        }
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Returns `true` while frames can still be sent.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Waits until the connection leaves [`ConnectionState::Open`].
    ///
    /// Resolves with the terminal state. The transition happens once per
    /// connection.
    pub async fn closed(&self) -> ConnectionState {
        let mut state = self.state.clone();
        if let Ok(terminal) = state.wait_for(|s| *s != ConnectionState::Open).await {
            return *terminal;
        }
        *state.borrow()
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.correlator.lock().pending_count()
    }

    /// Asks the event loop to close the socket.
    ///
    /// Called automatically on drop.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Closes the socket and waits for the event loop to finish.
    pub async fn close(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Event loop task failed");
        }
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        correlator: Arc<Mutex<Correlator>>,
        event_tx: mpsc::UnboundedSender<Event>,
        state_tx: watch::Sender<ConnectionState>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let terminal = loop {
            tokio::select! {
                // Incoming frames from the bus
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::handle_incoming_message(text.as_str(), &correlator, &event_tx);
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by remote");
                            break ConnectionState::Closed;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break ConnectionState::Failed;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break ConnectionState::Closed;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                // Commands from Rust API
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send(frame)) => {
                            if let Err(e) = Self::write_frame(&mut ws_write, frame).await {
                                warn!(error = %e, "Failed to send frame");
                                break ConnectionState::Failed;
                            }
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break ConnectionState::Closed;
                        }

                        None => {
                            debug!("Command channel closed");
                            let _ = ws_write.close().await;
                            break ConnectionState::Closed;
                        }
                    }
                }
            }
        };

        // Publish the state before failing waiters; see request_with_timeout.
        state_tx.send_replace(terminal);
        correlator.lock().fail_all();

        debug!(state = ?terminal, "Event loop terminated");
    }

    /// Handles an incoming text frame from the bus.
    fn handle_incoming_message(
        text: &str,
        correlator: &Arc<Mutex<Correlator>>,
        event_tx: &mpsc::UnboundedSender<Event>,
    ) {
        match decode(text) {
            Ok(InboundFrame::Response(response)) => {
                correlator.lock().resolve(response);
            }

            Ok(InboundFrame::Push(event)) => {
                trace!(post_type = %event.post_type, detail = ?event.detail_type(), "Push event");
                if event_tx.send(event).is_err() {
                    trace!("No event consumer, push event dropped");
                }
            }

            Err(e) => {
                trace!(error = %e, "Discarding inbound frame");
            }
        }
    }

    /// Writes one text frame to the socket.
    async fn write_frame<S>(
        ws_write: &mut SplitSink<WebSocketStream<S>, Message>,
        frame: String,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        ws_write.send(Message::Text(frame.into())).await?;
        trace!("Frame sent");
        Ok(())
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // The connection is never shared, so the last owner closes it.
        self.shutdown();
    }
}

// ============================================================================
// Tests
// ============================================================================
