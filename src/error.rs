//! Error types for the NapCat bus client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use napcat_bus::{Connection, Result};
//!
//! async fn example(connection: &Connection) -> Result<()> {
//!     let info = connection.request("get_login_info", serde_json::json!({})).await?;
//!     println!("{info}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::ConnectTimeout`], [`Error::ConnectFailed`], [`Error::NotConnected`], [`Error::ConnectionLost`] |
//! | Request | [`Error::RequestTimeout`], [`Error::RemoteError`] |
//! | Protocol | [`Error::MalformedFrame`], [`Error::Protocol`], [`Error::InvalidState`] |
//! | External | [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when the endpoint, credential or limits are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The WebSocket handshake did not finish in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The WebSocket handshake failed.
    #[error("Connection failed: {message}")]
    ConnectFailed {
        /// Description of the connection error.
        message: String,
    },

    /// A frame was sent on a connection that is no longer open.
    #[error("Not connected")]
    NotConnected,

    /// The connection closed while a request was in flight.
    #[error("Connection lost")]
    ConnectionLost,

    // ========================================================================
    // Request Errors
    // ========================================================================
    /// No response arrived for an action before its deadline.
    #[error("Request {action} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The action that timed out.
        action: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The bus answered with a non-zero `retcode`.
    #[error("Remote error {code}: {message}")]
    RemoteError {
        /// The bus `retcode`.
        code: i64,
        /// The bus `msg` / `wording`.
        message: String,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// An inbound frame could not be understood.
    ///
    /// Never surfaced by the connection: the event loop drops these.
    #[error("Malformed frame: {message}")]
    MalformedFrame {
        /// Why the frame was rejected.
        message: String,
    },

    /// Protocol violation or unexpected payload shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// An operation was invoked in the wrong lifecycle state.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the misuse.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Endpoint URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connect timeout error.
    #[inline]
    pub fn connect_timeout(timeout_ms: u64) -> Self {
        Self::ConnectTimeout { timeout_ms }
    }

    /// Creates a connect failed error.
    #[inline]
    pub fn connect_failed(message: impl Into<String>) -> Self {
        Self::ConnectFailed {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(action: impl Into<String>, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            action: action.into(),
            timeout_ms,
        }
    }

    /// Creates a remote error.
    #[inline]
    pub fn remote(code: i64, message: impl Into<String>) -> Self {
        Self::RemoteError {
            code,
            message: message.into(),
        }
    }

    /// Creates a malformed frame error.
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates an invalid state error.
    #[inline]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout { .. }
                | Self::ConnectFailed { .. }
                | Self::NotConnected
                | Self::ConnectionLost
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the bus itself reported the failure.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteError { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connect_failed("refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_request_timeout_display() {
        let err = Error::request_timeout("get_group_msg_history", 15000);
        assert_eq!(
            err.to_string(),
            "Request get_group_msg_history timed out after 15000ms"
        );
    }

    #[test]
    fn test_remote_error_display() {
        let err = Error::remote(1404, "group not found");
        assert_eq!(err.to_string(), "Remote error 1404: group not found");
        assert!(err.is_remote());
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::connect_timeout(5000).is_timeout());
        assert!(Error::request_timeout("x", 1).is_timeout());
        assert!(!Error::ConnectionLost.is_timeout());
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connect_failed("test").is_connection_error());
        assert!(Error::connect_timeout(1000).is_connection_error());
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::ConnectionLost.is_connection_error());
        assert!(!Error::config("test").is_connection_error());
        assert!(!Error::remote(1, "x").is_connection_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_from_url_error() {
        let url_err = url::Url::parse("not a url").unwrap_err();
        let err: Error = url_err.into();
        assert!(matches!(err, Error::Url(_)));
    }
}
