//! Request and Response message types.
//!
//! Defines the OneBot 11 action frame sent to the bus and the reply frame
//! it answers with. The `echo` field carries the correlation token verbatim
//! in both directions.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::EchoToken;

// ============================================================================
// Actions
// ============================================================================

/// Fetches a bounded batch of recent messages for one group.
pub const GET_GROUP_MSG_HISTORY: &str = "get_group_msg_history";

// ============================================================================
// Request
// ============================================================================

/// An action request from the client to the bus.
///
/// # Format
///
/// ```json
/// {
///   "action": "get_group_msg_history",
///   "params": { "group_id": 123456, "count": 20 },
///   "echo": "1:1760870400123"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// Action name.
    pub action: String,

    /// Action parameters.
    pub params: Value,

    /// Correlation token echoed back by the bus.
    pub echo: EchoToken,
}

impl Request {
    /// Creates a new request.
    #[inline]
    #[must_use]
    pub fn new(action: impl Into<String>, params: Value, echo: EchoToken) -> Self {
        Self {
            action: action.into(),
            params,
            echo,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// A reply from the bus to a request.
///
/// # Format
///
/// Success:
/// ```json
/// { "status": "ok", "retcode": 0, "data": { ... }, "echo": "1:1760870400123" }
/// ```
///
/// Error:
/// ```json
/// { "status": "failed", "retcode": 1404, "data": null, "msg": "...", "echo": "..." }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    /// Matches the request `echo`.
    pub echo: EchoToken,

    /// `ok`, `async` or `failed`. Informational only; `retcode` decides.
    #[serde(default)]
    pub status: Option<String>,

    /// Zero on success.
    pub retcode: i64,

    /// Result data.
    #[serde(default)]
    pub data: Value,

    /// Short error message.
    #[serde(default)]
    pub msg: Option<String>,

    /// Human-facing error message.
    #[serde(default)]
    pub wording: Option<String>,
}

impl Response {
    /// Returns `true` if the bus reported success.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.retcode == 0
    }

    /// Extracts the data value, returning error if the bus reported failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteError`] if `retcode` is non-zero.
    pub fn into_result(self) -> Result<Value> {
        if self.is_success() {
            return Ok(self.data);
        }

        let message = [self.msg, self.wording]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "unknown error".to_string());

        Err(Error::remote(self.retcode, message))
    }
}

// ============================================================================
// Tests
// ============================================================================
