//! Inbound frame classification.
//!
//! Every text frame from the bus is either a reply to one of our requests
//! or an unsolicited push event. The two share one socket, so each frame is
//! tagged here before the connection routes it.
//!
//! | Shape | Tag |
//! |-------|-----|
//! | `echo` parses as an [`EchoToken`] | [`InboundFrame::Response`] |
//! | string `post_type` | [`InboundFrame::Push`] |
//! | anything else | [`Error::MalformedFrame`] |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::EchoToken;

use super::{Event, Response};

// ============================================================================
// InboundFrame
// ============================================================================

/// A classified inbound frame.
#[derive(Debug, Clone)]
pub enum InboundFrame {
    /// Reply to a pending request.
    Response(Response),
    /// Unsolicited notification.
    Push(Event),
}

// ============================================================================
// Classification
// ============================================================================

/// Decodes and classifies one text frame.
///
/// # Errors
///
/// Returns [`Error::MalformedFrame`] if the frame is not JSON, or matches
/// neither the response nor the push-event shape.
pub fn decode(text: &str) -> Result<InboundFrame> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| Error::malformed(format!("invalid JSON: {e}")))?;

    if !value.is_object() {
        return Err(Error::malformed("frame is not an object"));
    }

    let carries_token = value
        .get("echo")
        .and_then(Value::as_str)
        .is_some_and(|echo| echo.parse::<EchoToken>().is_ok());

    if carries_token {
        let response = Response::deserialize(value)
            .map_err(|e| Error::malformed(format!("bad response: {e}")))?;
        return Ok(InboundFrame::Response(response));
    }

    if value.get("post_type").is_some_and(Value::is_string) {
        let event =
            Event::deserialize(value).map_err(|e| Error::malformed(format!("bad event: {e}")))?;
        return Ok(InboundFrame::Push(event));
    }

    Err(Error::malformed("neither response nor push event"))
}

/// Classifies one text frame, discarding anything [`decode`] rejects.
#[inline]
#[must_use]
pub fn classify(text: &str) -> Option<InboundFrame> {
    decode(text).ok()
}

// ============================================================================
// Tests
// ============================================================================
