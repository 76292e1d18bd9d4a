//! Collected records and the default formatter.
//!
//! Both flows turn [`MessageEvent`]s into [`CollectedRecord`]s through a
//! formatter `Fn(&MessageEvent) -> Option<CollectedRecord>`. The default,
//! [`format_record`], keeps only messages that contain text; images,
//! stickers and other non-text bodies yield `None` and are dropped.

// ============================================================================
// Imports
// ============================================================================

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::identifiers::UserId;
use crate::protocol::{MessageEvent, Segment};

// ============================================================================
// Constants
// ============================================================================

/// Sender name used when the message carries no usable identity.
const UNKNOWN_SENDER: &str = "unknown";

/// Layout of [`CollectedRecord::time_str`].
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// CollectedRecord
// ============================================================================

/// One message as it appears in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectedRecord {
    /// Group card, nickname, or user number.
    pub sender: String,

    /// Author user number, when known.
    pub user_id: Option<UserId>,

    /// Epoch seconds.
    pub time: i64,

    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub time_str: String,

    /// Extracted text content. Never empty.
    pub text: String,
}

// ============================================================================
// Formatting
// ============================================================================

/// Concatenates the text of every `text` segment and trims the result.
///
/// Returns an empty string if the message has no text.
#[must_use]
pub fn extract_text(segments: &[Segment]) -> String {
    let joined: String = segments.iter().filter_map(Segment::text).collect();
    joined.trim().to_string()
}

/// Formats a message, or returns `None` if it carries no text.
#[must_use]
pub fn format_record(message: &MessageEvent) -> Option<CollectedRecord> {
    let text = extract_text(&message.message);
    if text.is_empty() {
        return None;
    }

    let user_id = message.user_id.or(message.sender.user_id);
    let sender = match (message.sender.display_name(), user_id) {
        (Some(name), _) => name.to_string(),
        (None, Some(id)) => id.to_string(),
        (None, None) => UNKNOWN_SENDER.to_string(),
    };

    Some(CollectedRecord {
        sender,
        user_id,
        time: message.time,
        time_str: format_timestamp(message.time),
        text,
    })
}

/// Renders epoch seconds as local time.
///
/// Out-of-range values render as an empty string.
#[must_use]
pub fn format_timestamp(secs: i64) -> String {
    DateTime::from_timestamp(secs, 0)
        .map(|utc| utc.with_timezone(&Local).format(TIME_FORMAT).to_string())
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
