//! Event message types.
//!
//! Events are unsolicited push frames the bus emits whenever something
//! happens: a message arrives, a member joins, a heartbeat ticks.
//!
//! # Event Types
//!
//! | `post_type` | Detail key | Examples |
//! |-------------|------------|----------|
//! | `message` | `message_type` | `group`, `private` |
//! | `notice` | `notice_type` | `group_increase`, `group_recall` |
//! | `request` | `request_type` | `friend`, `group` |
//! | `meta_event` | `meta_event_type` | `heartbeat`, `lifecycle` |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::identifiers::{GroupId, UserId};

// ============================================================================
// Event
// ============================================================================

/// A push event from the bus.
///
/// The payload is kept untyped until [`Event::parse`] is called, so frames
/// the client does not model still travel through the event channel.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Top-level discriminator.
    pub post_type: String,

    /// Every other field of the frame.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Event {
    /// Returns the subtype for this event's `post_type`, if present.
    ///
    /// Together with `post_type` this forms the event's scope pair.
    #[must_use]
    pub fn detail_type(&self) -> Option<&str> {
        let key = match self.post_type.as_str() {
            "message" | "message_sent" => "message_type",
            "notice" => "notice_type",
            "request" => "request_type",
            "meta_event" => "meta_event_type",
            _ => return None,
        };

        self.payload.get(key).and_then(Value::as_str)
    }

    /// Returns the `group_id` field, if the event carries one.
    #[inline]
    #[must_use]
    pub fn group_id(&self) -> Option<GroupId> {
        self.payload
            .get("group_id")
            .and_then(Value::as_u64)
            .map(GroupId::new)
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        let detail = self.detail_type().unwrap_or_default();

        match (self.post_type.as_str(), detail) {
            ("message", "group") => self
                .message()
                .map(ParsedEvent::GroupMessage)
                .unwrap_or_else(|_| self.unknown()),

            ("message", "private") => self
                .message()
                .map(ParsedEvent::PrivateMessage)
                .unwrap_or_else(|_| self.unknown()),

            ("notice", _) => ParsedEvent::Notice {
                notice_type: detail.to_string(),
                group_id: self.group_id(),
            },

            ("request", _) => ParsedEvent::Request {
                request_type: detail.to_string(),
            },

            ("meta_event", _) => ParsedEvent::MetaEvent {
                meta_event_type: detail.to_string(),
            },

            _ => self.unknown(),
        }
    }

    /// Decodes the payload as a chat message.
    fn message(&self) -> Result<MessageEvent> {
        Ok(MessageEvent::deserialize(Value::Object(self.payload.clone()))?)
    }

    fn unknown(&self) -> ParsedEvent {
        ParsedEvent::Unknown {
            post_type: self.post_type.clone(),
            payload: Value::Object(self.payload.clone()),
        }
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Parsed event types for type-safe handling.
#[derive(Debug, Clone)]
pub enum ParsedEvent {
    /// Message posted in a group.
    GroupMessage(MessageEvent),

    /// Direct message.
    PrivateMessage(MessageEvent),

    /// Notice such as a recall or member change.
    Notice {
        /// Notice subtype.
        notice_type: String,
        /// Group the notice concerns, if any.
        group_id: Option<GroupId>,
    },

    /// Friend or group join request.
    Request {
        /// Request subtype.
        request_type: String,
    },

    /// Heartbeat or lifecycle tick.
    MetaEvent {
        /// Meta event subtype.
        meta_event_type: String,
    },

    /// Unknown or undecodable event.
    Unknown {
        /// Event `post_type`.
        post_type: String,
        /// Remaining fields.
        payload: Value,
    },
}

// ============================================================================
// MessageEvent
// ============================================================================

/// A chat message, either pushed live or returned by a history fetch.
///
/// History items and live events share this shape, so both flows feed the
/// same formatter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageEvent {
    /// Bus-assigned message ID.
    #[serde(default)]
    pub message_id: Option<i64>,

    /// `group` or `private`.
    #[serde(default)]
    pub message_type: Option<String>,

    /// Group the message was posted in.
    #[serde(default)]
    pub group_id: Option<GroupId>,

    /// Author user number.
    #[serde(default)]
    pub user_id: Option<UserId>,

    /// Author details.
    #[serde(default)]
    pub sender: Sender,

    /// Epoch seconds.
    #[serde(default)]
    pub time: i64,

    /// Message body segments.
    #[serde(default)]
    pub message: Vec<Segment>,
}

// ============================================================================
// Sender
// ============================================================================

/// Author details attached to a message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sender {
    /// Account nickname.
    #[serde(default)]
    pub nickname: Option<String>,

    /// Group card (per-group display name).
    #[serde(default)]
    pub card: Option<String>,

    /// User number.
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl Sender {
    /// Returns the group card, falling back to the nickname.
    ///
    /// Blank values are skipped.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        [self.card.as_deref(), self.nickname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
    }
}

// ============================================================================
// Segment
// ============================================================================

/// One piece of a message body.
///
/// # Format
///
/// ```json
/// { "type": "text", "data": { "text": "hello" } }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Segment {
    /// Segment kind (`text`, `image`, `face`, `at`, ...).
    #[serde(rename = "type")]
    pub kind: String,

    /// Kind-specific data.
    #[serde(default)]
    pub data: Value,
}

impl Segment {
    /// Returns the text of a `text` segment.
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        if self.kind != "text" {
            return None;
        }
        self.data.get("text").and_then(Value::as_str)
    }
}

// ============================================================================
// Tests
// ============================================================================
