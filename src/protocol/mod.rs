//! OneBot 11 protocol message types.
//!
//! This module defines the frames exchanged with the bus.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Client → Bus | Action call tagged with `echo` |
//! | `Response` | Bus → Client | Action result carrying the same `echo` |
//! | `Event` | Bus → Client | Unsolicited notification (`post_type`) |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | Event, message and segment types |
//! | `frame` | Inbound frame classification |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Push event types.
pub mod event;

/// Inbound frame classifier.
pub mod frame;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{Event, MessageEvent, ParsedEvent, Segment, Sender};
pub use frame::{InboundFrame, classify, decode};
pub use request::{GET_GROUP_MSG_HISTORY, Request, Response};
