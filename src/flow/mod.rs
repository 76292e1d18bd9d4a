//! End-to-end flows.
//!
//! Each flow owns its own [`Connection`](crate::transport::Connection) and
//! closes it on every exit path.
//!
//! | Flow | Description |
//! |------|-------------|
//! | [`fetch_history`] | One correlated `get_group_msg_history` request |
//! | [`collect_messages`] | Live push events over a bounded window |

// ============================================================================
// Submodules
// ============================================================================

/// Live collection flow.
pub mod collect;

/// One-shot history fetch flow.
pub mod fetch;

// ============================================================================
// Re-exports
// ============================================================================

pub use collect::{collect_messages, collect_messages_with};
pub use fetch::{fetch_history, fetch_history_with, history_items};
