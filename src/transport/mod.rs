//! WebSocket transport layer.
//!
//! This module owns the duplex connection to the bus and the table that
//! pairs replies with the requests that caused them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                         ┌─────────────────┐
//! │  Connection (Rust)   │        WebSocket        │  NapCat         │
//! │                      │◄───────────────────────►│  (OneBot 11)    │
//! │  event loop task     │   ws://host:port        │                 │
//! │   ├─ Correlator      │                         │                 │
//! │   └─ event channel   │                         │                 │
//! └──────────────────────┘                         └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::connect` - Dial the endpoint (bounded by a timeout)
//! 2. `Connection::request` - Send actions, await correlated replies
//! 3. `Connection::take_events` - Consume push events in arrival order
//! 4. `Connection::close` - Close the socket (also on drop)
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `correlator` | Pending request table keyed by echo token |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Request/response correlation.
pub mod correlator;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, ConnectionState, EventReceiver};
pub use correlator::{Correlator, MAX_PENDING_REQUESTS};
