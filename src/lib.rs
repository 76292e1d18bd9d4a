//! NapCat bus client - correlated requests and bounded event collection.
//!
//! This library talks to a NapCat (OneBot 11) endpoint over one WebSocket
//! and serves two needs on top of it:
//!
//! - **Fetch**: send one action, wait for the reply that carries its `echo`
//! - **Collect**: accumulate pushed group messages for a bounded window
//!
//! # Architecture
//!
//! A single connection carries replies and unsolicited events interleaved
//! in arrival order. The connection's event loop classifies each frame and
//! routes it:
//!
//! ```text
//! WebSocket ─► classify ─┬─► Correlator (echo token) ─► waiting request
//!                        └─► event channel ─────────► CollectionSession
//! ```
//!
//! Key design principles:
//!
//! - Each flow owns its connection and closes it on every exit path
//! - Correlation tokens come from a per-connection counter
//! - Malformed or unmatched frames are dropped, never fatal
//! - Collection is an explicit state machine; partial results are valid
//!
//! # Quick Start
//!
//! ```no_run
//! use napcat_bus::{BusConfig, GroupId, Result};
//! use napcat_bus::flow::fetch_history;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = BusConfig::builder()
//!         .endpoint("ws://127.0.0.1:3001")
//!         .build()?;
//!
//!     let report = fetch_history(&config, GroupId::new(123456), 20).await?;
//!     println!("{} messages", report.count());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cli`] | Argument parsing and output helpers for the binaries |
//! | [`config`] | Connection configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`flow`] | Fetch and collect flows |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | OneBot 11 frame types and classifier |
//! | [`record`] | Collected records and text extraction |
//! | [`session`] | Collection session and report |
//! | [`transport`] | WebSocket connection and correlator |

// ============================================================================
// Modules
// ============================================================================

/// Command-line plumbing shared by the binaries.
pub mod cli;

/// Connection configuration.
///
/// Use [`BusConfig::builder()`] to create a validated configuration.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Fetch and collect flows.
pub mod flow;

/// Type-safe identifiers for bus entities.
pub mod identifiers;

/// OneBot 11 protocol message types.
pub mod protocol;

/// Collected records and the default formatter.
pub mod record;

/// Collection sessions and reports.
pub mod session;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::{BusConfig, BusConfigBuilder};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{EchoToken, GroupId, UserId};

// Records and reports
pub use record::{CollectedRecord, extract_text, format_record};
pub use session::{CollectionSession, FinishReason, Report, SessionState};

// Transport
pub use transport::{Connection, ConnectionState};
