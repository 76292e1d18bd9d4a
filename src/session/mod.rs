//! Collection sessions and reports.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `collector` | Time-bounded collection state machine |
//! | `report` | Report shared by fetch and collect flows |

// ============================================================================
// Submodules
// ============================================================================

/// Time-bounded collection of group messages.
pub mod collector;

/// Final report types.
pub mod report;

// ============================================================================
// Re-exports
// ============================================================================

pub use collector::{CollectionSession, DefaultFormatter, SessionState};
pub use report::{FinishReason, Report, Tally};
