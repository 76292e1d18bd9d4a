//! Final report shared by the fetch and collect flows.
//!
//! # Format
//!
//! ```json
//! {
//!   "success": true,
//!   "group_id": 123456,
//!   "fetched_count": 2,
//!   "requested_count": 3,
//!   "start_time": "2026-10-19T10:00:00+08:00",
//!   "end_time": "2026-10-19T10:00:01+08:00",
//!   "messages": [ ... ]
//! }
//! ```
//!
//! A collect report carries `collected_count`, `duration_minutes` and
//! `end_reason` in place of the two fetch counters.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::identifiers::GroupId;
use crate::record::CollectedRecord;

// ============================================================================
// FinishReason
// ============================================================================

/// Why a collection session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The collection window elapsed.
    Deadline,
    /// Stopped from outside (e.g., Ctrl+C).
    Cancelled,
    /// The bus closed the connection first.
    ConnectionLost,
}

// ============================================================================
// Tally
// ============================================================================

/// Mode-specific counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Tally {
    /// One-shot history fetch.
    Fetched {
        /// Records kept.
        fetched_count: usize,
        /// Batch size asked for.
        requested_count: u32,
    },
    /// Live collection window.
    Collected {
        /// Records kept.
        collected_count: usize,
        /// Window length.
        duration_minutes: f64,
        /// What ended the window.
        end_reason: FinishReason,
    },
}

// ============================================================================
// Report
// ============================================================================

/// Immutable result of a fetch or collection.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    success: bool,
    group_id: GroupId,
    #[serde(flatten)]
    tally: Tally,
    start_time: DateTime<Local>,
    end_time: DateTime<Local>,
    messages: Vec<CollectedRecord>,
}

impl Report {
    /// Builds a fetch report.
    #[must_use]
    pub fn fetched(
        group_id: GroupId,
        requested_count: u32,
        start_time: DateTime<Local>,
        end_time: DateTime<Local>,
        messages: Vec<CollectedRecord>,
    ) -> Self {
        Self {
            success: true,
            group_id,
            tally: Tally::Fetched {
                fetched_count: messages.len(),
                requested_count,
            },
            start_time,
            end_time: end_time.max(start_time),
            messages,
        }
    }

    /// Builds a collection report.
    #[must_use]
    pub fn collected(
        group_id: GroupId,
        window: Duration,
        end_reason: FinishReason,
        start_time: DateTime<Local>,
        end_time: DateTime<Local>,
        messages: Vec<CollectedRecord>,
    ) -> Self {
        Self {
            success: true,
            group_id,
            tally: Tally::Collected {
                collected_count: messages.len(),
                duration_minutes: window.as_secs_f64() / 60.0,
                end_reason,
            },
            start_time,
            end_time: end_time.max(start_time),
            messages,
        }
    }

    /// Returns the target group.
    #[inline]
    #[must_use]
    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    /// Returns the mode-specific counters.
    #[inline]
    #[must_use]
    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Returns the number of records.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.messages.len()
    }

    /// Returns why collection stopped; `None` for fetch reports.
    #[must_use]
    pub fn end_reason(&self) -> Option<FinishReason> {
        match self.tally {
            Tally::Collected { end_reason, .. } => Some(end_reason),
            Tally::Fetched { .. } => None,
        }
    }

    /// Returns when the flow started.
    #[inline]
    #[must_use]
    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    /// Returns when the flow finished. Never earlier than the start.
    #[inline]
    #[must_use]
    pub fn end_time(&self) -> DateTime<Local> {
        self.end_time
    }

    /// Returns the records in arrival order.
    #[inline]
    #[must_use]
    pub fn messages(&self) -> &[CollectedRecord] {
        &self.messages
    }
}

// ============================================================================
// Tests
// ============================================================================
