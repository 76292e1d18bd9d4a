//! Time-bounded collection of group messages.
//!
//! A [`CollectionSession`] is an explicit state machine:
//!
//! ```text
//! Idle ──start()──► Collecting ──finalize()──► Finalized
//! ```
//!
//! While collecting, [`CollectionSession::accept`] is the only way records
//! enter the buffer, so the buffer grows append-only in arrival order.
//! [`CollectionSession::run`] races the window timer, an external cancel
//! signal and the end of the event stream; whichever fires first finalizes.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::mem;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::sleep;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::GroupId;
use crate::protocol::{Event, MessageEvent, ParsedEvent};
use crate::record::{CollectedRecord, format_record};
use crate::transport::EventReceiver;

use super::report::{FinishReason, Report};

// ============================================================================
// Types
// ============================================================================

/// Formatter used when none is injected.
pub type DefaultFormatter = fn(&MessageEvent) -> Option<CollectedRecord>;

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not yet started.
    Idle,
    /// Accepting events.
    Collecting,
    /// Sealed; the report has been produced.
    Finalized,
}

// ============================================================================
// CollectionSession
// ============================================================================

/// Collects text messages for one group over a bounded window.
pub struct CollectionSession<F = DefaultFormatter> {
    group_id: GroupId,
    window: Duration,
    formatter: F,
    state: SessionState,
    started_at: Option<DateTime<Local>>,
    buffer: Vec<CollectedRecord>,
}

impl CollectionSession<DefaultFormatter> {
    /// Creates a session using [`format_record`].
    #[must_use]
    pub fn new(group_id: GroupId, window: Duration) -> Self {
        Self::with_formatter(group_id, window, format_record)
    }
}

impl<F> CollectionSession<F>
where
    F: Fn(&MessageEvent) -> Option<CollectedRecord>,
{
    /// Creates a session with an injected formatter.
    #[must_use]
    pub fn with_formatter(group_id: GroupId, window: Duration, formatter: F) -> Self {
        Self {
            group_id,
            window,
            formatter,
            state: SessionState::Idle,
            started_at: None,
            buffer: Vec::new(),
        }
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the number of records buffered so far.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if nothing has been buffered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Moves the session from `Idle` to `Collecting`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the session was already started.
    pub fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(Error::invalid_state(format!(
                "cannot start a session that is {:?}",
                self.state
            )));
        }

        self.state = SessionState::Collecting;
        self.started_at = Some(Local::now());

        debug!(group = %self.group_id, window_ms = self.window.as_millis() as u64, "Collection started");
        Ok(())
    }

    /// Offers one push event to the buffer.
    ///
    /// Returns `true` if a record was appended: the session is collecting,
    /// the event is a message for the target group, and the formatter
    /// produced a record.
    pub fn accept(&mut self, event: &Event) -> bool {
        if self.state != SessionState::Collecting {
            return false;
        }

        // Cheap scope check before decoding the body.
        if event.post_type != "message" || event.group_id() != Some(self.group_id) {
            return false;
        }

        let message = match event.parse() {
            ParsedEvent::GroupMessage(message) if message.group_id == Some(self.group_id) => {
                message
            }
            _ => return false,
        };

        let Some(record) = (self.formatter)(&message) else {
            trace!(message_id = ?message.message_id, "Skipping message without text");
            return false;
        };

        info!(
            group = %self.group_id,
            sender = %record.sender,
            count = self.buffer.len() + 1,
            "Collected message"
        );

        self.buffer.push(record);
        true
    }

    /// Seals the buffer and produces the report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the session is collecting, so
    /// the report is produced at most once.
    pub fn finalize(&mut self, reason: FinishReason) -> Result<Report> {
        if self.state != SessionState::Collecting {
            return Err(Error::invalid_state(format!(
                "cannot finalize a session that is {:?}",
                self.state
            )));
        }

        self.state = SessionState::Finalized;

        let started_at = self.started_at.unwrap_or_else(Local::now);
        let messages = mem::take(&mut self.buffer);

        info!(
            group = %self.group_id,
            count = messages.len(),
            reason = ?reason,
            "Collection finished"
        );

        Ok(Report::collected(
            self.group_id,
            self.window,
            reason,
            started_at,
            Local::now(),
            messages,
        ))
    }

    /// Runs the session to completion.
    ///
    /// Starts the session, feeds it events until the window elapses, the
    /// `cancel` future resolves, or the stream ends, then finalizes. A
    /// cancelled or interrupted session still yields the records buffered so
    /// far.
    ///
    /// When the window elapses, events already queued on the channel are
    /// still offered to [`CollectionSession::accept`] before finalizing, so
    /// nothing delivered inside the window is lost. Cancellation stops
    /// immediately and leaves the queue untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the session was already started.
    pub async fn run<C>(mut self, mut events: EventReceiver, cancel: C) -> Result<Report>
    where
        C: Future<Output = ()>,
    {
        self.start()?;

        let deadline = sleep(self.window);
        tokio::pin!(deadline);
        tokio::pin!(cancel);

        let reason = loop {
            tokio::select! {
                biased;

                () = &mut cancel => break FinishReason::Cancelled,

                () = &mut deadline => {
                    let drained = self.drain(&mut events);
                    if drained > 0 {
                        debug!(group = %self.group_id, drained, "Accepted events queued at the deadline");
                    }
                    break FinishReason::Deadline;
                }

                event = events.recv() => match event {
                    Some(event) => {
                        self.accept(&event);
                    }
                    None => {
                        warn!(group = %self.group_id, "Event stream ended before the window elapsed");
                        break FinishReason::ConnectionLost;
                    }
                },
            }
        };

        self.finalize(reason)
    }

    /// Offers every event already queued on `events`, without waiting.
    ///
    /// Returns the number of records appended.
    fn drain(&mut self, events: &mut EventReceiver) -> usize {
        let mut accepted = 0;
        while let Ok(event) = events.try_recv() {
            if self.accept(&event) {
                accepted += 1;
            }
        }
        accepted
    }
}

// ============================================================================
// Tests
// ============================================================================
