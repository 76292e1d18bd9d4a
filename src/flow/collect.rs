//! Live collection over a bounded window.
//!
//! Connects, runs a [`CollectionSession`] on the connection's push events
//! and closes the connection once the session finalizes.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::config::BusConfig;
use crate::error::{Error, Result};
use crate::identifiers::GroupId;
use crate::protocol::MessageEvent;
use crate::record::{CollectedRecord, format_record};
use crate::session::{CollectionSession, Report};
use crate::transport::Connection;

// ============================================================================
// Collect
// ============================================================================

/// Collects text messages of a group with [`format_record`].
///
/// # Errors
///
/// See [`collect_messages_with`].
pub async fn collect_messages<C>(
    config: &BusConfig,
    group_id: GroupId,
    window: Duration,
    cancel: C,
) -> Result<Report>
where
    C: Future<Output = ()>,
{
    collect_messages_with(config, group_id, window, format_record, cancel).await
}

/// Collects text messages of a group with a custom formatter.
///
/// Ends when `window` elapses, `cancel` resolves, or the bus closes the
/// connection. All three yield a report; the report's `end_reason` says
/// which one happened.
///
/// # Errors
///
/// Returns connection errors from [`Connection::connect`]. Once connected,
/// the flow always produces a report.
pub async fn collect_messages_with<F, C>(
    config: &BusConfig,
    group_id: GroupId,
    window: Duration,
    formatter: F,
    cancel: C,
) -> Result<Report>
where
    F: Fn(&MessageEvent) -> Option<CollectedRecord>,
    C: Future<Output = ()>,
{
    let connection = Connection::connect(config).await?;
    let events = connection
        .take_events()
        .ok_or_else(|| Error::invalid_state("event stream already taken"))?;

    info!(
        group = %group_id,
        window_secs = window.as_secs(),
        "Listening for group messages"
    );

    let session = CollectionSession::with_formatter(group_id, window, formatter);
    let report = session.run(events, cancel).await;

    connection.close().await;
    report
}
