//! One-shot history fetch.
//!
//! Connects, issues a single `get_group_msg_history` request, formats the
//! returned batch and closes the connection, whatever the outcome.

// ============================================================================
// Imports
// ============================================================================

use chrono::Local;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::config::BusConfig;
use crate::error::{Error, Result};
use crate::identifiers::GroupId;
use crate::protocol::{GET_GROUP_MSG_HISTORY, MessageEvent};
use crate::record::{CollectedRecord, format_record};
use crate::session::Report;
use crate::transport::Connection;

// ============================================================================
// Fetch
// ============================================================================

/// Fetches up to `count` recent messages of a group with [`format_record`].
///
/// # Errors
///
/// See [`fetch_history_with`].
pub async fn fetch_history(config: &BusConfig, group_id: GroupId, count: u32) -> Result<Report> {
    fetch_history_with(config, group_id, count, format_record).await
}

/// Fetches up to `count` recent messages of a group with a custom formatter.
///
/// Items the formatter rejects (no text) are left out of the report; the
/// report still records `count` as the requested size.
///
/// # Errors
///
/// - Connection errors from [`Connection::connect`]
/// - Request errors from [`Connection::request`]
/// - [`Error::Protocol`] if the history payload has an unexpected shape
pub async fn fetch_history_with<F>(
    config: &BusConfig,
    group_id: GroupId,
    count: u32,
    formatter: F,
) -> Result<Report>
where
    F: Fn(&MessageEvent) -> Option<CollectedRecord>,
{
    let start_time = Local::now();

    info!(group = %group_id, count, "Fetching message history");

    let connection = Connection::connect(config).await?;
    // Push traffic is irrelevant to a fetch.
    drop(connection.take_events());

    let params = json!({ "group_id": group_id, "count": count });
    let data = connection.request(GET_GROUP_MSG_HISTORY, params).await;
    connection.close().await;

    let items = history_items(data?)?;
    let received = items.len();

    let messages: Vec<CollectedRecord> = items
        .into_iter()
        .filter_map(|item| match MessageEvent::deserialize(item) {
            Ok(message) => Some(message),
            Err(e) => {
                debug!(error = %e, "Skipping undecodable history item");
                None
            }
        })
        .filter_map(|message| formatter(&message))
        .collect();

    info!(
        group = %group_id,
        received,
        kept = messages.len(),
        "History fetched"
    );

    Ok(Report::fetched(
        group_id,
        count,
        start_time,
        Local::now(),
        messages,
    ))
}

/// Extracts the item list from a history payload.
///
/// The bus answers either with the list itself or with an object holding
/// it under `messages`; both are accepted. A `null` payload or `null`
/// list is an empty batch.
///
/// # Errors
///
/// Returns [`Error::Protocol`] for any other shape.
pub fn history_items(data: Value) -> Result<Vec<Value>> {
    match data {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        Value::Object(mut fields) => match fields.remove("messages") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) => Ok(Vec::new()),
            Some(other) => Err(Error::protocol(format!(
                "history messages field is not a list: {other}"
            ))),
            None => Err(Error::protocol("history payload has no messages field")),
        },
        other => Err(Error::protocol(format!(
            "unexpected history payload: {other}"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_list_shape() {
        let items = history_items(json!([{"time": 1}, {"time": 2}])).expect("list");
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_nested_list_shape() {
        let items = history_items(json!({"messages": [{"time": 1}]})).expect("nested");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_null_shapes_are_empty() {
        assert!(history_items(Value::Null).expect("null").is_empty());
        assert!(history_items(json!({"messages": null})).expect("null list").is_empty());
    }

    #[test]
    fn test_unexpected_shapes() {
        for data in [json!("text"), json!({"other": []}), json!({"messages": 3})] {
            let err = history_items(data).expect_err("should reject");
            assert!(matches!(err, Error::Protocol { .. }));
        }
    }
}
