//! One-shot history fetch against a mock bus.

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::{ClientClose, MockBus, image_message, text_message};
use napcat_bus::flow::{fetch_history, fetch_history_with};
use napcat_bus::{BusConfig, Error, GroupId, format_record};
use serde_json::json;
use tokio::net::TcpListener;

// ============================================================================
// Constants
// ============================================================================

const GROUP: u64 = 123456;

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_filters_non_text_items() {
    let mut bus = MockBus::start().await;
    let config = bus.config();

    let server = async {
        let request = bus.next_request().await;
        assert_eq!(request["action"], "get_group_msg_history");
        assert_eq!(request["params"]["group_id"], GROUP);
        assert_eq!(request["params"]["count"], 3);

        bus.reply(
            &request,
            0,
            json!([
                text_message(GROUP, 100, "first"),
                image_message(GROUP, 101),
                text_message(GROUP, 102, "third"),
            ]),
        );
    };

    let (report, ()) = tokio::join!(fetch_history(&config, GroupId::new(GROUP), 3), server);
    let report = report.expect("fetch succeeds");

    assert_eq!(report.count(), 2);
    assert_eq!(report.group_id(), GroupId::new(GROUP));
    assert!(report.end_time() >= report.start_time());

    let texts: Vec<&str> = report.messages().iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "third"]);

    let value = serde_json::to_value(&report).expect("serialize");
    assert_eq!(value["success"], true);
    assert_eq!(value["fetched_count"], 2);
    assert_eq!(value["requested_count"], 3);

    assert_eq!(bus.client_closed().await, ClientClose::Frame);
}

#[tokio::test]
async fn test_fetch_accepts_nested_messages_field() {
    let mut bus = MockBus::start().await;
    let config = bus.config();

    let server = async {
        let request = bus.next_request().await;
        bus.reply(
            &request,
            0,
            json!({"messages": [text_message(GROUP, 1, "nested")]}),
        );
    };

    let (report, ()) = tokio::join!(fetch_history(&config, GroupId::new(GROUP), 20), server);
    let report = report.expect("fetch succeeds");

    assert_eq!(report.count(), 1);
    assert_eq!(report.messages()[0].text, "nested");
    assert_eq!(report.messages()[0].sender, "alice");
}

#[tokio::test]
async fn test_fetch_skips_undecodable_items() {
    let mut bus = MockBus::start().await;
    let config = bus.config();

    let server = async {
        let request = bus.next_request().await;
        bus.reply(
            &request,
            0,
            json!([42, "junk", text_message(GROUP, 5, "kept")]),
        );
    };

    let (report, ()) = tokio::join!(fetch_history(&config, GroupId::new(GROUP), 3), server);
    assert_eq!(report.expect("fetch succeeds").count(), 1);
}

#[tokio::test]
async fn test_fetch_with_custom_formatter() {
    let mut bus = MockBus::start().await;
    let config = bus.config();

    let server = async {
        let request = bus.next_request().await;
        bus.reply(&request, 0, json!([text_message(GROUP, 5, "quiet")]));
    };

    let formatter = |message: &napcat_bus::protocol::MessageEvent| {
        format_record(message).map(|mut record| {
            record.sender = "redacted".into();
            record
        })
    };

    let (report, ()) = tokio::join!(
        fetch_history_with(&config, GroupId::new(GROUP), 1, formatter),
        server
    );
    let report = report.expect("fetch succeeds");
    assert_eq!(report.messages()[0].sender, "redacted");
}

#[tokio::test]
async fn test_fetch_remote_error_produces_no_report() {
    let mut bus = MockBus::start().await;
    let config = bus.config();

    let server = async {
        let request = bus.next_request().await;
        bus.reply(&request, 1404, json!(null));
    };

    let (report, ()) = tokio::join!(fetch_history(&config, GroupId::new(GROUP), 3), server);
    assert!(matches!(report, Err(Error::RemoteError { code: 1404, .. })));

    assert_eq!(bus.client_closed().await, ClientClose::Frame);
}

#[tokio::test]
async fn test_fetch_times_out() {
    let mut bus = MockBus::start().await;
    let config = bus
        .builder()
        .request_timeout(Duration::from_millis(200))
        .build()
        .expect("valid config");

    let server = async {
        // Swallow the request without answering.
        let _request = bus.next_request().await;
    };

    let (report, ()) = tokio::join!(fetch_history(&config, GroupId::new(GROUP), 3), server);
    match report {
        Err(Error::RequestTimeout { action, .. }) => {
            assert_eq!(action, "get_group_msg_history");
        }
        other => panic!("expected timeout, got {other:?}"),
    }

    assert_eq!(bus.client_closed().await, ClientClose::Frame);
}

#[tokio::test]
async fn test_fetch_connect_failure() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        listener.local_addr().expect("local addr").port()
    };
    let config = BusConfig::builder()
        .endpoint(format!("ws://127.0.0.1:{port}"))
        .build()
        .expect("valid config");

    let report = fetch_history(&config, GroupId::new(GROUP), 3).await;
    assert!(matches!(report, Err(Error::ConnectFailed { .. })));
}
