use httpmock::prelude::*;
use iot_panel::domain::model::{ActuatorLevel, Command, RemotePath, RemoteSnapshot, Variant};
use iot_panel::domain::ports::RemoteStore;
use iot_panel::{FirebaseStore, Panel, PanelError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_set_puts_value_under_key() {
    let server = MockServer::start_async().await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/MUC.json")
                .query_param("auth", "t0k3n")
                .json_body(json!(2));
            then.status(200).json_body(json!(2));
        })
        .await;

    let store = FirebaseStore::new(server.base_url(), Some("t0k3n".to_string()));
    store.set(RemotePath::Muc, json!(2)).await.unwrap();

    put.assert_async().await;
}

#[tokio::test]
async fn test_rejected_put_is_a_remote_write_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/LED.json");
            then.status(401)
                .json_body(json!({ "error": "Permission denied" }));
        })
        .await;

    let store = FirebaseStore::new(server.base_url(), None);
    let err = store.set(RemotePath::Led, json!("ON")).await.unwrap_err();

    match err {
        PanelError::RemoteWriteError { path, message } => {
            assert_eq!(path, "LED");
            assert!(message.contains("401"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_snapshot_reads_database_root() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/.json");
            then.status(200).json_body(json!({
                "LIGHT": 800,
                "TEMPERATURE": 28,
                "ACTIVE_LIGHT": 1,
                "ACTIVE_TEMPERATURE": 0,
                "ACTIVE_DISTANCE": 1,
                "LED": "ON",
                "MUC": 1
            }));
        })
        .await;

    let store = FirebaseStore::new(server.base_url(), None);
    let snapshot = store.snapshot().await.unwrap().unwrap();

    assert_eq!(snapshot.light, Some(800));
    assert_eq!(snapshot.temperature, Some(28));
    assert_eq!(snapshot.active_distance, Some(1));
    assert_eq!(snapshot.led.as_deref(), Some("ON"));
    assert_eq!(snapshot.muc, Some(1));
}

#[tokio::test]
async fn test_empty_database_has_no_snapshot() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/.json");
            then.status(200)
                .header("content-type", "application/json")
                .body("null");
        })
        .await;

    let store = FirebaseStore::new(server.base_url(), None);
    assert_eq!(store.snapshot().await.unwrap(), None);
}

#[tokio::test]
async fn test_subscribe_polls_for_snapshots() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/.json");
            then.status(200).json_body(json!({ "LIGHT": 640, "MUC": 0 }));
        })
        .await;

    let store = FirebaseStore::new(server.base_url(), None)
        .with_poll_interval(Duration::from_millis(50));
    let mut snapshots = store.subscribe().await.unwrap();

    let first = tokio::time::timeout(Duration::from_secs(5), snapshots.recv())
        .await
        .expect("no snapshot within timeout")
        .unwrap();
    assert_eq!(
        first,
        RemoteSnapshot {
            light: Some(640),
            muc: Some(0),
            ..RemoteSnapshot::default()
        }
    );

    // unchanged data is not delivered twice
    let repeat = tokio::time::timeout(Duration::from_millis(300), snapshots.recv()).await;
    assert!(repeat.is_err());
}

#[tokio::test]
async fn test_panel_dispatch_reaches_database() {
    let server = MockServer::start_async().await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT).path("/MUC.json").json_body(json!(1));
            then.status(200).json_body(json!(1));
        })
        .await;

    let store = Arc::new(FirebaseStore::new(server.base_url(), None));
    let panel = Panel::new(store, Variant::ThreeLevel);

    panel.dispatch(Command::OpenHalf).await.await.unwrap().unwrap();
    put.assert_async().await;
}

#[tokio::test]
async fn test_polling_stops_when_subscriber_goes_away() {
    let server = MockServer::start_async().await;
    let root = server
        .mock_async(|when, then| {
            when.method(GET).path("/.json");
            then.status(200).json_body(json!({ "MUC": 0 }));
        })
        .await;

    let store = FirebaseStore::new(server.base_url(), None)
        .with_poll_interval(Duration::from_millis(50));
    let mut snapshots = store.subscribe().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), snapshots.recv())
        .await
        .expect("no snapshot within timeout")
        .unwrap();

    // the root never changes, so nothing else is ever sent on the channel
    drop(snapshots);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let settled = root.hits_async().await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(root.hits_async().await, settled);
}

#[tokio::test]
async fn test_mixed_type_root_still_mirrors_valid_fields() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/.json");
            then.status(200)
                .json_body(json!({ "LIGHT": 512.5, "ACTIVE_LIGHT": true, "LED": "ON", "MUC": 2 }));
        })
        .await;

    let store = Arc::new(FirebaseStore::new(server.base_url(), None));
    let snapshot = store.snapshot().await.unwrap().unwrap();
    assert_eq!(snapshot.light, Some(513));
    assert_eq!(snapshot.active_light, None);

    let panel = Panel::new(store, Variant::ThreeLevel);
    panel.apply_snapshot(&snapshot).await;
    let state = panel.state().await;
    assert_eq!(state.level, ActuatorLevel::Full);
    assert!(state.led);
    assert!(!state.active_light);
}
