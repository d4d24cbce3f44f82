//! Transaction records produced by the running proxy.

use reqwest::StatusCode;
use std::collections::HashSet;
use std::time::Duration;

use recording_proxy::recorder::{RecordStore, UNDECODABLE_BODY};

mod common;

#[tokio::test]
async fn test_concurrent_requests_get_distinct_files() {
    let upstream = common::start_upstream(common::upstream_router()).await;
    let logs = tempfile::tempdir().unwrap();
    let (proxy, shutdown) = common::start_proxy_to(upstream, logs.path()).await;
    let client = common::client();

    let concurrency = 8;
    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = format!("http://{}/api/v1/models", proxy);
        tasks.push(tokio::spawn(async move {
            let res = client.get(&url).send().await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            res.text().await.unwrap()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), r#"{"a":1}"#);
    }

    let records = common::wait_for_records(logs.path(), concurrency).await;
    assert_eq!(records.len(), concurrency);

    let names: HashSet<_> = records.iter().map(|(key, _)| key.clone()).collect();
    assert_eq!(names.len(), concurrency);

    // All land in a YYYY/MM/DD shard directory.
    for (key, record) in &records {
        let day = key.parent().unwrap();
        assert_eq!(day.components().count(), 3);
        assert_eq!(
            day.to_string_lossy().replace('\\', "/"),
            record.timestamp.format("%Y/%m/%d").to_string()
        );
    }

    shutdown.trigger();
}

#[tokio::test]
async fn test_non_utf8_request_body_is_forwarded_exactly_and_logged_lossily() {
    let upstream = common::start_upstream(common::upstream_router()).await;
    let logs = tempfile::tempdir().unwrap();
    let (proxy, shutdown) = common::start_proxy_to(upstream, logs.path()).await;

    let payload: &'static [u8] = &[b'h', b'i', 0xff, 0x00, 0xfe, b'!'];
    let res = common::client()
        .post(format!("http://{}/api/v1/raw", proxy))
        .body(payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.bytes().await.unwrap().as_ref(), payload);

    let records = common::wait_for_records(logs.path(), 1).await;
    let body = &records[0].1.request.body;
    assert!(body.starts_with("hi"));
    assert!(body.ends_with('!'));
    assert!(body.contains('\u{FFFD}'));

    shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_request_body_is_rejected_and_recorded() {
    let upstream = common::start_upstream(common::upstream_router()).await;
    let logs = tempfile::tempdir().unwrap();
    let mut config = common::proxy_config(format!("http://{}", upstream), logs.path());
    config.limits.max_request_body_bytes = 16;
    let (proxy, shutdown) = common::start_proxy(config).await;

    let res = common::client()
        .post(format!("http://{}/api/v1/echo", proxy))
        .body(vec![b'x'; 1024])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let records = common::wait_for_records(logs.path(), 1).await;
    let record = &records[0].1;
    assert_eq!(record.request.body, UNDECODABLE_BODY);
    assert_eq!(record.response.status_code, 413);

    shutdown.trigger();
}

#[tokio::test]
async fn test_status_code_in_record_matches_client() {
    let upstream = common::start_upstream(common::upstream_router()).await;
    let logs = tempfile::tempdir().unwrap();
    let (proxy, shutdown) = common::start_proxy_to(upstream, logs.path()).await;
    let client = common::client();

    let mut seen = Vec::new();
    for path in ["/api/v1/models", "/api/v1/decorated", "/api/v1/missing"] {
        let res = client.get(format!("http://{}{}", proxy, path)).send().await.unwrap();
        seen.push(res.status().as_u16());
        let _ = res.bytes().await;
    }
    assert_eq!(seen, [200, 201, 404]);

    let records = common::wait_for_records(logs.path(), 3).await;
    let mut recorded: Vec<u16> = records.iter().map(|(_, r)| r.response.status_code).collect();
    recorded.sort_unstable();
    assert_eq!(recorded, [200, 201, 404]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_shutdown_flushes_pending_records() {
    let upstream = common::start_upstream(common::upstream_router()).await;
    let logs = tempfile::tempdir().unwrap();
    let config = common::proxy_config(format!("http://{}", upstream), logs.path());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let proxy = listener.local_addr().unwrap();
    let shutdown = recording_proxy::Shutdown::new();
    let server = recording_proxy::HttpServer::new(config).unwrap();
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let res = common::client()
        .get(format!("http://{}/api/v1/big", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(res.bytes().await.unwrap().len(), common::BIG_BODY_LEN);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(10), server_task)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();

    // run() returns only after the recorder drained
    let keys = RecordStore::new(logs.path()).list_keys().await.unwrap();
    assert_eq!(keys.len(), 1);
}

#[tokio::test]
async fn test_unwritable_log_dir_does_not_affect_clients() {
    let upstream = common::start_upstream(common::upstream_router()).await;
    let logs = tempfile::tempdir().unwrap();
    let blocker = logs.path().join("not-a-directory");
    std::fs::write(&blocker, b"x").unwrap();
    let (proxy, shutdown) = common::start_proxy_to(upstream, &blocker).await;
    let client = common::client();

    // Twice: the writer keeps running after a failed write.
    for _ in 0..2 {
        let res = client
            .get(format!("http://{}/api/v1/models", proxy))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text().await.unwrap(), r#"{"a":1}"#);
    }
    assert!(blocker.is_file());

    shutdown.trigger();
}

#[tokio::test]
async fn test_client_disconnect_mid_stream_records_partial_body() {
    let upstream = common::start_upstream(common::upstream_router()).await;
    let logs = tempfile::tempdir().unwrap();
    let mut config = common::proxy_config(format!("http://{}", upstream), logs.path());
    // Long enough that only the disconnect can end the relay.
    config.upstream.read_timeout_secs = 120;
    let (proxy, shutdown) = common::start_proxy(config).await;

    let client = common::client();
    let mut res = client
        .get(format!("http://{}/api/v1/slow", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let mut received = Vec::new();
    while received.len() < common::SLOW_FIRST_CHUNK.len() {
        let chunk = res.chunk().await.unwrap().expect("body ended early");
        received.extend_from_slice(&chunk);
    }
    assert_eq!(received, common::SLOW_FIRST_CHUNK);
    drop(res);
    drop(client);

    let records = common::wait_for_records(logs.path(), 1).await;
    assert_eq!(records.len(), 1);
    let record = &records[0].1;
    assert_eq!(record.response.status_code, 200);
    assert_eq!(record.response.body.as_bytes(), common::SLOW_FIRST_CHUNK);

    shutdown.trigger();
}
