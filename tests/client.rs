use async_trait::async_trait;
use axum::{Json, Router, routing::get};
use futures_util::FutureExt;
use httpmock::{
    Method::{GET, POST},
    MockServer,
};
use memotic::client::{
    ApiRequest, MemosClient, MemosError, SessionState, Sleeper, backoff_delay,
};
use memotic::config::ClientConfig;
use memotic::models::Memo;
use serde_json::json;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU32, Ordering},
};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Debug, Default)]
struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}

async fn mock_probe(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/docs");
            then.status(200).json_body(json!({ "version": "0.1.0" }));
        })
        .await;
}

async fn connected_client(
    base_url: String,
    retries: u32,
) -> (MemosClient, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let mut client = MemosClient::new(
        ClientConfig::new(base_url)
            .with_token("test-token-123")
            .with_retries(retries),
    )
    .with_sleeper(sleeper.clone());
    client.connect().await.expect("connect");
    (client, sleeper)
}

#[tokio::test]
async fn transient_failures_exhaust_every_attempt() {
    let server = MockServer::start_async().await;
    mock_probe(&server).await;
    let failing = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/memos");
            then.status(503).body("maintenance");
        })
        .await;

    let (client, sleeper) = connected_client(server.base_url(), 3).await;
    let err = client.list_memos(None, None).await.unwrap_err();

    assert_eq!(failing.hits_async().await, 3);
    assert_eq!(
        err,
        MemosError::Server {
            status: 503,
            message: "maintenance".into()
        }
    );
    assert_eq!(sleeper.delays(), vec![backoff_delay(0), backoff_delay(1)]);
}

#[tokio::test]
async fn authentication_failures_are_not_retried() {
    let server = MockServer::start_async().await;
    mock_probe(&server).await;
    let unauthorized = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/memos/1");
            then.status(401).json_body(json!({ "detail": "bad token" }));
        })
        .await;

    let (client, sleeper) = connected_client(server.base_url(), 5).await;
    let err = client.get_memo("1").await.unwrap_err();

    assert_eq!(unauthorized.hits_async().await, 1);
    assert!(matches!(err, MemosError::Authentication { .. }));
    assert_eq!(err.status_code(), Some(401));
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn not_found_names_the_resource() {
    let server = MockServer::start_async().await;
    mock_probe(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/memos/42");
            then.status(404).json_body(json!({ "detail": "Memo not found" }));
        })
        .await;

    let (client, _) = connected_client(server.base_url(), 3).await;
    let err = client.get_memo("42").await.unwrap_err();
    assert_eq!(
        err,
        MemosError::NotFound {
            resource: "memo".into(),
            resource_id: "42".into()
        }
    );
    assert_eq!(err.to_string(), "memo '42' not found");
}

#[tokio::test]
async fn not_found_on_short_path_is_generic() {
    let server = MockServer::start_async().await;
    mock_probe(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/memos");
            then.status(404).body("no route");
        })
        .await;

    let (client, _) = connected_client(server.base_url(), 3).await;
    let err = client
        .execute(&ApiRequest::get("/api/memos"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        MemosError::Api {
            status: 404,
            message: "no route".into()
        }
    );
}

#[tokio::test]
async fn validation_errors_carry_detail() {
    let server = MockServer::start_async().await;
    mock_probe(&server).await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/memos");
            then.status(400).json_body(json!({ "detail": "content is required" }));
        })
        .await;

    let (client, _) = connected_client(server.base_url(), 3).await;
    let err = client.create_memo(Memo::new("")).await.unwrap_err();
    assert_eq!(create.hits_async().await, 1);
    assert_eq!(
        err,
        MemosError::Validation {
            message: "content is required".into()
        }
    );
}

#[tokio::test]
async fn create_then_missing_get_reports_memo_not_found() {
    let server = MockServer::start_async().await;
    mock_probe(&server).await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/memos")
                .header("authorization", "Bearer test-token-123")
                .json_body_partial(r#"{ "memo": { "content": "Test memo" } }"#);
            then.status(200).json_body(json!({
                "name": "memos/1",
                "content": "Test memo",
                "visibility": "PRIVATE"
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/memos/1");
            then.status(404).json_body(json!({ "detail": "no such memo" }));
        })
        .await;

    let (client, _) = connected_client(server.base_url(), 1).await;
    let created = client.create_memo(Memo::new("Test memo")).await.unwrap();
    create.assert_async().await;
    assert_eq!(created.name.as_deref(), Some("memos/1"));

    let err = client.get_memo(created.id().unwrap()).await.unwrap_err();
    assert_eq!(
        err,
        MemosError::NotFound {
            resource: "memo".into(),
            resource_id: "1".into()
        }
    );
}

#[tokio::test]
async fn refused_probe_leaves_client_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut client = MemosClient::new(
        ClientConfig::new(format!("http://{addr}")).with_timeout(Duration::from_secs(2)),
    );
    let err = client.connect().await.unwrap_err();

    assert!(matches!(err, MemosError::Connection(_)));
    assert!(!client.is_connected());
    assert!(!client.info().connected());
    assert!(client.info().last_error.is_some());
    assert_eq!(
        client.execute(&ApiRequest::get("/api/v1/memos")).await,
        Err(MemosError::NotConnected)
    );
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let server = MockServer::start_async().await;
    mock_probe(&server).await;

    let (mut client, _) = connected_client(server.base_url(), 3).await;
    assert!(client.is_connected());
    client.disconnect();
    client.disconnect();
    assert!(!client.is_connected());
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn transport_failures_are_retried_until_success() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let app = Router::new()
        .route("/docs", get(|| async { Json(json!({ "version": "test" })) }))
        .route(
            "/api/v1/memos/1",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                    Json(json!({ "name": "memos/1", "content": "Test memo" }))
                }
            }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let sleeper = Arc::new(RecordingSleeper::default());
    let mut client = MemosClient::new(
        ClientConfig::new(format!("http://{addr}"))
            .with_timeout(Duration::from_millis(300))
            .with_retries(3),
    )
    .with_sleeper(sleeper.clone());
    client.connect().await.unwrap();

    let memo = client.get_memo("1").await.unwrap();
    assert_eq!(memo.content, "Test memo");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    assert_eq!(sleeper.delays(), vec![backoff_delay(0), backoff_delay(1)]);
}

#[tokio::test]
async fn dropping_the_request_cancels_the_retry_loop() {
    let server = MockServer::start_async().await;
    mock_probe(&server).await;
    let failing = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/memos/1");
            then.status(500).body("boom");
        })
        .await;

    let mut client = MemosClient::new(ClientConfig::new(server.base_url()).with_retries(3));
    client.connect().await.unwrap();

    let outcome = tokio::time::timeout(Duration::from_millis(500), client.get_memo("1")).await;
    assert!(outcome.is_err(), "retry loop should still be backing off");
    assert_eq!(failing.hits_async().await, 1);

    client.disconnect();
    assert!(!client.is_connected());
}

#[tokio::test]
async fn session_closes_after_failed_operation() {
    let server = MockServer::start_async().await;
    mock_probe(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/7");
            then.status(404).json_body(json!({ "detail": "User not found" }));
        })
        .await;

    let mut client = MemosClient::new(ClientConfig::new(server.base_url()).with_retries(1));
    let err = client
        .run_in_session(|client| {
            async move {
                assert!(client.is_connected());
                client.get_user("7").await
            }
            .boxed()
        })
        .await
        .unwrap_err();

    assert_eq!(
        err,
        MemosError::NotFound {
            resource: "user".into(),
            resource_id: "7".into()
        }
    );
    assert!(!client.is_connected());
    assert_eq!(client.info().state, SessionState::Disconnected);
}

#[tokio::test]
async fn session_closes_after_successful_operation_and_can_reopen() {
    let server = MockServer::start_async().await;
    mock_probe(&server).await;
    let memos = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/memos");
            then.status(200).json_body(json!({ "memos": [] }));
        })
        .await;

    let mut client = MemosClient::new(ClientConfig::new(server.base_url()).with_retries(1));
    for _ in 0..2 {
        let listed = client
            .run_in_session(|client| client.list_memos(None, None).boxed())
            .await
            .unwrap();
        assert!(listed.is_empty());
        assert!(!client.is_connected());
    }
    assert_eq!(memos.hits_async().await, 2);
    assert!(matches!(
        client.execute(&ApiRequest::get("/api/v1/memos")).await,
        Err(MemosError::NotConnected)
    ));
}

#[tokio::test]
async fn scoped_session_reports_operation_error() {
    let server = MockServer::start_async().await;
    mock_probe(&server).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/users/7");
            then.status(404).json_body(json!({ "detail": "User not found" }));
        })
        .await;

    let config = ClientConfig::new(server.base_url()).with_retries(1);
    let err = MemosClient::scoped(config, |client| {
        async move { client.get_user("7").await }.boxed()
    })
    .await
    .unwrap_err();
    assert!(matches!(err, MemosError::NotFound { .. }));
}
