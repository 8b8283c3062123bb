use super::*;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Local endpoint that answers `status` for the first `failures` calls and
/// `200 ok` afterwards. Returns the URL and the call counter.
async fn flaky_server(failures: usize, status: StatusCode) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let app = Router::new().route(
        "/",
        post(move || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < failures {
                    (status, "busy")
                } else {
                    (StatusCode::OK, "ok")
                }
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (format!("http://{addr}/"), hits)
}

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy { max_attempts, backoff: Duration::from_millis(1) }
}

fn client() -> reqwest::Client {
    build_http(LlmTimeouts { request: Duration::from_secs(5), connect: Duration::from_secs(1) }).unwrap()
}

#[test]
fn backoff_doubles_and_caps() {
    let base = Duration::from_millis(100);
    assert_eq!(backoff_delay(base, 1), Duration::from_millis(100));
    assert_eq!(backoff_delay(base, 2), Duration::from_millis(200));
    assert_eq!(backoff_delay(base, 4), Duration::from_millis(800));
    assert_eq!(backoff_delay(base, 50), Duration::from_millis(3200));
}

#[tokio::test]
async fn retries_server_errors_until_success() {
    let (url, hits) = flaky_server(2, StatusCode::SERVICE_UNAVAILABLE).await;
    let body = send(client().post(&url).body("{}"), policy(3)).await.unwrap();
    assert_eq!(body, "ok");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let (url, hits) = flaky_server(5, StatusCode::TOO_MANY_REQUESTS).await;
    let err = send(client().post(&url).body("{}"), policy(2)).await.unwrap_err();
    assert!(matches!(err, LlmError::Status { status: 429, ref body } if body == "busy"));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let (url, hits) = flaky_server(5, StatusCode::BAD_REQUEST).await;
    let err = send(client().post(&url).body("{}"), policy(3)).await.unwrap_err();
    assert!(matches!(err, LlmError::Status { status: 400, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
