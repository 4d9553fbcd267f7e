//! Failure injection tests for the edge proxy.

use std::time::Duration;

use axum::http::StatusCode;

mod common;

use common::{CLIENT_ID, CLIENT_SECRET};

#[tokio::test]
async fn test_unreachable_upstream_returns_502() {
    let dead = common::unused_addr().await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&format!("http://{}", dead))).await;

    let res = common::client()
        .post(format!("http://{}/api/color", addr))
        .header("Origin", "https://rgboo.com")
        .body("{}")
        .send()
        .await
        .expect("gateway must answer even when upstream is down");

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(res.headers().get("access-control-allow-origin").is_none());
    let body = res.text().await.unwrap();
    assert_eq!(body, "Upstream request failed");
    assert!(!body.contains(&dead.to_string()));

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_upstream_times_out_with_504() {
    let upstream = common::start_mock_upstream(200, "{}", Duration::from_secs(5)).await;
    let mut config = common::gateway_config(&upstream.base_url());
    config.timeouts.upstream_secs = 1;
    config.timeouts.request_secs = 10;
    let (addr, shutdown) = common::start_gateway(config).await;

    let res = common::client()
        .get(format!("http://{}/api/queue", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(res.text().await.unwrap(), "Upstream request timed out");
    assert_eq!(upstream.requests().len(), 1, "single attempt, no retry");

    shutdown.trigger();
}

#[tokio::test]
async fn test_client_disconnect_abandons_upstream_call() {
    let upstream = common::start_mock_upstream(200, "{}", Duration::from_secs(2)).await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&upstream.base_url())).await;

    let request = common::client()
        .post(format!("http://{}/api/color", addr))
        .header("Origin", "https://rgboo.com")
        .body("{}")
        .send();
    let aborted = tokio::time::timeout(Duration::from_millis(500), request).await;
    assert!(aborted.is_err(), "client should give up before the upstream answers");
    assert_eq!(upstream.requests().len(), 1);

    // Well past the upstream delay: a still-running call would have completed.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(upstream.completed(), 0, "upstream call must be dropped with the client");
    assert_eq!(upstream.requests().len(), 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_rejected_before_forwarding() {
    let upstream = common::start_mock_upstream(200, "{}", Duration::ZERO).await;
    let mut config = common::gateway_config(&upstream.base_url());
    config.listener.max_body_bytes = 16;
    let (addr, shutdown) = common::start_gateway(config).await;

    let res = common::client()
        .post(format!("http://{}/api/color", addr))
        .body("x".repeat(1024))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(upstream.requests().is_empty());

    shutdown.trigger();
}

#[tokio::test]
async fn test_credentials_never_appear_in_any_response() {
    let healthy = common::start_mock_upstream(200, r#"{"ok":true}"#, Duration::ZERO).await;
    let failing = common::start_mock_upstream(500, r#"{"error":"boom"}"#, Duration::ZERO).await;
    let dead = common::unused_addr().await;
    let client = common::client();

    for base in [healthy.base_url(), failing.base_url(), format!("http://{}", dead)] {
        let (addr, shutdown) = common::start_gateway(common::gateway_config(&base)).await;

        let requests = [
            client.get(format!("http://{}/api/queue", addr)).header("Origin", "https://rgboo.com"),
            client.post(format!("http://{}/api/color", addr)).header("Origin", "https://evil.example").body("{}"),
            client.request(reqwest::Method::OPTIONS, format!("http://{}/api/color", addr)),
            client.get(format!("http://{}/index.html", addr)),
        ];

        for request in requests {
            let res = request.send().await.unwrap();
            for (name, value) in res.headers() {
                let value = String::from_utf8_lossy(value.as_bytes());
                for secret in [CLIENT_ID, CLIENT_SECRET] {
                    assert!(!value.contains(secret), "secret leaked in header {}", name);
                }
            }
            let body = res.text().await.unwrap();
            assert!(!body.contains(CLIENT_ID));
            assert!(!body.contains(CLIENT_SECRET));
        }

        shutdown.trigger();
    }
}
