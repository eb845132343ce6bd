//! Failure injection tests for the gateway.

use std::time::Duration;

use serde_json::Value;

mod common;

#[tokio::test]
async fn test_upstream_errors_pass_through_uncached() {
    let upstream = common::start_programmable_upstream(|_| async {
        (503, r#"{"error":"maintenance"}"#.to_string())
    })
    .await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&[&upstream])).await;
    let client = common::client();
    let url = format!("http://{}/{}/v1/verses", addr, upstream.host());

    for _ in 0..2 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 503);
        assert_eq!(res.headers()["x-cache"], "MISS");
        assert_eq!(res.text().await.unwrap(), r#"{"error":"maintenance"}"#);
        common::settle().await;
    }
    assert_eq!(upstream.hits(), 2, "non-2xx responses must not be cached");

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let upstream = common::start_programmable_upstream(|_| async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (200, "{}".to_string())
    })
    .await;
    let mut config = common::gateway_config(&[&upstream]);
    config.timeouts.upstream_secs = 1;
    let (addr, shutdown) = common::start_gateway(config).await;

    let res = common::client()
        .get(format!("http://{}/{}/slow", addr, upstream.host()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 502);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Upstream timeout");
    assert!(body["timestamp"].is_string());
    assert_eq!(upstream.hits(), 1, "a timed-out call is never retried");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_is_a_proxy_error() {
    // reserve a port, then free it so nothing listens there
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_host = dead.local_addr().unwrap().to_string();
    drop(dead);

    let mut config = common::gateway_config(&[]);
    config.proxy.allowed_hosts = vec![dead_host.clone()];
    let (addr, shutdown) = common::start_gateway(config).await;

    let res = common::client()
        .get(format!("http://{}/{}/anything", addr, dead_host))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Proxy error");
    assert!(body["message"].is_string());

    shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = common::gateway_config(&[]);
    config.security.max_body_size = 1024;
    let (addr, shutdown) = common::start_gateway(config).await;

    let big = format!(r#"{{"verses":{{"1:1":"{}"}}}}"#, "x".repeat(4096));
    let res = common::client()
        .put(format!("http://{}/kv/chapter/1", addr))
        .header("content-type", "application/json")
        .body(big)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);
    assert_eq!(res.headers()["content-type"], "application/json");
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Payload too large");
    assert_eq!(body["maxBodySize"], 1024);

    shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_record_body() {
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&[])).await;
    let client = common::client();

    for body in ["not json", r#"{"verses":[]}"#, r#"{"metadata":{}}"#] {
        let res = client
            .put(format!("http://{}/kv/chapter/2", addr))
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400, "{}", body);
        let json: Value = res.json().await.unwrap();
        assert_eq!(json["error"], "Invalid chapter data");
    }

    let res = client
        .post(format!("http://{}/kv/populate", addr))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    shutdown.trigger();
}
