//! End-to-end tests against a running gateway.

use gateway_sdk::GatewayClient;
use serde_json::{json, Map, Value};

mod common;

#[tokio::test]
async fn test_record_round_trip_through_sdk() {
    let upstream = common::start_mock_upstream("{}").await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&[&upstream])).await;
    let sdk = GatewayClient::new(&format!("http://{}", addr));

    let health = sdk.health().await.unwrap();
    assert_eq!(health["status"], "healthy");

    assert!(sdk.get_chapter(1).await.unwrap().is_none());

    let record = json!({
        "verses": { "1:1": { "words": ["bismi"] }, "1:2": { "words": ["al-hamdu"] } },
        "metadata": { "totalVerses": 7, "source": "test" }
    });
    let ack = sdk.put_chapter(1, &record).await.unwrap();
    assert!(ack.success);
    assert_eq!(ack.chapter, 1);
    assert_eq!(ack.verse_count, 2);

    let stored = sdk.get_chapter(1).await.unwrap().unwrap();
    assert_eq!(stored["verses"], record["verses"]);
    assert_eq!(stored["metadata"]["source"], "test");
    assert_eq!(stored["source"], "kv");

    let raw = sdk.raw("chapter:1").await.unwrap().unwrap();
    let raw: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(raw["chapter"], 1);
    assert!(sdk.raw("chapter:2").await.unwrap().is_none());

    assert_eq!(upstream.hits(), 0);
    shutdown.trigger();
}

#[tokio::test]
async fn test_populate_reports_each_chapter() {
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&[])).await;
    let sdk = GatewayClient::new(&format!("http://{}", addr));

    let mut chapters = Map::new();
    chapters.insert("18".into(), json!({ "verses": { "18:1": "a" } }));
    chapters.insert("0".into(), json!({ "verses": { "0:1": "b" } }));
    chapters.insert("67".into(), json!({ "verses": {} }));

    let results = sdk.populate(chapters).await.unwrap();
    assert_eq!(results.success, 1);
    assert_eq!(results.failed, 2);
    assert_eq!(results.chapters["18"], "success");
    assert_eq!(results.chapters["0"], "Invalid chapter number");

    let status = sdk.status().await.unwrap();
    assert_eq!(status["kvStatus"], "healthy");
    assert_eq!(status["sampleStatus"]["chapters"]["18"]["available"], true);
    assert_eq!(status["sampleStatus"]["chapters"]["67"]["available"], false);

    shutdown.trigger();
}

#[tokio::test]
async fn test_out_of_range_chapter_is_rejected() {
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&[])).await;
    let client = common::client();

    let res = client
        .get(format!("http://{}/kv/chapter/200", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Invalid chapter number");

    let res = client
        .put(format!("http://{}/kv/chapter/0", addr))
        .json(&json!({ "verses": { "1:1": "x" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    shutdown.trigger();
}

#[tokio::test]
async fn test_proxy_caches_repeat_gets() {
    let upstream = common::start_mock_upstream(r#"{"verses":[1,2,3]}"#).await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&[&upstream])).await;
    let client = common::client();
    let url = format!("http://{}/{}/v2/chapter?id=1", addr, upstream.host());

    let first = client.get(&url).send().await.unwrap();
    assert_eq!(first.status(), 200);
    assert_eq!(first.headers()["x-cache"], "MISS");
    assert_eq!(first.headers()["access-control-allow-origin"], "*");
    let first_body = first.text().await.unwrap();
    common::settle().await;

    let second = client.get(&url).send().await.unwrap();
    assert_eq!(second.status(), 200);
    assert_eq!(second.headers()["x-cache"], "HIT");
    assert_eq!(second.text().await.unwrap(), first_body);
    assert_eq!(upstream.hits(), 1);

    let seen = &upstream.seen()[0];
    assert_eq!(seen.line, "GET /v2/chapter?id=1 HTTP/1.1");
    assert!(seen.header("user-agent").unwrap().starts_with("edge-gateway/"));
    assert_eq!(seen.header("accept"), Some("application/json"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_encoded_proxy_form_shares_the_cache() {
    let upstream = common::start_mock_upstream(r#"{"ok":true}"#).await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&[&upstream])).await;
    let sdk = GatewayClient::new(&format!("http://{}", addr));
    let target = format!("http://{}/audio/index.json", upstream.host());

    let first = sdk.proxy_get(&target).await.unwrap();
    assert_eq!(first.status, 200);
    assert_eq!(first.cache.as_deref(), Some("MISS"));
    common::settle().await;

    let second = sdk.proxy_get(&target).await.unwrap();
    assert_eq!(second.cache.as_deref(), Some("HIT"));
    assert_eq!(second.body, first.body);
    assert_eq!(upstream.hits(), 1);

    let legacy = common::client()
        .get(format!("http://{}/{}/audio/index.json", addr, upstream.host()))
        .send()
        .await
        .unwrap();
    assert_eq!(legacy.headers()["x-cache"], "HIT");

    shutdown.trigger();
}

#[tokio::test]
async fn test_disallowed_host_is_forbidden() {
    let upstream = common::start_mock_upstream("{}").await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&[])).await;
    let client = common::client();

    for method in [reqwest::Method::GET, reqwest::Method::POST, reqwest::Method::DELETE] {
        let res = client
            .request(method, format!("http://{}/{}/anything", addr, upstream.host()))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 403);
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["requestedHost"], upstream.host());
    }
    assert_eq!(upstream.hits(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_preflight_and_request_ids() {
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&[])).await;
    let client = common::client();

    let res = client
        .request(reqwest::Method::OPTIONS, format!("http://{}/kv/chapter/3", addr))
        .header("origin", "https://reader.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
    assert_eq!(res.headers()["access-control-max-age"], "86400");
    assert!(res.headers().contains_key("x-request-id"));
    assert!(res.text().await.unwrap().is_empty());

    shutdown.trigger();
}
