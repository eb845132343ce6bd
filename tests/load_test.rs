//! Load testing for the gateway.

use std::time::Instant;

use serde_json::json;

mod common;

#[tokio::test]
async fn test_cached_proxy_under_load() {
    // 1. Setup mock upstream and gateway
    let upstream = common::start_mock_upstream(r#"{"chapter":1,"verses":7}"#).await;
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&[&upstream])).await;
    let url = format!("http://{}/{}/v2/chapter/1", addr, upstream.host());
    let client = common::client();

    // 2. Warm the cache
    let warm = client.get(&url).send().await.unwrap();
    assert_eq!(warm.status(), 200);
    common::settle().await;

    // 3. Run load
    let concurrency = 20;
    let requests_per_task = 25;
    let total_requests = concurrency * requests_per_task;
    let start = Instant::now();

    let mut tasks = Vec::new();
    for _ in 0..concurrency {
        let client = client.clone();
        let url = url.clone();
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for _ in 0..requests_per_task {
                let req_start = Instant::now();
                if let Ok(res) = client.get(&url).send().await {
                    if res.status().is_success() && res.headers()["x-cache"] == "HIT" {
                        latencies.push(req_start.elapsed());
                    }
                }
            }
            latencies
        }));
    }

    let mut all_latencies = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }
    let duration = start.elapsed();

    assert_eq!(all_latencies.len(), total_requests, "every request should be a cache hit");
    assert_eq!(upstream.hits(), 1);

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", total_requests as f64 / duration.as_secs_f64());
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");

    shutdown.trigger();
}

#[tokio::test]
async fn test_concurrent_record_writes() {
    let (addr, shutdown) = common::start_gateway(common::gateway_config(&[])).await;
    let client = common::client();

    let mut tasks = Vec::new();
    for chapter in 1..=114u16 {
        let client = client.clone();
        let url = format!("http://{}/kv/chapter/{}", addr, chapter);
        tasks.push(tokio::spawn(async move {
            let body = json!({ "verses": { (format!("{}:1", chapter)): { "n": chapter } } });
            client.put(&url).json(&body).send().await.map(|r| r.status().as_u16())
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), 200);
    }

    let status: serde_json::Value = client
        .get(format!("http://{}/kv/status", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["sampleStatus"]["available"], 5);
    assert_eq!(status["sampleStatus"]["missing"], 0);

    shutdown.trigger();
}
