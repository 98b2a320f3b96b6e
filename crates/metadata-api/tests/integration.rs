use axum::Router;
use metadata_api::app_with_config;
use metadata_common::config::ServerConfig;

async fn spawn() -> String {
    let app: Router = app_with_config(ServerConfig { block_size: 4, bind_addr: "127.0.0.1".into(), port: 0 });
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}:{}", addr.ip(), addr.port())
}

#[tokio::test]
async fn healthz_metrics_and_stats() {
    let base = spawn().await;
    let client = reqwest::Client::new();

    let r = client.get(format!("{base}/healthz")).send().await.unwrap();
    assert!(r.status().is_success());

    let r = client.get(format!("{base}/metrics")).send().await.unwrap();
    assert!(r.status().is_success());

    let r = client.get(format!("{base}/")).send().await.unwrap();
    assert!(r.status().is_success());
    let body: serde_json::Value = r.json().await.unwrap();
    assert_eq!(body["compnode_count"], 0);
}

#[tokio::test]
async fn register_and_schedule_prefill_affinity() {
    let base = spawn().await;
    let client = reqwest::Client::new();

    for host in ["h1", "h2"] {
        let r = client
            .post(format!("{base}/mempool/add_node"))
            .json(&serde_json::json!({"host": host, "node_type": "prefill", "num_blocks": 16}))
            .send()
            .await
            .unwrap();
        assert!(r.status().is_success());

        let r = client
            .post(format!("{base}/compnode/add_node"))
            .json(&serde_json::json!({"host": host, "port": 1000, "role": "prefill", "num_gpu_blocks": 8}))
            .send()
            .await
            .unwrap();
        assert!(r.status().is_success());
    }

    let r = client
        .put(format!("{base}/mempool/sync"))
        .json(&serde_json::json!({"host": "h1", "node_type": "prefill", "block_hashes": [10, 20, 30]}))
        .send()
        .await
        .unwrap();
    assert!(r.status().is_success());

    let r = client
        .post(format!("{base}/compnode/schedule_prefill"))
        .json(&serde_json::json!({"block_hashes": [10, 20]}))
        .send()
        .await
        .unwrap();
    assert!(r.status().is_success());
    let body: serde_json::Value = r.json().await.unwrap();
    assert_eq!(body["data"]["cn_host"], "h1");
    assert_eq!(body["data"]["mn_host"], "h1");
}

#[tokio::test]
async fn duplicate_mempool_registration_is_conflict() {
    let base = spawn().await;
    let client = reqwest::Client::new();
    let body = serde_json::json!({"host": "h1", "node_type": "prefill", "num_blocks": 16});

    let r = client.post(format!("{base}/mempool/add_node")).json(&body).send().await.unwrap();
    assert!(r.status().is_success());

    let r = client.post(format!("{base}/mempool/add_node")).json(&body).send().await.unwrap();
    assert_eq!(r.status(), reqwest::StatusCode::CONFLICT);
}

#[tokio::test]
async fn schedule_prefill_with_no_hosts_is_unavailable() {
    let base = spawn().await;
    let client = reqwest::Client::new();
    let r = client
        .post(format!("{base}/compnode/schedule_prefill"))
        .json(&serde_json::json!({"block_hashes": [1, 2]}))
        .send()
        .await
        .unwrap();
    assert_eq!(r.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
}
