//! Integration tests for API endpoints
//!
//! These tests verify that:
//! - The full account and health check lifecycle works over HTTP
//! - Unknown and malformed ids are answered with 404
//! - Invalid bodies and configs are answered with 400
//! - Unsupported methods are answered with 405

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use edge_healthchecks::{
    api::{ApiConfig, ApiState, spawn_api_server},
    cluster::Cluster,
};
use reqwest::Client;
use serde_json::{Value, json};

use crate::helpers::memory_cluster;

async fn spawn_test_api() -> (SocketAddr, Arc<Cluster>) {
    let (cluster, _backend) = memory_cluster().await;

    let config = ApiConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        enable_cors: true,
    };

    let addr = spawn_api_server(config, ApiState::new(cluster.clone()))
        .await
        .unwrap();
    (addr, cluster)
}

async fn create_account(client: &Client, addr: SocketAddr) -> String {
    let body: Value = client
        .post(format!("http://{addr}/api/v1/accounts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (addr, cluster) = spawn_test_api().await;

    let response = reqwest::get(format!("http://{addr}/api/v1/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"]["healthy"], true);

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_healthcheck_lifecycle() {
    let (addr, cluster) = spawn_test_api().await;
    let client = Client::new();
    let account_id = create_account(&client, addr).await;
    let base = format!("http://{addr}/api/v1/accounts/{account_id}");

    // Create, with a foreign accountId that must be overridden
    let response = client
        .post(format!("{base}/healthchecks"))
        .json(&json!({
            "accountId": "someone-else",
            "url": "https://x",
            "enabled": true,
            "period": 60
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let id = response.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let snapshot: Value = client.get(&base).send().await.unwrap().json().await.unwrap();
    assert_eq!(snapshot["healthchecks"][&id]["accountId"], account_id.as_str());
    assert_eq!(snapshot["updates"], json!({}));

    let details: Value = client
        .get(format!("{base}/healthchecks/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(details["accountId"], account_id.as_str());
    assert_eq!(details["url"], "https://x");
    assert_eq!(details["enabled"], true);
    assert_eq!(details["periodSeconds"], 60);
    assert_eq!(details["history"], json!([]));

    // Update
    let response = client
        .put(format!("{base}/healthchecks/{id}"))
        .json(&json!({"url": "https://y", "enabled": false, "periodSeconds": 30}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await.unwrap()["id"], id.as_str());

    let details: Value = client
        .get(format!("{base}/healthchecks/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(details["url"], "https://y");
    assert_eq!(details["enabled"], false);

    // Delete, then it is gone
    let response = client
        .delete(format!("{base}/healthchecks/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await.unwrap()["id"], id.as_str());

    let response = client
        .get(format!("{base}/healthchecks/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .delete(format!("{base}/healthchecks/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let (addr, cluster) = spawn_test_api().await;
    let client = Client::new();

    for path in [
        "/api/v1/accounts/0123456789abcdef0123456789abcdef".to_string(),
        "/api/v1/accounts/not-an-id".to_string(),
        "/api/v1/accounts/not-an-id/healthchecks/0123456789abcdef0123456789abcdef".to_string(),
    ] {
        let response = client
            .get(format!("http://{addr}{path}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }

    let account_id = create_account(&client, addr).await;
    for id in ["0123456789abcdef0123456789abcdef", "garbage"] {
        let response = client
            .get(format!(
                "http://{addr}/api/v1/accounts/{account_id}/healthchecks/{id}"
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{id}");
    }

    // No actor was activated for the unknown account
    let response = client
        .post(format!(
            "http://{addr}/api/v1/accounts/0123456789abcdef0123456789abcdef/healthchecks"
        ))
        .json(&json!({"url": "https://x", "enabled": true, "period": 60}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let (addr, cluster) = spawn_test_api().await;
    let client = Client::new();
    let account_id = create_account(&client, addr).await;
    let url = format!("http://{addr}/api/v1/accounts/{account_id}/healthchecks");

    for body in [
        json!({"url": "https://x", "enabled": true, "period": 0}),
        json!({"url": "not a url", "enabled": true, "period": 60}),
        json!({"url": "ftp://x", "enabled": true, "period": 60}),
        json!({"enabled": true, "period": 60}),
    ] {
        let response = client.post(&url).json(&body).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let error: Value = response.json().await.unwrap();
        assert!(error["error"].is_string());
    }

    let response = client
        .post(&url)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let snapshot: Value = client
        .get(format!("http://{addr}/api/v1/accounts/{account_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(snapshot["healthchecks"], json!({}));

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_unsupported_methods() {
    let (addr, cluster) = spawn_test_api().await;
    let client = Client::new();
    let account_id = create_account(&client, addr).await;

    let response = client
        .delete(format!("http://{addr}/api/v1/accounts/{account_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = client
        .patch(format!(
            "http://{addr}/api/v1/accounts/{account_id}/healthchecks/0123456789abcdef0123456789abcdef"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    cluster.shutdown().await;
}
