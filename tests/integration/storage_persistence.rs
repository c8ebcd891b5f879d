//! Persistence across restarts on the SQLite backend
//!
//! These tests verify that:
//! - Accounts, registries and histories survive a restart
//! - Persisted alarms are re-armed on start-up and keep probing

use std::sync::Arc;
use std::time::Duration;

use edge_healthchecks::{
    Health, HealthcheckRequest,
    cluster::Cluster,
    storage::{StorageBackend, sqlite::SqliteBackend},
};
use tempfile::tempdir;

use crate::helpers::{target, test_config, wait_for};

async fn sqlite_cluster(path: &std::path::Path) -> Arc<Cluster> {
    let backend: Arc<dyn StorageBackend> = Arc::new(SqliteBackend::new(path).await.unwrap());
    Cluster::start(&test_config(), backend).await.unwrap()
}

#[tokio::test]
async fn test_state_survives_restart() {
    let server = target(200).await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("healthchecks.db");

    let cluster = sqlite_cluster(&path).await;
    let account_id = cluster.create_account().await.unwrap();
    let account = cluster.account(account_id.clone());
    let id = account
        .create_healthcheck(HealthcheckRequest::new(server.uri(), false, 60))
        .await
        .unwrap();
    let result = cluster.healthcheck(id.clone()).check_now().await.unwrap();
    cluster.shutdown().await;

    let cluster = sqlite_cluster(&path).await;
    assert_eq!(
        cluster.account_exists(account_id.as_str()).await.unwrap(),
        Some(account_id.clone())
    );

    let account = cluster.account(account_id);
    let snapshot = account.snapshot().await.unwrap();
    assert_eq!(snapshot.healthchecks[&id].url, server.uri());

    let details = account.get_healthcheck(id).await.unwrap();
    assert_eq!(details.history.len(), 1);
    let restored = details.history.latest().unwrap();
    assert_eq!(restored.code, result.code);
    assert_eq!(restored.health, result.health);

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_persisted_alarm_fires_after_restart() {
    let server = target(200).await;
    let dir = tempdir().unwrap();
    let path = dir.path().join("healthchecks.db");

    let cluster = sqlite_cluster(&path).await;
    let account_id = cluster.create_account().await.unwrap();
    let id = cluster
        .account(account_id.clone())
        .create_healthcheck(HealthcheckRequest::new(server.uri(), true, 1))
        .await
        .unwrap();
    cluster.shutdown().await;

    let cluster = sqlite_cluster(&path).await;
    let healthcheck = cluster.healthcheck(id);

    let history = wait_for(Duration::from_secs(10), || {
        let healthcheck = healthcheck.clone();
        async move {
            let details = healthcheck.details().await.unwrap();
            (!details.history.is_empty()).then_some(details.history)
        }
    })
    .await
    .expect("restored alarm never fired");

    assert_eq!(history.latest().unwrap().health, Health::Healthy);

    cluster.shutdown().await;
}
