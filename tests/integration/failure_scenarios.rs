//! Failure scenarios
//!
//! These tests verify that:
//! - Unreachable targets never stop the probe timer
//! - Corrupt actor state surfaces as an error instead of a silent default
//! - A failed delete leaves the account registry untouched
//! - An alarm outlives a crash in the middle of its probe
//! - Results that race with a delete are still mirrored (documented overwrite)
//! - Requests after shutdown fail fast

use std::sync::Arc;
use std::time::Duration;

use edge_healthchecks::{
    Health, HealthcheckRequest, HealthcheckResult,
    actors::MonitorError,
    cluster::Cluster,
    runtime::{ActorId, RuntimeError},
    storage::{MemoryBackend, StorageBackend},
};
use serde_json::json;
use tokio_test::assert_ok;

use crate::helpers::{memory_cluster, pending_alarm, test_config, unreachable_url, wait_for};

#[tokio::test]
async fn test_unreachable_target_keeps_timer_armed() {
    let (cluster, backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());

    let id = account
        .create_healthcheck(HealthcheckRequest::new(unreachable_url(), true, 1))
        .await
        .unwrap();

    let update = wait_for(Duration::from_secs(10), || {
        let account = account.clone();
        let id = id.clone();
        async move { account.snapshot().await.unwrap().updates.get(&id).cloned() }
    })
    .await
    .expect("probe never ran");

    assert_eq!(update.health, Health::Unhealthy);
    assert_eq!(update.reason, "exception");

    // Re-armed after the failed probe
    let probed_at = update.timestamp;
    let rearmed = wait_for(Duration::from_secs(5), || {
        let backend = backend.clone();
        let id = id.clone();
        async move {
            backend
                .get_alarm("healthcheck", id.as_str())
                .await
                .unwrap()
                .filter(|fire_at| *fire_at > probed_at)
        }
    })
    .await;
    assert!(rearmed.is_some());

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_corrupt_healthcheck_state_surfaces_as_error() {
    let (cluster, backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());

    let id = account
        .create_healthcheck(HealthcheckRequest::new("https://x", false, 60))
        .await
        .unwrap();

    // Corrupt the persisted config behind a fresh cluster's back
    cluster.shutdown().await;
    backend
        .put_value("healthcheck", id.as_str(), "config", json!("not a config"))
        .await
        .unwrap();

    let cluster = Cluster::start(&test_config(), backend).await.unwrap();
    let account = cluster.account(account.id().clone());

    let result = account.get_healthcheck(id.clone()).await;
    assert!(matches!(
        result,
        Err(MonitorError::Runtime(RuntimeError::NoReply { .. }))
    ));

    // The account itself is unaffected
    let snapshot = assert_ok!(account.snapshot().await);
    assert!(snapshot.healthchecks.contains_key(&id));

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_failed_delete_forward_keeps_account_entry() {
    let (cluster, backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());

    let id = account
        .create_healthcheck(HealthcheckRequest::new("https://x", false, 60))
        .await
        .unwrap();
    account
        .report_result(HealthcheckResult {
            id: id.clone(),
            account_id: account.id().clone(),
            health: Health::Healthy,
            reason: "OK".to_string(),
            code: 200,
            latency_ms: 3,
            timestamp: chrono::Utc::now(),
        })
        .unwrap();
    let before = wait_for(Duration::from_secs(5), || {
        let account = account.clone();
        async move {
            let snapshot = account.snapshot().await.unwrap();
            (!snapshot.updates.is_empty()).then_some(snapshot)
        }
    })
    .await
    .expect("report never arrived");

    // Make the health check fail to activate
    cluster.shutdown().await;
    backend
        .put_value("healthcheck", id.as_str(), "config", json!("not a config"))
        .await
        .unwrap();

    let cluster = Cluster::start(&test_config(), backend).await.unwrap();
    let account = cluster.account(account.id().clone());

    let result = account.delete_healthcheck(id.clone()).await;
    assert!(matches!(result, Err(MonitorError::Runtime(_))));

    let after = assert_ok!(account.snapshot().await);
    assert!(after.healthchecks.contains_key(&id));
    assert_eq!(after.updates.get(&id), before.updates.get(&id));

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_late_report_after_delete_is_still_mirrored() {
    let (cluster, _backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());

    let id = account
        .create_healthcheck(HealthcheckRequest::new("https://x", false, 60))
        .await
        .unwrap();
    account.delete_healthcheck(id.clone()).await.unwrap();

    account
        .report_result(HealthcheckResult {
            id: id.clone(),
            account_id: account.id().clone(),
            health: Health::Healthy,
            reason: "OK".to_string(),
            code: 200,
            latency_ms: 3,
            timestamp: chrono::Utc::now(),
        })
        .unwrap();

    let snapshot = wait_for(Duration::from_secs(5), || {
        let account = account.clone();
        async move {
            let snapshot = account.snapshot().await.unwrap();
            (!snapshot.updates.is_empty()).then_some(snapshot)
        }
    })
    .await
    .expect("report never arrived");

    assert!(snapshot.updates.contains_key(&id));
    assert!(!snapshot.healthchecks.contains_key(&id));

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_requests_after_shutdown_fail() {
    let (cluster, _backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());
    account.snapshot().await.unwrap();

    cluster.shutdown().await;

    assert!(matches!(
        account.snapshot().await,
        Err(MonitorError::Runtime(RuntimeError::Stopped))
    ));
    assert!(matches!(
        cluster.healthcheck(ActorId::new_unique()).details().await,
        Err(MonitorError::Runtime(RuntimeError::Stopped))
    ));
}

fn current_thread_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[test]
fn test_alarm_survives_crash_during_probe() {
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());

    // Accepts connections but never answers
    let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let silent_url = format!("http://{}/", silent.local_addr().unwrap());

    let mut config = test_config();
    config.probe.timeout_secs = 30;

    // Tasks of a current-thread runtime only run inside block_on, so dropping
    // it stops the probe where it is
    let crashed = current_thread_runtime();
    let id = crashed.block_on(async {
        let cluster = Cluster::start(&config, backend.clone()).await.unwrap();
        let account = cluster.account(cluster.create_account().await.unwrap());
        let id = account
            .create_healthcheck(HealthcheckRequest::new(silent_url, true, 1))
            .await
            .unwrap();

        // The alarm fires after a second, then the probe hangs
        tokio::time::sleep(Duration::from_millis(2500)).await;
        id
    });
    drop(crashed);
    drop(silent);

    current_thread_runtime().block_on(async {
        assert!(pending_alarm(&backend, &id).await.is_some());

        let cluster = Cluster::start(&test_config(), backend.clone()).await.unwrap();
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

        assert_eq!(history.latest().unwrap().reason, "exception");

        cluster.shutdown().await;
    });
}
