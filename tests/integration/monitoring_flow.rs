//! End-to-end monitoring flow through accounts and health checks
//!
//! These tests verify that:
//! - Accounts stamp and register the health checks they create
//! - Alarms drive probes whose results reach history and the account
//! - History stays bounded with FIFO eviction
//! - The timer follows the `enabled` flag
//! - Deletes are idempotent at the health check and not-found at the account

use std::time::Duration;

use edge_healthchecks::{
    Health, HealthcheckRequest,
    actors::MonitorError,
    history::MAX_HISTORY,
    runtime::ActorId,
};
use pretty_assertions::assert_eq;

use crate::helpers::{memory_cluster, pending_alarm, target, unreachable_url, wait_for};

#[tokio::test]
async fn test_create_registers_exactly_one_healthcheck() {
    let (cluster, _backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());

    let id = account
        .create_healthcheck(HealthcheckRequest::new("https://x", true, 60))
        .await
        .unwrap();

    let snapshot = account.snapshot().await.unwrap();
    assert_eq!(snapshot.healthchecks.keys().collect::<Vec<_>>(), vec![&id]);
    assert!(snapshot.updates.is_empty());

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_firing_records_result_and_reports_to_account() {
    let server = target(200).await;
    let (cluster, _backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());

    let id = account
        .create_healthcheck(HealthcheckRequest::new(server.uri(), true, 1))
        .await
        .unwrap();

    let update = wait_for(Duration::from_secs(10), || {
        let account = account.clone();
        let id = id.clone();
        async move { account.snapshot().await.unwrap().updates.get(&id).cloned() }
    })
    .await
    .expect("result never reached the account");

    assert_eq!(update.health, Health::Healthy);
    assert_eq!(update.code, 200);
    assert_eq!(&update.account_id, account.id());

    let details = account.get_healthcheck(id).await.unwrap();
    let first = details.history.iter().next().unwrap();
    assert_eq!(first.health, Health::Healthy);
    assert_eq!(first.code, 200);

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_eleven_probes_keep_the_latest_ten() {
    let server = target(200).await;
    let (cluster, _backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());

    let id = account
        .create_healthcheck(HealthcheckRequest::new(server.uri(), false, 60))
        .await
        .unwrap();
    let healthcheck = cluster.healthcheck(id.clone());

    let mut results = Vec::new();
    for _ in 0..11 {
        results.push(healthcheck.check_now().await.unwrap());
    }

    let history: Vec<_> = account
        .get_healthcheck(id)
        .await
        .unwrap()
        .history
        .iter()
        .cloned()
        .collect();

    assert_eq!(history.len(), MAX_HISTORY);
    assert_eq!(history, results[1..].to_vec());

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_failing_targets_are_recorded_as_unhealthy() {
    let server = target(500).await;
    let (cluster, _backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());

    let broken = account
        .create_healthcheck(HealthcheckRequest::new(server.uri(), false, 60))
        .await
        .unwrap();
    let down = account
        .create_healthcheck(HealthcheckRequest::new(unreachable_url(), false, 60))
        .await
        .unwrap();

    let result = cluster.healthcheck(broken).check_now().await.unwrap();
    assert_eq!(result.health, Health::Unhealthy);
    assert_eq!(result.code, 500);
    assert_eq!(result.reason, "Internal Server Error");

    let result = cluster.healthcheck(down).check_now().await.unwrap();
    assert_eq!(result.health, Health::Unhealthy);
    assert_eq!(result.code, 0);
    assert_eq!(result.reason, "exception");
    assert_eq!(result.latency_ms, -1);

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_timer_follows_enabled_flag() {
    let (cluster, backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());

    let id = account
        .create_healthcheck(HealthcheckRequest::new("https://x", false, 60))
        .await
        .unwrap();
    assert_eq!(pending_alarm(&backend, &id).await, None);

    account
        .update_healthcheck(id.clone(), HealthcheckRequest::new("https://x", true, 60))
        .await
        .unwrap();
    assert!(pending_alarm(&backend, &id).await.is_some());

    account
        .update_healthcheck(id.clone(), HealthcheckRequest::new("https://x", false, 60))
        .await
        .unwrap();
    assert_eq!(pending_alarm(&backend, &id).await, None);

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_delete_is_idempotent_and_final() {
    let (cluster, backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());

    let id = account
        .create_healthcheck(HealthcheckRequest::new("https://x", true, 60))
        .await
        .unwrap();

    assert_eq!(account.delete_healthcheck(id.clone()).await.unwrap(), id);
    assert!(matches!(
        account.delete_healthcheck(id.clone()).await,
        Err(MonitorError::NotFound(_))
    ));

    // Deleting the health check itself again is a no-op
    assert_eq!(cluster.healthcheck(id.clone()).delete().await.unwrap(), id);

    let details = cluster.healthcheck(id.clone()).details().await.unwrap();
    assert_eq!(details.config, None);
    assert!(details.history.is_empty());
    assert_eq!(pending_alarm(&backend, &id).await, None);
    assert!(account.snapshot().await.unwrap().healthchecks.is_empty());

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_unregistered_delete_leaves_state_untouched() {
    let (cluster, _backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());
    account
        .create_healthcheck(HealthcheckRequest::new("https://x", false, 60))
        .await
        .unwrap();
    let before = account.snapshot().await.unwrap();

    let result = account.delete_healthcheck(ActorId::new_unique()).await;
    assert!(matches!(result, Err(MonitorError::NotFound(_))));
    assert_eq!(account.snapshot().await.unwrap(), before);

    cluster.shutdown().await;
}
