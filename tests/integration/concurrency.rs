//! Concurrency behaviour of the actor runtime under the monitoring protocol
//!
//! These tests verify that:
//! - Concurrent creates on one account are serialized without lost updates
//! - Concurrent probes of one health check all land in its history
//! - Accounts are isolated from each other

use std::collections::BTreeSet;

use edge_healthchecks::HealthcheckRequest;
use futures::future::join_all;
use pretty_assertions::assert_eq;

use crate::helpers::{memory_cluster, target};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creates_on_one_account() {
    let (cluster, _backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());

    let creates = (0..20).map(|i| {
        let account = account.clone();
        async move {
            account
                .create_healthcheck(HealthcheckRequest::new(
                    format!("https://service-{i}.example"),
                    false,
                    60,
                ))
                .await
                .unwrap()
        }
    });
    let ids: BTreeSet<_> = join_all(creates).await.into_iter().collect();

    assert_eq!(ids.len(), 20);
    let snapshot = account.snapshot().await.unwrap();
    assert_eq!(snapshot.healthchecks.keys().cloned().collect::<BTreeSet<_>>(), ids);

    cluster.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_probes_all_recorded() {
    let server = target(200).await;
    let (cluster, _backend) = memory_cluster().await;
    let account = cluster.account(cluster.create_account().await.unwrap());
    let id = account
        .create_healthcheck(HealthcheckRequest::new(server.uri(), false, 60))
        .await
        .unwrap();

    let probes = (0..8).map(|_| {
        let healthcheck = cluster.healthcheck(id.clone());
        async move { healthcheck.check_now().await.unwrap() }
    });
    join_all(probes).await;

    let details = account.get_healthcheck(id).await.unwrap();
    assert_eq!(details.history.len(), 8);

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_accounts_are_isolated() {
    let (cluster, _backend) = memory_cluster().await;
    let first = cluster.account(cluster.create_account().await.unwrap());
    let second = cluster.account(cluster.create_account().await.unwrap());

    let id = first
        .create_healthcheck(HealthcheckRequest::new("https://x", false, 60))
        .await
        .unwrap();

    assert!(second.snapshot().await.unwrap().healthchecks.is_empty());
    assert!(second.get_healthcheck(id).await.is_err());

    cluster.shutdown().await;
}
