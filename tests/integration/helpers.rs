//! Test helpers shared by the integration tests
#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use edge_healthchecks::{
    cluster::Cluster,
    runtime::ActorId,
    config::{Config, ProbeConfig},
    storage::{MemoryBackend, StorageBackend},
};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Config with a short probe timeout and no passivation
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.probe = ProbeConfig {
        timeout_secs: 2,
        ..ProbeConfig::default()
    };
    config.runtime.idle_timeout_secs = None;
    config
}

pub async fn memory_cluster() -> (Arc<Cluster>, Arc<dyn StorageBackend>) {
    let backend: Arc<dyn StorageBackend> = Arc::new(MemoryBackend::new());
    let cluster = Cluster::start(&test_config(), backend.clone()).await.unwrap();
    (cluster, backend)
}

/// Mock probe target answering every GET with `status`
pub async fn target(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

/// A URL nobody is listening on
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

/// Poll `check` every 50ms until it yields a value or `timeout` passes
pub async fn wait_for<T, F, Fut>(timeout: Duration, mut check: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(value) = check().await {
            return Some(value);
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Persisted alarm of a health check
pub async fn pending_alarm(backend: &Arc<dyn StorageBackend>, id: &ActorId) -> Option<DateTime<Utc>> {
    backend.get_alarm("healthcheck", id.as_str()).await.unwrap()
}
