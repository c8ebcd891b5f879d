//! HTTP probe execution
//!
//! A probe is a single GET against the configured URL. Every outcome,
//! including transport failures and timeouts, is turned into a
//! [`ProbeOutcome`]; probing never fails.

use std::time::Instant;

use reqwest::Client;
use tracing::{instrument, trace, warn};

use crate::Health;
use crate::config::ProbeConfig;

/// Reason recorded when no response was received
pub const EXCEPTION_REASON: &str = "exception";

/// Classified result of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub health: Health,

    /// HTTP status code, 0 if no response was received
    pub code: u16,

    /// Canonical status text, or [`EXCEPTION_REASON`]
    pub reason: String,

    /// Time to response headers in milliseconds, -1 if no response was received
    pub latency_ms: i64,
}

impl ProbeOutcome {
    fn exception() -> Self {
        Self {
            health: Health::Unhealthy,
            code: 0,
            reason: EXCEPTION_REASON.to_string(),
            latency_ms: -1,
        }
    }
}

/// Shared HTTP client used by every health check
#[derive(Debug, Clone)]
pub struct ProbeExecutor {
    client: Client,
}

impl ProbeExecutor {
    pub fn new(config: &ProbeConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    /// Issue one GET and classify the outcome
    #[instrument(skip(self))]
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        trace!("probing {url}");

        let start = Instant::now();
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("probe of {url} failed: {e}");
                return ProbeOutcome::exception();
            }
        };
        let latency_ms = i64::try_from(start.elapsed().as_millis()).unwrap_or(i64::MAX);

        let status = response.status();
        let outcome = ProbeOutcome {
            health: if status.is_success() {
                Health::Healthy
            } else {
                Health::Unhealthy
            },
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            latency_ms,
        };

        trace!(
            "probe of {url} returned {} in {}ms",
            outcome.code, outcome.latency_ms
        );
        outcome
    }
}
