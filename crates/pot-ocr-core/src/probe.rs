//! Liveness check against the service's `/health` endpoint

use std::time::Duration;

use crate::config::ServiceEndpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Unreachable,
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable)
    }
}

#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: reqwest::Client,
}

impl HealthProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Never fails: every error maps to `Unreachable`.
    pub async fn probe(&self, endpoint: &ServiceEndpoint, timeout: Duration) -> ProbeOutcome {
        let url = endpoint.health_url();
        match self.client.get(&url).timeout(timeout).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Reachable,
            Ok(response) => {
                tracing::debug!("Health check {} returned {}", url, response.status());
                ProbeOutcome::Unreachable
            }
            Err(e) => {
                tracing::debug!("Health check {} failed: {}", url, e);
                ProbeOutcome::Unreachable
            }
        }
    }
}

/// Loopback HTTP client shared by the probe and the recognition client
pub fn local_client() -> reqwest::Client {
    // Only fails if the TLS backend cannot initialise; the default client
    // has the same requirements, so fall back to it.
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve, unused_port};
    use axum::{http::StatusCode, routing::get, Router};

    #[tokio::test]
    async fn healthy_service_is_reachable() {
        let endpoint = serve(Router::new().route("/health", get(|| async { "ok" }))).await;
        let probe = HealthProbe::new(local_client());
        assert_eq!(
            probe.probe(&endpoint, Duration::from_secs(2)).await,
            ProbeOutcome::Reachable
        );
    }

    #[tokio::test]
    async fn error_status_is_unreachable() {
        let endpoint = serve(Router::new().route(
            "/health",
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        ))
        .await;
        let probe = HealthProbe::new(local_client());
        assert_eq!(
            probe.probe(&endpoint, Duration::from_secs(2)).await,
            ProbeOutcome::Unreachable
        );
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        let endpoint = ServiceEndpoint::new("127.0.0.1", unused_port().await);
        let probe = HealthProbe::new(local_client());
        assert!(!probe
            .probe(&endpoint, Duration::from_millis(500))
            .await
            .is_reachable());
    }

    #[tokio::test]
    async fn slow_health_check_times_out() {
        let endpoint = serve(Router::new().route(
            "/health",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;
        let probe = HealthProbe::new(local_client());
        let started = std::time::Instant::now();
        let outcome = probe.probe(&endpoint, Duration::from_millis(200)).await;
        assert_eq!(outcome, ProbeOutcome::Unreachable);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
