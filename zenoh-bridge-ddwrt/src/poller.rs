//! Periodic polling of the configured routers.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use zensight_bridge_framework::{MetricSample, PublishStats, Publisher, Protocol};

use crate::config::{DdwrtConfig, RouterConfig};
use crate::error::Result;
use crate::fetcher::RouterClient;
use crate::parser::{WirelessClient, clients_by_mac};

/// Fetch and parse the wireless client table of one router.
pub async fn fetch_clients(http: &reqwest::Client, router: &RouterConfig) -> Result<Vec<WirelessClient>> {
    let client = RouterClient::new(http.clone(), &router.domain, router.password.clone());
    let page = client.refresh(&router.page).await?;

    Ok(clients_by_mac(page.wireless_clients()?))
}

/// Collect the metric samples of one router.
///
/// Any fetch or parse error aborts the whole router.
pub async fn collect_router(http: &reqwest::Client, router: &RouterConfig) -> Result<Vec<MetricSample>> {
    let clients = fetch_clients(http, router).await?;

    tracing::debug!(router = %router.name, clients = clients.len(), "Parsed wireless clients");

    Ok(clients.iter().flat_map(WirelessClient::samples).collect())
}

/// Poller publishing wireless client metrics for every configured router.
pub struct RouterPoller {
    config: DdwrtConfig,
    http: reqwest::Client,
    publisher: Publisher,
}

impl RouterPoller {
    /// Create a poller. The HTTP client is reused across passes.
    pub fn new(config: DdwrtConfig, http: reqwest::Client, publisher: Publisher) -> Self {
        Self {
            config,
            http,
            publisher,
        }
    }

    /// Run the polling loop. Passes never overlap.
    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(self.config.poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            routers = self.config.routers.len(),
            interval_secs = self.config.poll_interval_secs,
            "Starting router poller"
        );

        loop {
            ticker.tick().await;
            let stats = self.poll_once().await;

            tracing::debug!(
                metrics = stats.total(),
                published = stats.success,
                failed = stats.failed,
                "Router poll pass complete"
            );
        }
    }

    /// Poll every router once, one after another, and publish the results.
    ///
    /// A failing router is logged and skipped; the remaining routers still run.
    pub async fn poll_once(&self) -> PublishStats {
        let mut stats = PublishStats::default();

        for router in &self.config.routers {
            match collect_router(&self.http, router).await {
                Ok(samples) => {
                    stats += self
                        .publisher
                        .publish_samples(&router.name, Protocol::Ddwrt, samples)
                        .await;
                }
                Err(e) => {
                    tracing::warn!(router = %router.name, domain = %router.domain, error = %e, "Router poll failed");
                }
            }
        }

        stats
    }
}
