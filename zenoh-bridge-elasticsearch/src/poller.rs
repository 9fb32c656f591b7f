//! Periodic polling of the configured cluster instances.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use zensight_bridge_framework::{BridgeError, MetricSample, Protocol, PublishStats, Publisher};

use crate::client::ClusterClient;
use crate::collector::ClusterCollector;
use crate::config::{ElasticsearchConfig, InstanceTarget};

/// Collect the samples of one instance, prefixed with its alias.
pub async fn collect_instance(
    http: &reqwest::Client,
    target: &InstanceTarget,
    config: &ElasticsearchConfig,
) -> Vec<MetricSample> {
    let client = ClusterClient::new(http.clone(), target.clone());
    let collector = ClusterCollector::new(client, config);

    collector.collect().await.into_samples(&target.alias)
}

/// Poller publishing cluster metrics for every configured instance.
pub struct ClusterPoller {
    config: ElasticsearchConfig,
    targets: Vec<InstanceTarget>,
    http: reqwest::Client,
    publisher: Publisher,
}

impl ClusterPoller {
    /// Create a poller. The HTTP client is reused across passes.
    pub fn new(
        config: ElasticsearchConfig,
        http: reqwest::Client,
        publisher: Publisher,
    ) -> Result<Self, BridgeError> {
        let targets = config.targets()?;

        Ok(Self {
            config,
            targets,
            http,
            publisher,
        })
    }

    pub fn targets(&self) -> &[InstanceTarget] {
        &self.targets
    }

    /// Run the polling loop. Passes never overlap.
    pub async fn run(self) {
        let mut ticker = interval(Duration::from_secs(self.config.poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            instances = self.targets.len(),
            interval_secs = self.config.poll_interval_secs,
            logstash_mode = self.config.logstash_mode,
            "Starting cluster poller"
        );

        loop {
            ticker.tick().await;
            let stats = self.poll_once().await;

            tracing::debug!(
                metrics = stats.total(),
                published = stats.success,
                failed = stats.failed,
                "Cluster poll pass complete"
            );
        }
    }

    /// Poll every instance once, one after another.
    ///
    /// Each instance's samples are published as soon as it has been collected.
    pub async fn poll_once(&self) -> PublishStats {
        let mut stats = PublishStats::default();

        for target in &self.targets {
            let samples = collect_instance(&self.http, target, &self.config).await;
            if samples.is_empty() {
                tracing::warn!(instance = %target, "No metrics collected");
                continue;
            }

            stats += self
                .publisher
                .publish_samples(target.source(), Protocol::Elasticsearch, samples)
                .await;
        }

        stats
    }
}
