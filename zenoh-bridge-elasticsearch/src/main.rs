//! Zenoh bridge for Elasticsearch.
//!
//! Polls cluster, node and index statistics and publishes them to Zenoh.

use anyhow::{Context, Result};
use zensight_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};
use zensight_common::http::{build_client, timeout_from_secs};

use zenoh_bridge_elasticsearch::config::EsBridgeConfig;
use zenoh_bridge_elasticsearch::poller::ClusterPoller;

#[tokio::main]
async fn main() -> Result<()> {
    let args = BridgeArgs::parse_with_default("elasticsearch.json5");

    let config = EsBridgeConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    let mut runner = BridgeRunner::new_with_args("elasticsearch", config, Some(&args))
        .await?
        .with_status_publishing();

    let es_config = runner.config().elasticsearch.clone();
    let http = build_client(timeout_from_secs(es_config.timeout_secs))
        .context("Failed to build HTTP client")?;

    let poller = ClusterPoller::new(es_config.clone(), http, runner.publisher())?;

    let instances: Vec<String> = poller.targets().iter().map(|t| t.to_string()).collect();
    tracing::info!(
        prefix = %es_config.key_prefix,
        instances = ?instances,
        interval_secs = es_config.poll_interval_secs,
        "Elasticsearch bridge configured"
    );

    if args.once {
        let stats = poller.poll_once().await;
        tracing::info!(published = stats.success, failed = stats.failed, "Single pass complete");
        runner.shutdown().await?;
        return Ok(());
    }

    let metadata = serde_json::json!({
        "instances": instances,
        "stats": es_config.stats,
        "logstash_mode": es_config.logstash_mode,
        "poll_interval_secs": es_config.poll_interval_secs,
    });

    runner.spawn(poller.run());
    runner.run_with_metadata(Some(metadata)).await?;

    Ok(())
}
