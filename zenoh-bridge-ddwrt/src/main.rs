//! Zenoh bridge for DD-WRT routers.
//!
//! Runs the router poller, or with `probe` performs one ad-hoc fetch and
//! prints the parsed wireless clients.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use zensight_bridge_framework::{
    BridgeArgs, BridgeConfig, BridgeRunner, LoggingConfig, parse_cli_from,
};
use zensight_common::http::{build_client, timeout_from_secs};
use zensight_common::init_tracing;

use zenoh_bridge_ddwrt::config::{DdwrtBridgeConfig, RouterConfig};
use zenoh_bridge_ddwrt::fetcher::WIRELESS_PAGE;
use zenoh_bridge_ddwrt::poller::{RouterPoller, fetch_clients};

const DEFAULT_CONFIG: &str = "ddwrt.json5";

#[derive(Parser, Debug)]
#[command(name = "zenoh-bridge-ddwrt", about = "DD-WRT wireless client bridge", version)]
struct Cli {
    #[command(flatten)]
    args: BridgeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch one router once and print its wireless clients as JSON.
    Probe {
        /// Base URL of the router (e.g. http://192.168.1.1).
        url: String,

        /// Password of the admin account.
        password: String,

        /// Live status page to fetch.
        #[arg(long, default_value = WIRELESS_PAGE)]
        page: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli: Cli = parse_cli_from(std::env::args_os(), DEFAULT_CONFIG);

    match cli.command {
        Some(Command::Probe {
            url,
            password,
            page,
        }) => probe(url, password, page, cli.args.log_level).await,
        None => run_bridge(cli.args).await,
    }
}

async fn probe(url: String, password: String, page: String, log_level: Option<String>) -> Result<()> {
    let logging = LoggingConfig::default().with_level(log_level.as_deref().unwrap_or("warn"));
    init_tracing(&logging)?;

    let router = RouterConfig {
        name: "probe".to_string(),
        domain: url,
        password,
        page,
    };

    let http = build_client(None)?;
    let clients = fetch_clients(&http, &router)
        .await
        .with_context(|| format!("Failed to probe {}", router.domain))?;

    println!("{}", serde_json::to_string_pretty(&clients)?);
    Ok(())
}

async fn run_bridge(args: BridgeArgs) -> Result<()> {
    let config = DdwrtBridgeConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    let mut runner = BridgeRunner::new_with_args("ddwrt", config, Some(&args))
        .await?
        .with_status_publishing();

    let ddwrt_config = runner.config().ddwrt.clone();
    let http = build_client(timeout_from_secs(ddwrt_config.timeout_secs))
        .context("Failed to build HTTP client")?;

    tracing::info!(
        prefix = %ddwrt_config.key_prefix,
        routers = ddwrt_config.routers.len(),
        interval_secs = ddwrt_config.poll_interval_secs,
        "DD-WRT bridge configured"
    );

    let metadata = serde_json::json!({
        "routers": ddwrt_config.routers.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "poll_interval_secs": ddwrt_config.poll_interval_secs,
    });

    let poller = RouterPoller::new(ddwrt_config, http, runner.publisher());

    if args.once {
        let stats = poller.poll_once().await;
        tracing::info!(published = stats.success, failed = stats.failed, "Single pass complete");
        runner.shutdown().await?;
        return Ok(());
    }

    runner.spawn(poller.run());
    runner.run_with_metadata(Some(metadata)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_bridge_flags() {
        let cli: Cli = parse_cli_from(["zenoh-bridge-ddwrt", "--once"], DEFAULT_CONFIG);

        assert!(cli.command.is_none());
        assert_eq!(cli.args.config, PathBuf::from("ddwrt.json5"));
        assert!(cli.args.once);
        assert!(cli.args.log_level.is_none());
    }

    #[test]
    fn test_fetch_subcommand() {
        let cli: Cli = parse_cli_from(
            [
                "zenoh-bridge-ddwrt",
                "--log-level",
                "debug",
                "probe",
                "http://192.168.1.1",
                "secret",
            ],
            DEFAULT_CONFIG,
        );

        assert_eq!(cli.args.log_level.as_deref(), Some("debug"));
        match cli.command {
            Some(Command::Probe {
                url,
                password,
                page,
            }) => {
                assert_eq!(url, "http://192.168.1.1");
                assert_eq!(password, "secret");
                assert_eq!(page, WIRELESS_PAGE);
            }
            None => panic!("expected probe subcommand"),
        }
    }
}
