//! Zenoh bridge for Elasticsearch.
//!
//! Polls the health, cluster stats, node stats and index stats APIs of one
//! or more instances and publishes every numeric value as a gauge.
//!
//! # Key Expressions
//!
//! ```text
//! zensight/elasticsearch/<source>/<metric path>
//! ```
//!
//! `<source>` is always the instance host. In single-instance mode metric
//! paths are unprefixed (`cluster.health.number_of_nodes`). With `instances`
//! configured, paths start with `<alias>.`
//! (`zensight/elasticsearch/es1/prod.cluster.health.number_of_nodes`).
//!
//! # Logstash mode
//!
//! Daily indices named `<prefix>-YYYY.MM.DD` are summed into one
//! `indices.<prefix>` bucket with an `indexes_in_group` count.

pub mod aggregator;
pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod flatten;
pub mod poller;

pub use aggregator::MetricAggregator;
pub use client::ClusterClient;
pub use collector::ClusterCollector;
pub use config::{ElasticsearchConfig, EsBridgeConfig, InstanceTarget, Instances, StatGroup};
pub use error::{ClusterError, Result};
pub use flatten::{flatten, flatten_numeric};
pub use poller::{ClusterPoller, collect_instance};
