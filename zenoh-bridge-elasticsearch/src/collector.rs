//! Collection of cluster, node and index metrics from one instance.
//!
//! Every metric group is fetched and recorded independently: a failed
//! request only leaves its own group out of the pass.

use serde_json::Value;

use crate::aggregator::{MetricAggregator, path_segment};
use crate::client::ClusterClient;
use crate::config::{ElasticsearchConfig, StatGroup};
use crate::flatten::flatten_numeric;

pub const CLUSTER_HEALTH_PATH: &str = "_cluster/health";
pub const CLUSTER_STATS_PATH: &str = "_cluster/stats";
pub const NODES_STATS_PATH: &str = "_nodes/stats";
pub const INDEX_STATS_PATH: &str =
    "_stats?clear=true&docs=true&store=true&indexing=true&get=true&search=true";

const HEALTH_KEYS: [&str; 7] = [
    "number_of_nodes",
    "number_of_data_nodes",
    "active_primary_shards",
    "active_shards",
    "relocating_shards",
    "initializing_shards",
    "unassigned_shards",
];

/// `cluster.indices.<metric>` and where it is found under `indices`.
const CLUSTER_INDEX_METRICS: &[(&str, &[&str])] = &[
    ("count", &["count"]),
    ("docs.count", &["docs", "count"]),
    ("docs.deleted", &["docs", "deleted"]),
    ("store.size", &["store", "size_in_bytes"]),
    ("fielddata.memory_size", &["fielddata", "memory_size_in_bytes"]),
    ("filter_cache.memory_size", &["filter_cache", "memory_size_in_bytes"]),
    ("id_cache.memory_size", &["id_cache", "memory_size_in_bytes"]),
    ("completion.size", &["completion", "size_in_bytes"]),
    ("segments.count", &["segments", "count"]),
    ("segments.memory", &["segments", "memory_in_bytes"]),
    ("percolate.total", &["percolate", "total"]),
    ("percolate.time", &["percolate", "time_in_millis"]),
    ("percolate.current", &["percolate", "current"]),
    ("percolate.memory_size", &["percolate", "memory_size_in_bytes"]),
    ("percolate.queries", &["percolate", "queries"]),
];

const CLUSTER_STATUSES: [&str; 3] = ["red", "yellow", "green"];

/// Node stats groups always requested.
const BASE_NODE_GROUPS: [&str; 5] = ["indices", "process", "transport", "http", "fs"];

/// Flattened node stats left out, per group.
const NODE_INDICES_EXCLUDED: &[&str] = &["percolate.memory_size"];
const NODE_PROCESS_EXCLUDED: &[&str] = &["timestamp"];
const NODE_JVM_EXCLUDED: &[&str] = &["timestamp", "uptime_in_millis"];
const NODE_FS_EXCLUDED: &[&str] = &["path", "mount", "dev"];

/// Record `cluster.health.*` from a `_cluster/health` document.
pub fn record_cluster_health(agg: &mut MetricAggregator, health: &Value) {
    for key in HEALTH_KEYS {
        if let Some(value) = health.get(key).and_then(Value::as_f64) {
            agg.set(format!("cluster.health.{}", key), value);
        }
    }
}

/// Record `cluster.indices.*`, `cluster.nodes.count.*` and the one-hot
/// `cluster.status.*` from a `_cluster/stats` document.
pub fn record_cluster_stats(agg: &mut MetricAggregator, stats: &Value) {
    if let Some(indices) = stats.get("indices") {
        for (metric, data_path) in CLUSTER_INDEX_METRICS {
            agg.record_at(format!("cluster.indices.{}", metric), indices, data_path);
        }
    }

    if let Some(counts) = stats.get("nodes").and_then(|nodes| nodes.get("count")) {
        agg.copy_one_level("cluster.nodes.count", counts, |_| true);
    }

    if let Some(status) = stats.get("status").and_then(Value::as_str) {
        if CLUSTER_STATUSES.contains(&status) {
            for candidate in CLUSTER_STATUSES {
                let value = if candidate == status { 1.0 } else { 0.0 };
                agg.set(format!("cluster.status.{}", candidate), value);
            }
        } else {
            tracing::debug!(status = %status, "Unknown cluster status");
        }
    }
}

/// `_nodes/stats/<groups>` path for the enabled stat groups.
pub fn nodes_stats_path(config: &ElasticsearchConfig) -> String {
    let mut groups: Vec<&str> = BASE_NODE_GROUPS.to_vec();
    if config.collects(StatGroup::Jvm) {
        groups.push("jvm");
    }
    if config.collects(StatGroup::ThreadPool) {
        groups.push("thread_pool");
    }
    format!("{}/{}", NODES_STATS_PATH, groups.join(","))
}

fn set_flattened(agg: &mut MetricAggregator, prefix: &str, data: Option<&Value>, excluded: &[&str]) {
    let Some(data) = data else {
        return;
    };

    for (path, value) in flatten_numeric(data) {
        if !excluded.contains(&path.as_str()) {
            agg.set(format!("{}.{}", prefix, path), value);
        }
    }
}

/// Record `nodes.<name>.*` for every node of a `_nodes/stats` document.
pub fn record_node_stats(agg: &mut MetricAggregator, document: &Value, config: &ElasticsearchConfig) {
    let Some(nodes) = document.get("nodes").and_then(Value::as_object) else {
        return;
    };

    for (id, node) in nodes {
        let name = node.get("name").and_then(Value::as_str).unwrap_or(id);
        let prefix = format!("nodes.{}", path_segment(name));

        if let Some(http) = node.get("http") {
            agg.record_at(format!("{}.http.current", prefix), http, &["current_open"]);
        }

        set_flattened(agg, &format!("{}.indices", prefix), node.get("indices"), NODE_INDICES_EXCLUDED);
        set_flattened(agg, &format!("{}.process", prefix), node.get("process"), NODE_PROCESS_EXCLUDED);
        set_flattened(agg, &format!("{}.transport", prefix), node.get("transport"), &[]);

        if config.collects(StatGroup::ThreadPool) {
            set_flattened(agg, &format!("{}.thread_pool", prefix), node.get("thread_pool"), &[]);
        }
        if config.collects(StatGroup::Jvm) {
            set_flattened(agg, &format!("{}.jvm", prefix), node.get("jvm"), NODE_JVM_EXCLUDED);
        }

        let datas = node
            .get("fs")
            .and_then(|fs| fs.get("data"))
            .and_then(Value::as_array);
        for (n, data) in datas.into_iter().flatten().enumerate() {
            let Some(entries) = data.as_object() else {
                continue;
            };
            for (key, value) in entries {
                if NODE_FS_EXCLUDED.contains(&key.as_str()) {
                    continue;
                }
                if let Some(value) = value.as_f64() {
                    agg.set(format!("{}.fs.datas.{}.{}", prefix, n, key), value);
                }
            }
        }
    }
}

/// Record `indices._all.*` and per-index (or per-bucket) metrics from a
/// `_stats` document.
pub fn record_index_stats(agg: &mut MetricAggregator, document: &Value, logstash_mode: bool) {
    let Some(all) = document.get("_all") else {
        return;
    };

    if let Some(primaries) = all.get("primaries") {
        agg.index_metrics("indices._all", primaries, logstash_mode);
    }

    let Some(indices) = all
        .get("indices")
        .or_else(|| document.get("indices"))
        .and_then(Value::as_object)
    else {
        return;
    };

    for (name, index) in indices {
        if let Some(primaries) = index.get("primaries") {
            let prefix = format!("indices.{}", path_segment(name));
            agg.index_metrics(&prefix, primaries, logstash_mode);
        }
    }
}

/// Collector for one instance.
#[derive(Debug, Clone)]
pub struct ClusterCollector<'a> {
    client: ClusterClient,
    config: &'a ElasticsearchConfig,
}

impl<'a> ClusterCollector<'a> {
    pub fn new(client: ClusterClient, config: &'a ElasticsearchConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &ClusterClient {
        &self.client
    }

    /// Run one collection pass against the instance.
    pub async fn collect(&self) -> MetricAggregator {
        let mut agg = MetricAggregator::new();

        if let Some(health) = self.client.get(CLUSTER_HEALTH_PATH, None).await {
            record_cluster_health(&mut agg, &health);
        }

        if self.config.collects(StatGroup::Cluster) {
            if let Some(stats) = self.client.get(CLUSTER_STATS_PATH, None).await {
                record_cluster_stats(&mut agg, &stats);
            }
        }

        let nodes_path = nodes_stats_path(self.config);
        if let Some(nodes) = self.client.get(&nodes_path, Some("nodes")).await {
            record_node_stats(&mut agg, &nodes, self.config);
        }

        if self.config.collects(StatGroup::Indices) {
            if let Some(indices) = self.client.get(INDEX_STATS_PATH, Some("_all")).await {
                record_index_stats(&mut agg, &indices, self.config.logstash_mode);
            }
        }

        tracing::debug!(
            instance = %self.client.target(),
            metrics = agg.len(),
            "Collected cluster metrics"
        );

        agg
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use serde_json::json;

    fn all_stats() -> ElasticsearchConfig {
        ElasticsearchConfig::default()
    }

    fn no_optional_stats() -> ElasticsearchConfig {
        ElasticsearchConfig {
            stats: BTreeSet::new(),
            ..ElasticsearchConfig::default()
        }
    }

    #[test]
    fn test_cluster_health() {
        let health = json!({
            "cluster_name": "prod",
            "status": "green",
            "number_of_nodes": 3,
            "number_of_data_nodes": 2,
            "active_primary_shards": 10,
            "active_shards": 20,
            "relocating_shards": 0,
            "initializing_shards": 0,
        });
        let mut agg = MetricAggregator::new();
        record_cluster_health(&mut agg, &health);

        assert_eq!(agg.get("cluster.health.number_of_nodes"), Some(3.0));
        assert_eq!(agg.get("cluster.health.active_shards"), Some(20.0));
        assert_eq!(agg.get("cluster.health.unassigned_shards"), None);
        assert_eq!(agg.len(), 6);
    }

    #[test]
    fn test_cluster_stats() {
        let stats = json!({
            "status": "yellow",
            "indices": {
                "count": 4,
                "docs": {"count": 100, "deleted": 1},
                "store": {"size_in_bytes": 5000},
                "fielddata": {"memory_size_in_bytes": 10},
                "segments": {"count": 7, "memory_in_bytes": 700},
            },
            "nodes": {"count": {"total": 3, "master": 1, "data": 2}},
        });
        let mut agg = MetricAggregator::new();
        record_cluster_stats(&mut agg, &stats);

        assert_eq!(agg.get("cluster.indices.count"), Some(4.0));
        assert_eq!(agg.get("cluster.indices.docs.count"), Some(100.0));
        assert_eq!(agg.get("cluster.indices.store.size"), Some(5000.0));
        assert_eq!(agg.get("cluster.indices.fielddata.memory_size"), Some(10.0));
        assert_eq!(agg.get("cluster.indices.segments.memory"), Some(700.0));
        assert_eq!(agg.get("cluster.indices.percolate.total"), None);
        assert_eq!(agg.get("cluster.nodes.count.data"), Some(2.0));
        assert_eq!(agg.get("cluster.status.yellow"), Some(1.0));
        assert_eq!(agg.get("cluster.status.red"), Some(0.0));
        assert_eq!(agg.get("cluster.status.green"), Some(0.0));
    }

    #[test]
    fn test_nodes_stats_path() {
        assert_eq!(
            nodes_stats_path(&all_stats()),
            "_nodes/stats/indices,process,transport,http,fs,jvm,thread_pool"
        );
        assert_eq!(
            nodes_stats_path(&no_optional_stats()),
            "_nodes/stats/indices,process,transport,http,fs"
        );
    }

    fn node_document() -> Value {
        json!({
            "nodes": {
                "abc123": {
                    "name": "node-1",
                    "http": {"current_open": 4, "total_opened": 40},
                    "indices": {
                        "docs": {"count": 12},
                        "percolate": {"memory_size": "0b", "memory_size_in_bytes": 0},
                    },
                    "process": {"timestamp": 1700000000, "open_file_descriptors": 200},
                    "jvm": {
                        "timestamp": 1700000000,
                        "uptime_in_millis": 5000,
                        "mem": {"heap_used_in_bytes": 1024},
                    },
                    "thread_pool": {"search": {"threads": 4, "queue": 0}},
                    "transport": {"rx_count": 11},
                    "fs": {"data": [
                        {"path": "/var/lib/es", "mount": "/", "dev": "sda1", "free_in_bytes": 500},
                        {"path": "/data", "total_in_bytes": 900},
                    ]},
                },
            },
        })
    }

    #[test]
    fn test_node_stats() {
        let mut agg = MetricAggregator::new();
        record_node_stats(&mut agg, &node_document(), &all_stats());

        assert_eq!(agg.get("nodes.node-1.http.current"), Some(4.0));
        assert_eq!(agg.get("nodes.node-1.indices.docs.count"), Some(12.0));
        assert_eq!(agg.get("nodes.node-1.indices.percolate.memory_size_in_bytes"), Some(0.0));
        assert_eq!(agg.get("nodes.node-1.process.timestamp"), None);
        assert_eq!(agg.get("nodes.node-1.process.open_file_descriptors"), Some(200.0));
        assert_eq!(agg.get("nodes.node-1.jvm.timestamp"), None);
        assert_eq!(agg.get("nodes.node-1.jvm.uptime_in_millis"), None);
        assert_eq!(agg.get("nodes.node-1.jvm.mem.heap_used_in_bytes"), Some(1024.0));
        assert_eq!(agg.get("nodes.node-1.thread_pool.search.threads"), Some(4.0));
        assert_eq!(agg.get("nodes.node-1.transport.rx_count"), Some(11.0));
        assert_eq!(agg.get("nodes.node-1.fs.datas.0.free_in_bytes"), Some(500.0));
        assert_eq!(agg.get("nodes.node-1.fs.datas.1.total_in_bytes"), Some(900.0));
    }

    #[test]
    fn test_node_stats_respects_disabled_groups() {
        let mut agg = MetricAggregator::new();
        record_node_stats(&mut agg, &node_document(), &no_optional_stats());

        assert_eq!(agg.get("nodes.node-1.jvm.mem.heap_used_in_bytes"), None);
        assert_eq!(agg.get("nodes.node-1.thread_pool.search.threads"), None);
        assert_eq!(agg.get("nodes.node-1.http.current"), Some(4.0));
    }

    #[test]
    fn test_index_stats_modern_layout() {
        let document = json!({
            "_all": {"primaries": {"docs": {"count": 30}}},
            "indices": {
                "logstash-web-2024.01.01": {"primaries": {"docs": {"count": 10}}},
                "logstash-web-2024.01.02": {"primaries": {"docs": {"count": 20}}},
                "users": {"primaries": {"docs": {"count": 5}}},
            },
        });
        let mut agg = MetricAggregator::new();
        record_index_stats(&mut agg, &document, true);

        assert_eq!(agg.get("indices._all.docs.count"), Some(30.0));
        assert_eq!(agg.get("indices.logstash-web.docs.count"), Some(30.0));
        assert_eq!(agg.get("indices.logstash-web.indexes_in_group"), Some(2.0));
        assert_eq!(agg.get("indices.users.docs.count"), Some(5.0));
    }

    #[test]
    fn test_index_stats_legacy_layout() {
        let document = json!({
            "_all": {
                "primaries": {"docs": {"count": 1}},
                "indices": {"old": {"primaries": {"docs": {"count": 1}}}},
            },
        });
        let mut agg = MetricAggregator::new();
        record_index_stats(&mut agg, &document, false);

        assert_eq!(agg.get("indices.old.docs.count"), Some(1.0));
    }

    #[test]
    fn test_dotted_index_names_are_published() {
        let document = json!({
            "_all": {"primaries": {"docs": {"count": 7}}},
            "indices": {
                ".kibana": {"primaries": {"docs": {"count": 2}}},
                "web": {"primaries": {"docs": {"count": 5}}},
            },
        });
        let mut agg = MetricAggregator::new();
        record_index_stats(&mut agg, &document, false);

        let samples = agg.into_samples("");
        let paths: Vec<&str> = samples.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "indices._all.docs.count",
                "indices._kibana.docs.count",
                "indices.web.docs.count",
            ]
        );
        assert_eq!(samples[1].value, 2.0);
    }

    #[test]
    fn test_dotted_daily_indices_share_a_bucket() {
        let document = json!({
            "_all": {"primaries": {"docs": {"count": 6}}},
            "indices": {
                ".monitoring-es-8-2024.01.01": {"primaries": {"docs": {"count": 1}}},
                ".monitoring-es-8-2024.01.02": {"primaries": {"docs": {"count": 5}}},
            },
        });
        let mut agg = MetricAggregator::new();
        record_index_stats(&mut agg, &document, true);

        let samples = agg.into_samples("es1");
        let metrics: Vec<(&str, f64)> =
            samples.iter().map(|s| (s.path.as_str(), s.value)).collect();
        assert!(metrics.contains(&("es1.indices._monitoring-es-8.docs.count", 6.0)));
        assert!(metrics.contains(&("es1.indices._monitoring-es-8.indexes_in_group", 2.0)));
        assert_eq!(metrics.len(), 3);
    }

    #[test]
    fn test_dotted_node_name_is_published() {
        let document = json!({
            "nodes": {
                "xyz": {"name": ".hidden", "http": {"current_open": 1}},
            },
        });
        let mut agg = MetricAggregator::new();
        record_node_stats(&mut agg, &document, &all_stats());

        let samples = agg.into_samples("");
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].path, "nodes._hidden.http.current");
    }
}
