//! Per-pass metric accumulation.

use std::borrow::Cow;
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use zensight_common::MetricSample;
use zensight_common::telemetry::is_valid_metric_path;

/// Daily logstash index name: `<prefix>-YYYY.MM.DD`.
static LOGSTASH_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*)-\d\d\d\d\.\d\d\.\d\d$").unwrap());

/// Strip a `-YYYY.MM.DD` suffix, if present.
pub fn logstash_bucket(name: &str) -> Option<&str> {
    LOGSTASH_INDEX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Make an index or node name usable inside a metric path.
///
/// Leading dots become `_` (`.kibana` is `_kibana`) and any other empty
/// segment becomes `_`.
pub fn path_segment(name: &str) -> Cow<'_, str> {
    if !name.is_empty() && name.split('.').all(|segment| !segment.is_empty()) {
        return Cow::Borrowed(name);
    }

    let rest = name.trim_start_matches('.');
    let mut segment = "_".repeat(name.len() - rest.len());
    if !rest.is_empty() || segment.is_empty() {
        let rest = rest
            .split('.')
            .map(|part| if part.is_empty() { "_" } else { part })
            .collect::<Vec<_>>()
            .join(".");
        segment.push_str(&rest);
    }
    Cow::Owned(segment)
}

/// Keys copied from every index stats group.
fn is_index_counter(key: &str) -> bool {
    key.ends_with("total") || key.ends_with("time_in_millis")
}

/// Metric path to value mapping built during one collection pass.
#[derive(Debug, Default, Clone)]
pub struct MetricAggregator {
    metrics: BTreeMap<String, f64>,
}

impl MetricAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` to the metric at `path`, inserting it if absent.
    pub fn record(&mut self, path: impl Into<String>, value: f64) {
        *self.metrics.entry(path.into()).or_insert(0.0) += value;
    }

    /// Overwrite the metric at `path`.
    pub fn set(&mut self, path: impl Into<String>, value: f64) {
        self.metrics.insert(path.into(), value);
    }

    /// Record the number found at `data_path` inside `data`, if there is one.
    pub fn record_at(&mut self, path: impl Into<String>, data: &Value, data_path: &[&str]) -> bool {
        let found = data_path
            .iter()
            .try_fold(data, |current, key| current.get(key))
            .and_then(Value::as_f64);

        match found {
            Some(value) => {
                self.record(path, value);
                true
            }
            None => false,
        }
    }

    /// Record every numeric child of `data` whose key passes `predicate`.
    pub fn copy_one_level<F>(&mut self, prefix: &str, data: &Value, predicate: F)
    where
        F: Fn(&str) -> bool,
    {
        let Some(children) = data.as_object() else {
            return;
        };

        for (key, value) in children {
            if !predicate(key) {
                continue;
            }
            if let Some(value) = value.as_f64() {
                self.record(format!("{}.{}", prefix, key), value);
            }
        }
    }

    /// Apply [`copy_one_level`](Self::copy_one_level) to every child object of `data`.
    pub fn copy_two_level<F>(&mut self, prefix: &str, data: &Value, predicate: F)
    where
        F: Fn(&str) -> bool,
    {
        let Some(groups) = data.as_object() else {
            return;
        };

        for (group, values) in groups {
            self.copy_one_level(&format!("{}.{}", prefix, group), values, &predicate);
        }
    }

    /// Record the stats of one index under `prefix`.
    ///
    /// In logstash mode a daily index prefix collapses onto its bucket, and
    /// `<bucket>.indexes_in_group` counts the contributing indices.
    pub fn index_metrics(&mut self, prefix: &str, index: &Value, logstash_mode: bool) {
        let mut prefix = prefix;
        if logstash_mode {
            if let Some(bucket) = logstash_bucket(prefix) {
                prefix = bucket;
                self.record(format!("{}.indexes_in_group", prefix), 1.0);
            }
        }

        self.record_at(format!("{}.docs.count", prefix), index, &["docs", "count"]);
        self.record_at(format!("{}.docs.deleted", prefix), index, &["docs", "deleted"]);
        self.record_at(
            format!("{}.datastore.size", prefix),
            index,
            &["store", "size_in_bytes"],
        );

        self.copy_two_level(prefix, index, is_index_counter);
    }

    /// Current value at `path`.
    pub fn get(&self, path: &str) -> Option<f64> {
        self.metrics.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Samples sorted by path, each prefixed with `<alias>.` unless `alias` is empty.
    ///
    /// Paths that do not form a valid metric path are dropped.
    pub fn into_samples(self, alias: &str) -> Vec<MetricSample> {
        self.metrics
            .into_iter()
            .filter_map(|(path, value)| {
                if !is_valid_metric_path(&path) {
                    tracing::warn!(path = %path, "Dropping metric with malformed path");
                    return None;
                }
                MetricSample::new(path, value)
            })
            .map(|sample| sample.prefixed(alias))
            .collect()
    }
}
