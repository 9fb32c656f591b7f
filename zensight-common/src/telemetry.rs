use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// A single telemetry data point emitted by bridges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryPoint {
    /// Unix epoch milliseconds when the measurement was taken.
    pub timestamp: i64,

    /// Target identifier (router name or cluster instance host).
    pub source: String,

    /// Origin protocol.
    pub protocol: Protocol,

    /// Dotted metric path (e.g., "nodes.node1.jvm.mem.heap_used_in_bytes").
    pub metric: String,

    /// The measured value.
    pub value: f64,
}

impl TelemetryPoint {
    /// Create a new telemetry point with the current timestamp.
    pub fn new(
        source: impl Into<String>,
        protocol: Protocol,
        metric: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            timestamp: current_timestamp_millis(),
            source: source.into(),
            protocol,
            metric: metric.into(),
            value,
        }
    }
}

/// Protocol identifier for telemetry sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// DD-WRT router administration pages.
    Ddwrt,
    /// Elasticsearch HTTP stats API.
    Elasticsearch,
}

impl Protocol {
    /// Get the string representation used in key expressions.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Ddwrt => "ddwrt",
            Protocol::Elasticsearch => "elasticsearch",
        }
    }

    /// Parse the key expression representation.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "ddwrt" => Some(Protocol::Ddwrt),
            "elasticsearch" => Some(Protocol::Elasticsearch),
            _ => None,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One numeric sample addressed by a dotted metric path.
///
/// The path is a non-empty sequence of non-empty segments joined by `.`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub path: String,
    pub value: f64,
}

impl MetricSample {
    /// Create a sample. Returns `None` if the path is not a valid dotted path.
    pub fn new(path: impl Into<String>, value: f64) -> Option<Self> {
        let path = path.into();
        if is_valid_metric_path(&path) {
            Some(Self { path, value })
        } else {
            None
        }
    }

    /// Return a copy of this sample with `prefix.` prepended to the path.
    ///
    /// An empty prefix leaves the path unchanged.
    pub fn prefixed(&self, prefix: &str) -> Self {
        if prefix.is_empty() {
            self.clone()
        } else {
            Self {
                path: join_metric_path([prefix, self.path.as_str()]),
                value: self.value,
            }
        }
    }

    /// Convert into a telemetry point for the given source.
    pub fn into_point(self, source: impl Into<String>, protocol: Protocol) -> TelemetryPoint {
        TelemetryPoint::new(source, protocol, self.path, self.value)
    }
}

/// Check that a metric path is a non-empty sequence of non-empty `.`-joined segments.
pub fn is_valid_metric_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(|segment| !segment.is_empty())
}

/// Join path segments with `.`, skipping empty segments.
pub fn join_metric_path<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    segments
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Get the current timestamp in milliseconds since Unix epoch.
///
/// Returns 0 if system time is before Unix epoch (should never happen in practice).
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telemetry_point_creation() {
        let point = TelemetryPoint::new(
            "router01",
            Protocol::Ddwrt,
            "AA:BB:CC:DD:EE:FF.signal",
            -50.0,
        );

        assert_eq!(point.source, "router01");
        assert_eq!(point.protocol, Protocol::Ddwrt);
        assert_eq!(point.metric, "AA:BB:CC:DD:EE:FF.signal");
        assert_eq!(point.value, -50.0);
        assert!(point.timestamp > 0);
    }

    #[test]
    fn test_protocol_display() {
        assert_eq!(Protocol::Ddwrt.as_str(), "ddwrt");
        assert_eq!(Protocol::Elasticsearch.to_string(), "elasticsearch");
        assert_eq!(
            Protocol::from_str_opt("elasticsearch"),
            Some(Protocol::Elasticsearch)
        );
        assert_eq!(Protocol::from_str_opt("snmp"), None);
    }

    #[test]
    fn test_metric_path_validation() {
        assert!(is_valid_metric_path("cluster.health.active_shards"));
        assert!(is_valid_metric_path("single"));
        assert!(!is_valid_metric_path(""));
        assert!(!is_valid_metric_path("a..b"));
        assert!(!is_valid_metric_path(".leading"));
        assert!(!is_valid_metric_path("trailing."));
    }

    #[test]
    fn test_metric_sample() {
        assert!(MetricSample::new("", 1.0).is_none());

        let sample = MetricSample::new("cluster.health.number_of_nodes", 3.0).unwrap();
        assert_eq!(
            sample.prefixed("es1").path,
            "es1.cluster.health.number_of_nodes"
        );
        assert_eq!(sample.prefixed("").path, "cluster.health.number_of_nodes");

        let point = sample.into_point("es1", Protocol::Elasticsearch);
        assert_eq!(point.value, 3.0);
        assert_eq!(point.source, "es1");
        assert_eq!(point.metric, "cluster.health.number_of_nodes");
    }

    #[test]
    fn test_join_metric_path() {
        assert_eq!(join_metric_path(["nodes", "n1", "http"]), "nodes.n1.http");
        assert_eq!(join_metric_path(["", "indices", "_all"]), "indices._all");
    }
}
