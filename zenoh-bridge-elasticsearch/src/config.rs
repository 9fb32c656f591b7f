//! Configuration for the Elasticsearch bridge.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use zensight_bridge_framework::{BridgeConfig, BridgeError, Format, LoggingConfig, ZenohConfig};

/// Alias given to instance entries written without `alias@`.
pub const DEFAULT_ALIAS: &str = "default";

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsBridgeConfig {
    /// Zenoh connection settings.
    #[serde(default)]
    pub zenoh: ZenohConfig,

    /// Payload serialization format.
    #[serde(default)]
    pub serialization: Format,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Cluster polling settings.
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,
}

/// Cluster polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Key expression prefix (default: "zensight/elasticsearch").
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Host used in single-instance mode and as default for instance entries.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port used in single-instance mode and for entries without `:port`.
    #[serde(default = "default_port")]
    pub port: u16,

    /// `[alias@]host[:port]` entries. Empty means single-instance mode.
    #[serde(default)]
    pub instances: Instances,

    /// Optional stat groups to collect (default: all).
    #[serde(default = "default_stats")]
    pub stats: BTreeSet<StatGroup>,

    /// Sum `<prefix>-YYYY.MM.DD` indices into one `<prefix>` bucket.
    #[serde(default)]
    pub logstash_mode: bool,

    /// Poll interval in seconds (default: 60).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-request timeout in seconds. Unset or 0 means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            host: default_host(),
            port: default_port(),
            instances: Instances::default(),
            stats: default_stats(),
            logstash_mode: false,
            poll_interval_secs: default_poll_interval(),
            timeout_secs: None,
        }
    }
}

fn default_key_prefix() -> String {
    "zensight/elasticsearch".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9200
}

fn default_stats() -> BTreeSet<StatGroup> {
    StatGroup::ALL.into_iter().collect()
}

fn default_poll_interval() -> u64 {
    60
}

/// Optional groups of statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatGroup {
    /// Per-node JVM stats.
    Jvm,
    /// Per-node thread pool stats.
    ThreadPool,
    /// Per-index stats.
    Indices,
    /// Cluster-wide stats.
    Cluster,
}

impl StatGroup {
    pub const ALL: [StatGroup; 4] = [
        StatGroup::Jvm,
        StatGroup::ThreadPool,
        StatGroup::Indices,
        StatGroup::Cluster,
    ];
}

/// The `instances` setting: one entry or a list of entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instances {
    One(String),
    Many(Vec<String>),
}

impl Default for Instances {
    fn default() -> Self {
        Instances::Many(Vec::new())
    }
}

impl Instances {
    /// Entries as a slice, whichever form was configured.
    pub fn entries(&self) -> &[String] {
        match self {
            Instances::One(entry) => std::slice::from_ref(entry),
            Instances::Many(entries) => entries,
        }
    }
}

/// One monitored cluster instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceTarget {
    /// Metric path prefix; empty in single-instance mode.
    pub alias: String,
    pub host: String,
    pub port: u16,
}

impl InstanceTarget {
    /// Target of single-instance mode.
    pub fn single(host: impl Into<String>, port: u16) -> Self {
        Self {
            alias: String::new(),
            host: host.into(),
            port,
        }
    }

    /// Parse an `[alias@]host[:port]` entry.
    pub fn parse(entry: &str, default_port: u16) -> Result<Self, BridgeError> {
        let (alias, address) = match entry.split_once('@') {
            Some((alias, address)) => (alias, address),
            None => (DEFAULT_ALIAS, entry),
        };

        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => {
                let port: u16 = port.parse().map_err(|_| {
                    BridgeError::validation(format!("Invalid port in instance '{}'", entry))
                })?;
                (host, port)
            }
            None => (address, default_port),
        };

        if alias.is_empty() {
            return Err(BridgeError::validation(format!(
                "Empty alias in instance '{}'",
                entry
            )));
        }
        if host.is_empty() {
            return Err(BridgeError::validation(format!(
                "Empty host in instance '{}'",
                entry
            )));
        }
        if port == 0 {
            return Err(BridgeError::validation(format!(
                "Invalid port in instance '{}'",
                entry
            )));
        }

        Ok(Self {
            alias: alias.to_string(),
            host: host.to_string(),
            port,
        })
    }

    /// Base URL of the instance, with a trailing `/`.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    /// Telemetry source: the instance host.
    ///
    /// The alias is carried by the metric path only, so keys read
    /// `<prefix>/<host>/<alias>.<metric>`.
    pub fn source(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for InstanceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alias.is_empty() {
            write!(f, "{}:{}", self.host, self.port)
        } else {
            write!(f, "{}@{}:{}", self.alias, self.host, self.port)
        }
    }
}

impl ElasticsearchConfig {
    /// Normalize `instances` into the list of targets to poll.
    pub fn targets(&self) -> Result<Vec<InstanceTarget>, BridgeError> {
        let entries = self.instances.entries();
        if entries.is_empty() {
            return Ok(vec![InstanceTarget::single(&self.host, self.port)]);
        }

        let targets = entries
            .iter()
            .map(|entry| InstanceTarget::parse(entry, self.port))
            .collect::<Result<Vec<_>, _>>()?;

        let mut aliases = HashSet::new();
        for target in &targets {
            if !aliases.insert(target.alias.as_str()) {
                return Err(BridgeError::validation(format!(
                    "Duplicate instance alias: {}",
                    target.alias
                )));
            }
        }

        Ok(targets)
    }

    /// Whether an optional stat group is enabled.
    pub fn collects(&self, group: StatGroup) -> bool {
        self.stats.contains(&group)
    }
}

impl BridgeConfig for EsBridgeConfig {
    fn zenoh(&self) -> &ZenohConfig {
        &self.zenoh
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn key_prefix(&self) -> &str {
        &self.elasticsearch.key_prefix
    }

    fn serialization(&self) -> Format {
        self.serialization
    }

    fn validate(&self) -> Result<(), BridgeError> {
        if self.elasticsearch.poll_interval_secs == 0 {
            return Err(BridgeError::validation("poll_interval_secs must be > 0"));
        }
        if self.elasticsearch.port == 0 {
            return Err(BridgeError::validation("port must be > 0"));
        }

        self.elasticsearch.targets()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EsBridgeConfig::from_json5("{}").unwrap();
        let es = &config.elasticsearch;

        assert_eq!(config.key_prefix(), "zensight/elasticsearch");
        assert_eq!(es.host, "127.0.0.1");
        assert_eq!(es.port, 9200);
        assert!(!es.logstash_mode);
        assert_eq!(es.poll_interval_secs, 60);
        assert_eq!(es.timeout_secs, None);
        assert!(StatGroup::ALL.iter().all(|g| es.collects(*g)));

        let targets = es.targets().unwrap();
        assert_eq!(targets, vec![InstanceTarget::single("127.0.0.1", 9200)]);
        assert_eq!(targets[0].source(), "127.0.0.1");
    }

    #[test]
    fn test_single_instance_string() {
        let config =
            EsBridgeConfig::from_json5(r#"{ elasticsearch: { instances: "prod@es1:9201" } }"#)
                .unwrap();

        let targets = config.elasticsearch.targets().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].alias, "prod");
        assert_eq!(targets[0].host, "es1");
        assert_eq!(targets[0].port, 9201);
        assert_eq!(targets[0].source(), "es1");
    }

    #[test]
    fn test_instance_list() {
        let config = EsBridgeConfig::from_json5(
            r#"{ elasticsearch: { port: 9300, instances: ["a@es1", "b@es2:9201", "es3"] } }"#,
        )
        .unwrap();

        let targets = config.elasticsearch.targets().unwrap();
        assert_eq!(targets[0], InstanceTarget::parse("a@es1:9300", 9200).unwrap());
        assert_eq!(targets[1].port, 9201);
        assert_eq!(targets[2].alias, DEFAULT_ALIAS);
        assert_eq!(targets[2].port, 9300);
        assert_eq!(targets[1].base_url(), "http://es2:9201/");
    }

    #[test]
    fn test_stats_subset() {
        let config = EsBridgeConfig::from_json5(
            r#"{ elasticsearch: { stats: ["jvm", "indices"], logstash_mode: true } }"#,
        )
        .unwrap();

        let es = &config.elasticsearch;
        assert!(es.collects(StatGroup::Jvm));
        assert!(es.collects(StatGroup::Indices));
        assert!(!es.collects(StatGroup::ThreadPool));
        assert!(!es.collects(StatGroup::Cluster));
        assert!(es.logstash_mode);
    }

    #[test]
    fn test_unknown_stat_group_rejected() {
        let result = EsBridgeConfig::from_json5(r#"{ elasticsearch: { stats: ["gc"] } }"#);
        assert!(matches!(result, Err(BridgeError::ConfigParse(_))));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let result =
            EsBridgeConfig::from_json5(r#"{ elasticsearch: { instances: ["es1", "es2"] } }"#);
        assert!(matches!(result, Err(BridgeError::ConfigValidation(_))));
    }

    #[test]
    fn test_bad_port_rejected() {
        for entry in ["a@es1:http", "a@es1:0", "a@es1:70000"] {
            let json = format!(r#"{{ elasticsearch: {{ instances: ["{}"] }} }}"#, entry);
            let result = EsBridgeConfig::from_json5(&json);
            assert!(
                matches!(result, Err(BridgeError::ConfigValidation(_))),
                "{} should be rejected",
                entry
            );
        }
    }

    #[test]
    fn test_empty_host_rejected() {
        assert!(InstanceTarget::parse("a@", 9200).is_err());
        assert!(InstanceTarget::parse("@es1", 9200).is_err());
    }

    #[test]
    fn test_display() {
        let target = InstanceTarget::parse("a@es1:9201", 9200).unwrap();
        assert_eq!(target.to_string(), "a@es1:9201");
        assert_eq!(InstanceTarget::single("es1", 9200).to_string(), "es1:9200");
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "{{ serialization: 'cbor', elasticsearch: {{ instances: ['a@es1', 'b@es2'], timeout_secs: 10 }} }}"
        )
        .unwrap();

        let config = EsBridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.serialization(), Format::Cbor);
        assert_eq!(config.elasticsearch.timeout_secs, Some(10));
        assert_eq!(config.elasticsearch.targets().unwrap().len(), 2);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = EsBridgeConfig::from_json5("{ elasticsearch: { poll_interval_secs: 0 } }");
        assert!(matches!(result, Err(BridgeError::ConfigValidation(_))));
    }
}
