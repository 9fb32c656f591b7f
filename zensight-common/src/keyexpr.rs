use crate::telemetry::Protocol;

/// Default key expression prefix for all ZenSight telemetry.
pub const KEY_PREFIX: &str = "zensight";

/// Characters that carry meaning in Zenoh key expressions and cannot appear in a chunk.
const RESERVED_CHARS: [char; 5] = ['/', '*', '$', '?', '#'];

/// Builder for constructing ZenSight key expressions.
///
/// Key expressions follow the pattern:
/// `<prefix>/<source>/<metric_path>`
///
/// The default prefix is `zensight/<protocol>`. Dotted metric paths are kept
/// as a single chunk so they survive the round trip unchanged.
#[derive(Debug, Clone)]
pub struct KeyExprBuilder {
    prefix: String,
}

impl KeyExprBuilder {
    /// Create a new key expression builder for a protocol.
    pub fn new(protocol: Protocol) -> Self {
        Self {
            prefix: default_key_prefix(protocol),
        }
    }

    /// Create a builder with a custom prefix (e.g. from bridge configuration).
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// The prefix keys are built under.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Build a key expression for a specific source and metric.
    ///
    /// # Example
    /// ```
    /// use zensight_common::keyexpr::KeyExprBuilder;
    /// use zensight_common::telemetry::Protocol;
    ///
    /// let builder = KeyExprBuilder::new(Protocol::Elasticsearch);
    /// let key = builder.build("es1", "cluster.health.active_shards");
    /// assert_eq!(key, "zensight/elasticsearch/es1/cluster.health.active_shards");
    /// ```
    pub fn build(&self, source: &str, metric: &str) -> String {
        format!(
            "{}/{}/{}",
            self.prefix,
            sanitize_chunk(source),
            sanitize_chunk(metric)
        )
    }

    /// Build a wildcard key expression for all metrics from a source.
    ///
    /// # Example
    /// ```
    /// use zensight_common::keyexpr::KeyExprBuilder;
    /// use zensight_common::telemetry::Protocol;
    ///
    /// let builder = KeyExprBuilder::new(Protocol::Ddwrt);
    /// assert_eq!(builder.source_wildcard("router01"), "zensight/ddwrt/router01/**");
    /// ```
    pub fn source_wildcard(&self, source: &str) -> String {
        format!("{}/{}/**", self.prefix, sanitize_chunk(source))
    }

    /// Build a key expression for bridge status.
    ///
    /// # Example
    /// ```
    /// use zensight_common::keyexpr::KeyExprBuilder;
    /// use zensight_common::telemetry::Protocol;
    ///
    /// let builder = KeyExprBuilder::new(Protocol::Ddwrt);
    /// assert_eq!(builder.status_key(), "zensight/ddwrt/@/status");
    /// ```
    pub fn status_key(&self) -> String {
        format!("{}/@/status", self.prefix)
    }
}

/// The default key prefix for a protocol: `zensight/<protocol>`.
pub fn default_key_prefix(protocol: Protocol) -> String {
    format!("{}/{}", KEY_PREFIX, protocol.as_str())
}

/// Replace characters that are not allowed inside a single key expression chunk.
///
/// An empty input becomes `_` since Zenoh rejects empty chunks.
pub fn sanitize_chunk(chunk: &str) -> String {
    if chunk.is_empty() {
        return "_".to_string();
    }
    chunk
        .chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Build a wildcard key expression for all ZenSight telemetry.
pub fn all_telemetry_wildcard() -> String {
    format!("{}/**", KEY_PREFIX)
}

/// Parse a key expression under the default prefix to extract protocol, source, and metric.
///
/// Returns `None` if the key expression doesn't match `zensight/<protocol>/<source>/<metric>`
/// or addresses an administrative (`@`) channel.
pub fn parse_key_expr(key: &str) -> Option<ParsedKeyExpr<'_>> {
    let mut parts = key.splitn(4, '/');

    if parts.next()? != KEY_PREFIX {
        return None;
    }
    let protocol = Protocol::from_str_opt(parts.next()?)?;
    let source = parts.next()?;
    let metric = parts.next()?;

    if source == "@" || source.is_empty() || metric.is_empty() {
        return None;
    }

    Some(ParsedKeyExpr {
        protocol,
        source,
        metric,
    })
}

/// Parsed components of a ZenSight key expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKeyExpr<'a> {
    pub protocol: Protocol,
    pub source: &'a str,
    pub metric: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builder() {
        let builder = KeyExprBuilder::new(Protocol::Ddwrt);

        assert_eq!(
            builder.build("router01", "AA:BB:CC:DD:EE:FF.quality"),
            "zensight/ddwrt/router01/AA:BB:CC:DD:EE:FF.quality"
        );
        assert_eq!(builder.status_key(), "zensight/ddwrt/@/status");
    }

    #[test]
    fn test_custom_prefix_trailing_slash() {
        let builder = KeyExprBuilder::with_prefix("site/a/es/");
        assert_eq!(builder.prefix(), "site/a/es");
        assert_eq!(builder.build("es1", "x.y"), "site/a/es/es1/x.y");
    }

    #[test]
    fn test_sanitize_chunk() {
        assert_eq!(sanitize_chunk("logstash-web"), "logstash-web");
        assert_eq!(sanitize_chunk("weird$index*name"), "weird_index_name");
        assert_eq!(sanitize_chunk("a/b"), "a_b");
        assert_eq!(sanitize_chunk(""), "_");
    }

    #[test]
    fn test_parse_key_expr() {
        let parsed =
            parse_key_expr("zensight/elasticsearch/es1/nodes.n1.jvm.mem.heap_used_in_bytes")
                .unwrap();

        assert_eq!(parsed.protocol, Protocol::Elasticsearch);
        assert_eq!(parsed.source, "es1");
        assert_eq!(parsed.metric, "nodes.n1.jvm.mem.heap_used_in_bytes");
    }

    #[test]
    fn test_parse_invalid_key() {
        assert!(parse_key_expr("invalid/key").is_none());
        assert!(parse_key_expr("zensight/unknown/device/metric").is_none());
        assert!(parse_key_expr("other/ddwrt/device/metric").is_none());
        assert!(parse_key_expr("zensight/ddwrt/@/status").is_none());
        assert!(parse_key_expr("zensight/ddwrt/router01").is_none());
    }

    #[test]
    fn test_all_telemetry_wildcard() {
        assert_eq!(all_telemetry_wildcard(), "zensight/**");
    }
}
