//! Telemetry publisher for Zenoh.

use std::sync::Arc;

use zensight_common::{Format, KeyExprBuilder, MetricSample, Protocol, TelemetryPoint, encode};

use crate::error::{BridgeError, Result};

/// Publisher for sending telemetry to Zenoh.
///
/// This is the publish sink of every bridge: one Zenoh put per metric, keyed
/// `<key_prefix>/<source>/<metric path>`.
#[derive(Clone, Debug)]
pub struct Publisher {
    session: Arc<zenoh::Session>,
    keys: KeyExprBuilder,
    format: Format,
}

impl Publisher {
    /// Create a new publisher.
    pub fn new(
        session: Arc<zenoh::Session>,
        key_prefix: impl Into<String>,
        format: Format,
    ) -> Self {
        Self {
            session,
            keys: KeyExprBuilder::with_prefix(key_prefix),
            format,
        }
    }

    /// Get the key prefix.
    pub fn key_prefix(&self) -> &str {
        self.keys.prefix()
    }

    /// Get the serialization format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Build the full key expression for a source and metric path.
    pub fn build_key(&self, source: &str, metric: &str) -> String {
        self.keys.build(source, metric)
    }

    /// Key expression for this bridge's status messages.
    pub fn status_key(&self) -> String {
        self.keys.status_key()
    }

    /// Publish a telemetry point under its own source and metric.
    pub async fn publish(&self, point: &TelemetryPoint) -> Result<()> {
        let key = self.build_key(&point.source, &point.metric);
        let payload =
            encode(point, self.format).map_err(|e| BridgeError::Serialization(e.to_string()))?;

        self.publish_raw(&key, payload).await?;
        tracing::trace!(key = %key, "Published telemetry");
        Ok(())
    }

    /// Publish numeric samples for one source, one put per sample.
    ///
    /// Failures are logged and counted; they never stop the remaining samples.
    pub async fn publish_samples<I>(&self, source: &str, protocol: Protocol, samples: I) -> PublishStats
    where
        I: IntoIterator<Item = MetricSample>,
    {
        let mut stats = PublishStats::default();

        for sample in samples {
            let point = sample.into_point(source, protocol);
            match self.publish(&point).await {
                Ok(()) => stats.success += 1,
                Err(e) => {
                    stats.failed += 1;
                    tracing::warn!(source = %source, error = %e, "Failed to publish telemetry");
                }
            }
        }

        stats
    }

    /// Publish raw bytes to a key (for status messages, etc.).
    pub async fn publish_raw(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        self.session
            .put(key, payload)
            .await
            .map_err(|e| BridgeError::Publish {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    /// Publish a JSON value to a key.
    pub async fn publish_json<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.publish_raw(key, payload).await
    }
}

/// Statistics from a batch publish operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishStats {
    /// Number of successfully published points.
    pub success: usize,
    /// Number of failed publishes.
    pub failed: usize,
}

impl PublishStats {
    /// Total number of attempted publishes.
    pub fn total(&self) -> usize {
        self.success + self.failed
    }
}

impl std::ops::AddAssign for PublishStats {
    fn add_assign(&mut self, other: Self) {
        self.success += other.success;
        self.failed += other.failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_stats() {
        let mut stats = PublishStats::default();
        assert_eq!(stats.total(), 0);

        stats.success = 8;
        stats.failed = 2;
        assert_eq!(stats.total(), 10);
    }

    #[test]
    fn test_publish_stats_accumulate() {
        let mut stats = PublishStats {
            success: 3,
            failed: 0,
        };
        stats += PublishStats {
            success: 1,
            failed: 1,
        };
        assert_eq!(
            stats,
            PublishStats {
                success: 4,
                failed: 1
            }
        );
    }
}
