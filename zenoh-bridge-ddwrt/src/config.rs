//! Configuration for the DD-WRT bridge.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use zensight_bridge_framework::{BridgeConfig, BridgeError, Format, LoggingConfig, ZenohConfig};

use crate::fetcher::WIRELESS_PAGE;

/// Complete bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdwrtBridgeConfig {
    /// Zenoh connection settings.
    #[serde(default)]
    pub zenoh: ZenohConfig,

    /// Payload serialization format.
    #[serde(default)]
    pub serialization: Format,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Router polling settings.
    pub ddwrt: DdwrtConfig,
}

/// Router polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdwrtConfig {
    /// Key expression prefix (default: "zensight/ddwrt").
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Poll interval in seconds (default: 60).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-request timeout in seconds. Unset or 0 means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Routers to poll, in order.
    pub routers: Vec<RouterConfig>,
}

fn default_key_prefix() -> String {
    "zensight/ddwrt".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

/// One router to poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Name used as the telemetry source.
    pub name: String,

    /// Base URL of the router's web interface.
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Password of the `admin` account.
    pub password: String,

    /// Live status page holding the wireless client table.
    #[serde(default = "default_page")]
    pub page: String,
}

fn default_domain() -> String {
    "http://127.0.0.1".to_string()
}

fn default_page() -> String {
    WIRELESS_PAGE.to_string()
}

impl BridgeConfig for DdwrtBridgeConfig {
    fn zenoh(&self) -> &ZenohConfig {
        &self.zenoh
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn key_prefix(&self) -> &str {
        &self.ddwrt.key_prefix
    }

    fn serialization(&self) -> Format {
        self.serialization
    }

    fn validate(&self) -> Result<(), BridgeError> {
        if self.ddwrt.poll_interval_secs == 0 {
            return Err(BridgeError::validation("poll_interval_secs must be > 0"));
        }

        if self.ddwrt.routers.is_empty() {
            return Err(BridgeError::validation("At least one router must be configured"));
        }

        let mut names = HashSet::new();
        for router in &self.ddwrt.routers {
            if router.name.is_empty() {
                return Err(BridgeError::validation("Router name cannot be empty"));
            }
            if !names.insert(router.name.as_str()) {
                return Err(BridgeError::validation(format!(
                    "Duplicate router name: {}",
                    router.name
                )));
            }
            if router.page.is_empty() {
                return Err(BridgeError::validation(format!(
                    "Router {}: page cannot be empty",
                    router.name
                )));
            }
        }

        Ok(())
    }
}
