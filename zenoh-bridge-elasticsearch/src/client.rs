//! HTTP client for one cluster instance's stats API.

use serde_json::Value;

use crate::config::InstanceTarget;
use crate::error::{ClusterError, Result};

/// Client bound to one [`InstanceTarget`].
#[derive(Debug, Clone)]
pub struct ClusterClient {
    http: reqwest::Client,
    target: InstanceTarget,
    base_url: String,
}

impl ClusterClient {
    pub fn new(http: reqwest::Client, target: InstanceTarget) -> Self {
        let base_url = target.base_url();
        Self {
            http,
            target,
            base_url,
        }
    }

    pub fn target(&self) -> &InstanceTarget {
        &self.target
    }

    /// Absolute URL of a path relative to the instance root.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET `path` and parse the body as JSON.
    pub async fn fetch(&self, path: &str) -> Result<Value> {
        let url = self.url(path);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClusterError::Network {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClusterError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| ClusterError::Network {
            url: url.clone(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&body).map_err(|e| ClusterError::Parse {
            url,
            message: e.to_string(),
        })
    }

    /// [`fetch`](Self::fetch), then require `key` at the top level of the document.
    pub async fn fetch_with_key(&self, path: &str, key: &str) -> Result<Value> {
        let document = self.fetch(path).await?;
        if document.get(key).is_none() {
            return Err(ClusterError::MissingKey {
                url: self.url(path),
                key: key.to_string(),
            });
        }
        Ok(document)
    }

    /// Soft-failing fetch: errors are logged and yield `None`.
    pub async fn get(&self, path: &str, required_key: Option<&str>) -> Option<Value> {
        let result = match required_key {
            Some(key) => self.fetch_with_key(path, key).await,
            None => self.fetch(path).await,
        };

        match result {
            Ok(document) => Some(document),
            Err(e) => {
                tracing::warn!(
                    instance = %self.target,
                    error = %e,
                    "Cluster stats request failed"
                );
                None
            }
        }
    }
}
