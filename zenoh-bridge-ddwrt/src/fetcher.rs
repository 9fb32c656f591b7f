//! Fetching of the router's `<page>.live.asp` status pages.

use std::collections::HashMap;

use reqwest::StatusCode;

use crate::error::{Result, RouterError};
use crate::parser::{WirelessClient, parse_active_wireless};

/// Username of the router's administration account.
pub const ADMIN_USER: &str = "admin";

/// Page carrying the wireless client table.
pub const WIRELESS_PAGE: &str = "Status_Wireless";

/// Key of the wireless client blob on [`WIRELESS_PAGE`].
pub const ACTIVE_WIRELESS_KEY: &str = "active_wireless";

/// Separator between key and value on a status line.
const KEY_VALUE_SEPARATOR: &str = "::";

/// Authenticated client for one router's live status pages.
#[derive(Debug, Clone)]
pub struct RouterClient {
    http: reqwest::Client,
    base_url: String,
    password: String,
}

impl RouterClient {
    /// Create a client for the router at `domain` (e.g. `http://192.168.1.1`).
    pub fn new(http: reqwest::Client, domain: &str, password: impl Into<String>) -> Self {
        let base_url = if domain.ends_with('/') {
            domain.to_string()
        } else {
            format!("{}/", domain)
        };

        Self {
            http,
            base_url,
            password: password.into(),
        }
    }

    /// URL of a live status page.
    pub fn page_url(&self, page: &str) -> String {
        format!("{}{}.live.asp", self.base_url, page)
    }

    /// GET a status page and return its body.
    ///
    /// Anything but HTTP 200 fails the fetch; 401 and 403 are reported as
    /// authentication errors.
    pub async fn fetch(&self, page: &str) -> Result<String> {
        let url = self.page_url(page);

        let response = self
            .http
            .get(&url)
            .basic_auth(ADMIN_USER, Some(&self.password))
            .send()
            .await
            .map_err(|e| RouterError::Network {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RouterError::Auth {
                url,
                status: status.as_u16(),
            });
        }
        if status != StatusCode::OK {
            return Err(RouterError::Network {
                url,
                message: format!("unexpected HTTP status {}", status),
            });
        }

        response.text().await.map_err(|e| RouterError::Network {
            url,
            message: e.to_string(),
        })
    }

    /// Fetch a page and collect its `key::value` lines.
    pub async fn refresh(&self, page: &str) -> Result<StatusPage> {
        let body = self.fetch(page).await?;
        let page = StatusPage::parse(page, &body)?;

        tracing::debug!(page = %page.name(), keys = page.len(), "Fetched router status page");

        Ok(page)
    }
}

/// Lazily split a status page body into `(key, value)` pairs.
///
/// Each line is stripped of one wrapper character at each end (`{key::value}`)
/// and split on the first `::`. Lines that are empty once stripped are skipped.
pub fn status_lines(body: &str) -> impl Iterator<Item = Result<(&str, &str)>> + '_ {
    body.lines()
        .map(crate::parser::strip_wrapper)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_once(KEY_VALUE_SEPARATOR)
                .ok_or_else(|| RouterError::parse(format!("status line without '::': {}", line)))
        })
}

/// The key/value content of one status page.
#[derive(Debug, Clone, Default)]
pub struct StatusPage {
    name: String,
    values: HashMap<String, String>,
}

impl StatusPage {
    /// Parse a page body. Later duplicates of a key replace earlier ones.
    pub fn parse(name: &str, body: &str) -> Result<Self> {
        let mut values = HashMap::new();
        for pair in status_lines(body) {
            let (key, value) = pair?;
            values.insert(key.to_string(), value.to_string());
        }

        Ok(Self {
            name: name.to_string(),
            values,
        })
    }

    /// Page name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of keys on the page.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the page had no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw value of a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Raw value of a key, or a [`RouterError::MissingKey`].
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| RouterError::MissingKey {
            page: self.name.clone(),
            key: key.to_string(),
        })
    }

    /// Parse the wireless client table of this page.
    pub fn wireless_clients(&self) -> Result<Vec<WirelessClient>> {
        parse_active_wireless(self.require(ACTIVE_WIRELESS_KEY)?)
    }
}
