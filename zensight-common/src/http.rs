//! HTTP client construction shared by polling bridges.

use std::time::Duration;

use crate::error::Result;

/// User agent sent by every bridge request.
pub const USER_AGENT: &str = concat!("zensight/", env!("CARGO_PKG_VERSION"));

/// Build the HTTP client a poller reuses across passes.
///
/// `timeout` bounds each whole request. `None` leaves requests unbounded,
/// which is the historical behavior of the collectors.
pub fn build_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}

/// Convert an optional seconds setting into a request timeout.
///
/// Zero is treated as "no timeout".
pub fn timeout_from_secs(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|s| *s > 0).map(Duration::from_secs)
}
