//! Zenoh bridge for DD-WRT routers.
//!
//! Polls each router's `<page>.live.asp` status page with HTTP basic auth,
//! parses the `active_wireless` client table and publishes one gauge per
//! client value.
//!
//! # Key Expressions
//!
//! ```text
//! zensight/ddwrt/<router>/<mac>.<metric>
//! ```
//!
//! where `<metric>` is one of `noise`, `SNR`, `tx`, `rx`, `quality`, `signal`.
//! Values a router reports as `N/A` are not published.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod poller;

pub use config::{DdwrtBridgeConfig, DdwrtConfig, RouterConfig};
pub use error::{Result, RouterError};
pub use fetcher::{RouterClient, StatusPage};
pub use parser::WirelessClient;
pub use poller::{RouterPoller, collect_router, fetch_clients};
