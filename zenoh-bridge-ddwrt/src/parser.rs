//! Parsing of the router's `active_wireless` status blob.
//!
//! The blob is a single wrapped, quote-delimited, comma-separated list in
//! which every 9 consecutive fields describe one associated client:
//!
//! ```text
//! ('AA:BB:CC:DD:EE:FF','eth1','1:02:03','1000','2000','-50','-95','30','x')
//!   mac                 if     uptime    tx     rx     signal noise snr  -
//! ```

use std::collections::HashMap;

use serde::Serialize;
use zensight_common::MetricSample;

use crate::error::{Result, RouterError};

/// Number of blob fields per wireless client.
pub const CLIENT_FIELDS: usize = 9;

/// Field separator inside the `active_wireless` blob.
const FIELD_SEPARATOR: &str = "','";

/// One associated wireless client, as reported in a single poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WirelessClient {
    /// Client MAC address (key of the record).
    pub mac: String,
    /// Radio interface name.
    #[serde(rename = "if")]
    pub interface: String,
    /// Association uptime, verbatim.
    pub uptime: String,
    /// Transmit rate.
    pub tx: Option<i64>,
    /// Receive rate.
    pub rx: Option<i64>,
    /// Signal level in dBm.
    pub signal: Option<i64>,
    /// Noise floor in dBm.
    pub noise: Option<i64>,
    /// Signal to noise ratio.
    #[serde(rename = "SNR")]
    pub snr: Option<i64>,
    /// Derived quality score, see [`quality_score`].
    pub quality: Option<f64>,
}

impl WirelessClient {
    /// Numeric values in publishing order, keyed by metric name.
    pub fn metrics(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("noise", self.noise.map(|v| v as f64)),
            ("SNR", self.snr.map(|v| v as f64)),
            ("tx", self.tx.map(|v| v as f64)),
            ("rx", self.rx.map(|v| v as f64)),
            ("quality", self.quality),
            ("signal", self.signal.map(|v| v as f64)),
        ]
    }

    /// Metric samples `<mac>.<metric>` for every value present.
    pub fn samples(&self) -> Vec<MetricSample> {
        self.metrics()
            .into_iter()
            .filter_map(|(name, value)| {
                MetricSample::new(format!("{}.{}", self.mac, name), value?)
            })
            .collect()
    }
}

/// Strip one leading and one trailing wrapper character.
///
/// Inputs shorter than two characters become empty.
pub fn strip_wrapper(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

/// Strip a leading and/or a trailing single quote, independently.
pub fn unquote(txt: &str) -> &str {
    let txt = txt.strip_prefix('\'').unwrap_or(txt);
    txt.strip_suffix('\'').unwrap_or(txt)
}

/// Parse an integer that may carry a `K`, `M` or `G` multiplier suffix.
///
/// Empty and `N/A` inputs are absent values.
pub fn ununit(txt: &str) -> Result<Option<i64>> {
    if txt.is_empty() || txt == "N/A" {
        return Ok(None);
    }

    if let Ok(value) = txt.parse::<i64>() {
        return Ok(Some(value));
    }

    // Non-empty, so there is a last character.
    let unit = txt.chars().last().unwrap_or_default();
    let multiplier: i64 = match unit {
        'K' => 1_000,
        'M' => 1_000_000,
        'G' => 1_000_000_000,
        other => {
            return Err(RouterError::UnknownUnit {
                unit: other,
                value: txt.to_string(),
            });
        }
    };

    let stem = &txt[..txt.len() - unit.len_utf8()];
    let base: i64 = stem
        .parse()
        .map_err(|_| RouterError::parse(format!("invalid number '{}'", txt)))?;

    base.checked_mul(multiplier)
        .map(Some)
        .ok_or_else(|| RouterError::parse(format!("value '{}' overflows", txt)))
}

/// Quality score `signal / noise * snr`, rounded to one decimal.
///
/// Absent when any input is absent or the noise floor is zero.
pub fn quality_score(signal: Option<i64>, noise: Option<i64>, snr: Option<i64>) -> Option<f64> {
    let (signal, noise, snr) = (signal?, noise?, snr?);
    if noise == 0 {
        return None;
    }
    let score = signal as f64 / noise as f64 * snr as f64;
    Some((score * 10.0).round() / 10.0)
}

fn parse_field(field: &str) -> Result<Option<i64>> {
    ununit(unquote(field))
}

fn parse_client(chunk: &[&str]) -> Result<WirelessClient> {
    let &[mac, interface, uptime, tx, rx, signal, noise, snr, _] = chunk else {
        return Err(RouterError::parse(format!(
            "expected {} client fields, got {}",
            CLIENT_FIELDS,
            chunk.len()
        )));
    };

    let signal = parse_field(signal)?;
    let noise = parse_field(noise)?;
    let snr = parse_field(snr)?;

    Ok(WirelessClient {
        mac: unquote(mac).to_string(),
        interface: unquote(interface).to_string(),
        uptime: unquote(uptime).to_string(),
        tx: parse_field(tx)?,
        rx: parse_field(rx)?,
        signal,
        noise,
        snr,
        quality: quality_score(signal, noise, snr),
    })
}

/// Parse the raw `active_wireless` value into client records, in input order.
///
/// A trailing group of fewer than [`CLIENT_FIELDS`] fields is dropped.
pub fn parse_active_wireless(raw: &str) -> Result<Vec<WirelessClient>> {
    let inner = strip_wrapper(raw);
    if inner.is_empty() {
        return Ok(Vec::new());
    }

    let fields: Vec<&str> = inner.split(FIELD_SEPARATOR).collect();
    let chunks = fields.chunks_exact(CLIENT_FIELDS);

    let dropped = chunks.remainder().len();
    if dropped > 0 {
        tracing::debug!(dropped, "Ignoring incomplete trailing wireless client fields");
    }

    chunks.map(parse_client).collect()
}

/// Collapse duplicate MAC addresses: the last record wins, at the position
/// the MAC was first seen.
pub fn clients_by_mac(clients: Vec<WirelessClient>) -> Vec<WirelessClient> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<WirelessClient> = Vec::with_capacity(clients.len());

    for client in clients {
        match positions.get(&client.mac) {
            Some(&idx) => unique[idx] = client,
            None => {
                positions.insert(client.mac.clone(), unique.len());
                unique.push(client);
            }
        }
    }

    unique
}
