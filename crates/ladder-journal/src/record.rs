//! Typed journal rows and field parsing.

use chrono::DateTime;
use ladder_core::AssetId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Epoch values above this are milliseconds.
pub const MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// Offset-bearing ISO layouts accepted besides strict RFC 3339.
const ISO_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Fill direction as far as net position is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// BUY, LONG or OPEN.
    Buy,
    /// SELL, SHORT or CLOSE.
    Sell,
    /// Anything else; contributes nothing to net quantity.
    Other,
}

impl Side {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "BUY" | "LONG" | "OPEN" => Self::Buy,
            "SELL" | "SHORT" | "CLOSE" => Self::Sell,
            _ => Self::Other,
        }
    }

    /// Sign applied to quantity when netting positions.
    pub fn sign(&self) -> f64 {
        match self {
            Self::Buy => 1.0,
            Self::Sell => -1.0,
            Self::Other => 0.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Other => write!(f, "OTHER"),
        }
    }
}

/// One row of the fill journal.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Epoch seconds; `None` when the row's timestamp could not be parsed.
    pub timestamp: Option<i64>,
    pub asset: Option<AssetId>,
    pub side: Side,
    /// Unsigned fill quantity.
    pub quantity: f64,
    /// Realized P&L in the quote currency.
    pub realized_pnl: f64,
}

/// Parse an epoch (s or ms) or ISO-8601 timestamp into epoch seconds.
///
/// Naive ISO timestamps carry no offset and are rejected.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(v) = raw.parse::<f64>() {
        if !v.is_finite() || v.abs() >= i64::MAX as f64 {
            return None;
        }
        let secs = v.trunc() as i64;
        return Some(if secs > MILLIS_THRESHOLD {
            secs.div_euclid(1000)
        } else {
            secs
        });
    }

    let normalized = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(head) => format!("{head}+00:00"),
        None => raw.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.timestamp());
    }

    ISO_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(&normalized, fmt).ok())
        .map(|dt| dt.timestamp())
}

/// Parse a numeric field, accepting `,` as decimal separator.
///
/// Malformed values read as zero.
pub fn parse_number(raw: &str) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }
    match raw.replace(',', ".").parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
