//! Gate decision types.
//!
//! A `GateDecision` is the ephemeral result of one entry evaluation. It is
//! never persisted; the caller decides what to do with it (size the order,
//! mark the cooldown after execution, or drop the candidate).

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Risk-sizing class of an admitted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Larger, longer-conviction size.
    Core,
    /// Smaller, speculative size. Every denial carries this bucket.
    #[default]
    #[serde(alias = "opp")]
    Opportunistic,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Opportunistic => "opportunistic",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "core" => Ok(Self::Core),
            "opportunistic" | "opp" => Ok(Self::Opportunistic),
            other => Err(CoreError::InvalidBucket(other.to_string())),
        }
    }
}

/// External lookup performed during an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookup {
    MarketMetadata,
    SafetyAssessment,
    LiquidityRefs,
}

impl Lookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MarketMetadata => "market_metadata",
            Self::SafetyAssessment => "safety_assessment",
            Self::LiquidityRefs => "liquidity_refs",
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Individual rug-filter check that rejected a young listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum RugCheck {
    Top10Concentration { share: f64, max: f64 },
    Authority { mint: bool, freeze: bool },
    LowLiquidity { pool: f64, min: f64 },
    LowActivity { tx_count: u64, min: u64 },
}

impl fmt::Display for RugCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top10Concentration { share, max } => {
                write!(f, "top10 {:.0}% > {:.0}%", share * 100.0, max * 100.0)
            }
            Self::Authority { mint, freeze } => {
                write!(f, "authority mint={} freeze={}", mint, freeze)
            }
            Self::LowLiquidity { pool, min } => write!(f, "lp {} < {}", pool, min),
            Self::LowActivity { tx_count, min } => write!(f, "tx {} < {}", tx_count, min),
        }
    }
}

/// Why an evaluation ended the way it did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GateReason {
    /// All blocking gates passed.
    Ok,
    /// Kill switch is off.
    Disabled,
    /// Entry cooldown for the asset has not elapsed.
    Cooldown { remaining_secs: i64 },
    /// Realized P&L for the day hit the loss stop.
    DayLoss { pnl: f64, stop: f64 },
    /// Intraday drawdown hit the drawdown stop.
    DayDrawdown { drawdown: f64, stop: f64 },
    /// Open position count reached the concurrency limit.
    MaxConcurrent { open: usize, max: usize },
    /// Event log could not be read; the breaker stays closed.
    DayRiskUnavailable { error: String },
    /// Momentum/volatility diagnostics did not qualify.
    Momentum,
    /// Safety assessment not ok or score below minimum.
    Safety { ok: bool, score: i64 },
    /// Young listing failed a rug heuristic.
    RugFilter { check: RugCheck, blocking: bool },
    /// Order-flow or quality score below minimum.
    Sentiment,
    /// An external lookup did not answer in time.
    LookupTimeout { lookup: Lookup },
}

impl GateReason {
    /// Gate label used for logs and metrics.
    pub fn gate(&self) -> &'static str {
        match self {
            Self::Ok => "none",
            Self::Disabled => "kill_switch",
            Self::Cooldown { .. } => "cooldown",
            Self::DayLoss { .. }
            | Self::DayDrawdown { .. }
            | Self::MaxConcurrent { .. }
            | Self::DayRiskUnavailable { .. } => "day_risk",
            Self::Momentum => "momentum",
            Self::Safety { .. } => "safety",
            Self::RugFilter { .. } => "rug_filter",
            Self::Sentiment => "sentiment",
            Self::LookupTimeout { .. } => "lookup_timeout",
        }
    }
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Disabled => write!(f, "Disabled"),
            Self::Cooldown { .. } => write!(f, "Cooldown"),
            Self::DayLoss { pnl, stop } => write!(f, "DayLoss {} <= -{}", pnl, stop),
            Self::DayDrawdown { drawdown, stop } => {
                write!(f, "DayMDD -{} <= -{}", drawdown, stop)
            }
            Self::MaxConcurrent { max, .. } => write!(f, "MaxConcurrent >= {}", max),
            Self::DayRiskUnavailable { error } => write!(f, "DayRisk unavailable: {}", error),
            Self::Momentum => write!(f, "S1(momo/vol/ADX) fail"),
            Self::Safety { .. } => write!(f, "Sanity fail"),
            Self::RugFilter { check, blocking } => {
                let mode = if *blocking { "block" } else { "warn" };
                write!(f, "RugFilter {}: {}", mode, check)
            }
            Self::Sentiment => write!(f, "S3(senti/flow) fail"),
            Self::LookupTimeout { lookup } => write!(f, "Timeout: {}", lookup),
        }
    }
}

/// Outcome of `allow_entry`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    pub reason: GateReason,
    pub bucket: Bucket,
}

impl GateDecision {
    /// Admit with the given bucket.
    pub fn allow(bucket: Bucket) -> Self {
        Self {
            allowed: true,
            reason: GateReason::Ok,
            bucket,
        }
    }

    /// Deny. Denials always size as opportunistic.
    pub fn deny(reason: GateReason) -> Self {
        Self {
            allowed: false,
            reason,
            bucket: Bucket::Opportunistic,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allow={} bucket={} reason={}",
            self.allowed, self.bucket, self.reason
        )
    }
}
