//! Evaluation inputs and provider payloads.
//!
//! All provider payloads deserialize leniently: a missing or mistyped field
//! resolves to its zero value (floats truncate into counts, `0`/`1` work as
//! flags) so that partial upstream data never raises into the gate pipeline.
//! Field aliases accept the names used by the upstream scanners.

use crate::lenient;
use serde::{Deserialize, Serialize};

/// Latest bar seen by the signal engine when it requested an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bar {
    /// Bar open time (epoch seconds), if known.
    pub timestamp: Option<i64>,
    pub close: f64,
}

impl Bar {
    pub fn new(close: f64) -> Self {
        Self {
            timestamp: None,
            close,
        }
    }
}

/// Per-evaluation diagnostics produced by the signal engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineDiagnostics {
    /// Trend-strength indicator (ADX).
    #[serde(alias = "adx", deserialize_with = "lenient::float")]
    pub trend_strength: f64,
    /// Bollinger bandwidth.
    #[serde(alias = "bbw", alias = "bbw_val", deserialize_with = "lenient::float")]
    pub bandwidth: f64,
    /// Volume confirmation.
    #[serde(alias = "vol_ok", deserialize_with = "lenient::flag")]
    pub volume_ok: bool,
    #[serde(alias = "momo_ok", deserialize_with = "lenient::flag")]
    pub momentum_ok: bool,
    #[serde(alias = "bo_ok", deserialize_with = "lenient::flag")]
    pub breakout_ok: bool,
}

/// Market metadata for an asset (listing age, flow, pool size).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketMeta {
    pub name: String,
    /// Minutes since the pool was created.
    #[serde(alias = "age_min", deserialize_with = "lenient::unsigned")]
    pub age_minutes: u64,
    #[serde(alias = "m5_buys", alias = "m5b", deserialize_with = "lenient::unsigned")]
    pub buys_5m: u64,
    #[serde(alias = "m5_sells", alias = "m5s", deserialize_with = "lenient::unsigned")]
    pub sells_5m: u64,
    #[serde(alias = "vol24_usd", alias = "vol24", deserialize_with = "lenient::float")]
    pub volume_24h: f64,
    /// Upstream quality / sentiment score.
    #[serde(alias = "qscore", alias = "score", deserialize_with = "lenient::signed")]
    pub quality_score: i64,
    /// Liquidity pool size in the quote asset.
    #[serde(alias = "lp_sol", deserialize_with = "lenient::float")]
    pub liquidity_pool_size: f64,
}

impl MarketMeta {
    /// 5-minute buys minus sells, saturating at the `i64` range.
    pub fn flow_delta_5m(&self) -> i64 {
        let buys = i64::try_from(self.buys_5m).unwrap_or(i64::MAX);
        let sells = i64::try_from(self.sells_5m).unwrap_or(i64::MAX);
        buys.saturating_sub(sells)
    }

    /// 5-minute buys plus sells.
    pub fn activity_5m(&self) -> u64 {
        self.buys_5m.saturating_add(self.sells_5m)
    }
}

/// Holder and authority metrics attached to a safety assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyMetrics {
    /// Share of supply held by the top 10 holders (0.0 - 1.0).
    #[serde(deserialize_with = "lenient::float")]
    pub top10_share: f64,
    #[serde(alias = "freezeAuthority", deserialize_with = "lenient::flag")]
    pub freeze_authority: bool,
    #[serde(alias = "mintAuthority", deserialize_with = "lenient::flag")]
    pub mint_authority: bool,
    /// 24h transaction count, when the provider knows it.
    #[serde(alias = "tx24", deserialize_with = "lenient::opt_unsigned")]
    pub tx_count_24h: Option<u64>,
}

/// Token safety assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyAssessment {
    #[serde(deserialize_with = "lenient::flag")]
    pub ok: bool,
    #[serde(deserialize_with = "lenient::signed")]
    pub score: i64,
    pub issues: Vec<String>,
    pub metrics: SafetyMetrics,
}

impl SafetyAssessment {
    /// Conservative result used when the provider fails or times out.
    pub fn not_ok() -> Self {
        Self::default()
    }
}
