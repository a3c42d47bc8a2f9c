//! Gatekeeper parameters.
//!
//! Defaults are hardcoded. At startup a base configuration (defaults or the
//! `[ladder]` section of the app config) is overlaid with `LDR_*` environment
//! overrides. A knob whose override does not parse keeps its base value;
//! configuration problems never abort startup.

use crate::error::{RiskError, RiskResult};
use ladder_core::Bucket;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

pub const ENV_ENABLE: &str = "LDR_ENABLE";
pub const ENV_CORE_NOTIONAL: &str = "LDR_CORE_NOTIONAL_SOL";
pub const ENV_OPP_NOTIONAL: &str = "LDR_OPP_NOTIONAL_SOL";

/// Thresholds and limits for the entry gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderParams {
    // --- Risk (barbell sizing) ---
    /// Kill switch initial state.
    pub enable: bool,
    /// Core bucket notional (SOL).
    pub core_notional_sol: f64,
    /// Opportunistic bucket notional (SOL).
    pub opp_notional_sol: f64,
    pub max_concurrent: usize,
    /// Daily realized loss stop (USD).
    pub day_loss_stop_usd: f64,
    /// Daily drawdown stop (USD).
    pub day_mdd_stop_usd: f64,
    /// Rug filter failures are reported as blocks rather than warnings.
    pub kill_on_rug: bool,

    // --- S1 momentum / volatility ---
    pub s1_min_adx: f64,
    pub s1_min_bbw: f64,

    // --- S2 new listing / rug filter ---
    /// Listings older than this (minutes) skip the rug filter.
    pub s2_max_age_min: u64,
    pub s2_min_lp_sol: f64,
    pub s2_min_tx24: u64,
    /// Maximum top-10 holder share (0.0 - 1.0).
    pub s2_top10_max: f64,
    pub s2_block_auth: bool,

    // --- S3 sentiment / flow ---
    /// Minimum 5m buys minus sells.
    pub s3_m5_delta_min: i64,
    pub s3_qscore_min: i64,
    pub s3_sanity_min: i64,

    // --- Safety gate ---
    pub safety_min_score: i64,

    // --- S4 liquidity shock ---
    pub s4_liqrefs_min: u32,
    /// New references required inside the burst window.
    pub s4_liq_burst_min: i64,
    pub s4_burst_window_s: u64,

    // --- Global ---
    pub entry_cooldown_s: u64,
    /// Per-lookup timeout for external providers.
    pub lookup_timeout_ms: u64,
}

impl Default for LadderParams {
    fn default() -> Self {
        Self {
            enable: true,
            core_notional_sol: 0.05,
            opp_notional_sol: 0.02,
            max_concurrent: 4,
            day_loss_stop_usd: 60.0,
            day_mdd_stop_usd: 80.0,
            kill_on_rug: true,
            s1_min_adx: 12.0,
            s1_min_bbw: 0.30,
            s2_max_age_min: 240,
            s2_min_lp_sol: 0.5,
            s2_min_tx24: 50,
            s2_top10_max: 0.45,
            s2_block_auth: true,
            s3_m5_delta_min: 8,
            s3_qscore_min: 35,
            s3_sanity_min: 60,
            safety_min_score: 60,
            s4_liqrefs_min: 20,
            s4_liq_burst_min: 3,
            s4_burst_window_s: 180,
            entry_cooldown_s: 60,
            lookup_timeout_ms: 5_000,
        }
    }
}

fn knob<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, current: T) -> T {
    match lookup(key) {
        None => current,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!(key, value = %raw, "Ignoring unparseable override");
                current
            }
        },
    }
}

fn bool_knob(lookup: &impl Fn(&str) -> Option<String>, key: &str, current: bool) -> bool {
    match lookup(key) {
        None => current,
        Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
            warn!(key, value = %raw, "Ignoring unparseable override");
            current
        }),
    }
}

/// `1/true/yes/on` and `0/false/no/off`, case-insensitive.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl LadderParams {
    /// Defaults overlaid with process environment overrides.
    pub fn from_env() -> Self {
        let mut params = Self::default();
        params.apply_env();
        params
    }

    /// Overlay process environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(env_lookup);
    }

    /// Overlay overrides from an arbitrary key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let l = &lookup;
        self.enable = bool_knob(l, ENV_ENABLE, self.enable);
        self.core_notional_sol = knob(l, ENV_CORE_NOTIONAL, self.core_notional_sol);
        self.opp_notional_sol = knob(l, ENV_OPP_NOTIONAL, self.opp_notional_sol);
        self.max_concurrent = knob(l, "LDR_MAX_CONCURRENT", self.max_concurrent);
        self.day_loss_stop_usd = knob(l, "LDR_DAY_LOSS_STOP_USD", self.day_loss_stop_usd);
        self.day_mdd_stop_usd = knob(l, "LDR_DAY_MDD_STOP_USD", self.day_mdd_stop_usd);
        self.kill_on_rug = bool_knob(l, "LDR_KILL_ON_RUG", self.kill_on_rug);

        self.s1_min_adx = knob(l, "LDR_S1_MIN_ADX", self.s1_min_adx);
        self.s1_min_bbw = knob(l, "LDR_S1_MIN_BBW", self.s1_min_bbw);

        self.s2_max_age_min = knob(l, "LDR_S2_MAX_AGE_MIN", self.s2_max_age_min);
        self.s2_min_lp_sol = knob(l, "LDR_S2_MIN_LP_SOL", self.s2_min_lp_sol);
        self.s2_min_tx24 = knob(l, "LDR_S2_MIN_TX24", self.s2_min_tx24);
        self.s2_top10_max = knob(l, "LDR_S2_TOP10_MAX", self.s2_top10_max);
        self.s2_block_auth = bool_knob(l, "LDR_S2_BLOCK_AUTH", self.s2_block_auth);

        self.s3_m5_delta_min = knob(l, "LDR_S3_M5_DELTA_MIN", self.s3_m5_delta_min);
        self.s3_qscore_min = knob(l, "LDR_S3_QSCORE_MIN", self.s3_qscore_min);
        self.s3_sanity_min = knob(l, "LDR_S3_SANITY_MIN", self.s3_sanity_min);
        self.safety_min_score = knob(l, "LDR_SAFETY_MIN_SCORE", self.safety_min_score);

        self.s4_liqrefs_min = knob(l, "LDR_S4_LIQREFS_MIN", self.s4_liqrefs_min);
        self.s4_liq_burst_min = knob(l, "LDR_S4_LIQ_BURST_MIN", self.s4_liq_burst_min);
        self.s4_burst_window_s = knob(l, "LDR_S4_BURST_WINDOW_S", self.s4_burst_window_s);

        self.entry_cooldown_s = knob(l, "LDR_ENTRY_COOLDOWN_S", self.entry_cooldown_s);
        self.lookup_timeout_ms = knob(l, "LDR_LOOKUP_TIMEOUT_MS", self.lookup_timeout_ms);
    }

    /// Configured notional for a bucket.
    pub fn notional(&self, bucket: Bucket) -> f64 {
        match bucket {
            Bucket::Core => self.core_notional_sol,
            Bucket::Opportunistic => self.opp_notional_sol,
        }
    }

    /// Sanity-check thresholds. Problems are reported, not fatal.
    pub fn validate(&self) -> RiskResult<()> {
        let mut problems = Vec::new();
        if !(0.0..=1.0).contains(&self.s2_top10_max) {
            problems.push(format!("s2_top10_max {} outside [0, 1]", self.s2_top10_max));
        }
        if self.max_concurrent == 0 {
            problems.push("max_concurrent is 0: every entry will be denied".to_string());
        }
        for (name, v) in [
            ("core_notional_sol", self.core_notional_sol),
            ("opp_notional_sol", self.opp_notional_sol),
        ] {
            if !(v.is_finite() && v > 0.0) {
                problems.push(format!("{name} {v} is not a positive amount"));
            }
        }
        if self.lookup_timeout_ms == 0 {
            problems.push("lookup_timeout_ms is 0: every lookup will time out".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(RiskError::Config(problems.join("; ")))
        }
    }
}

/// Env key carrying the live override for a bucket's notional.
pub fn notional_env_key(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Core => ENV_CORE_NOTIONAL,
        Bucket::Opportunistic => ENV_OPP_NOTIONAL,
    }
}

/// Resolve a bucket notional: live override, then configured, then fallback.
///
/// A value is usable when it parses to a finite amount above zero.
pub fn resolve_notional(override_raw: Option<&str>, configured: f64, fallback: f64) -> f64 {
    let usable = |v: f64| v.is_finite() && v > 0.0;

    if let Some(v) = override_raw
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|v| usable(*v))
    {
        return v;
    }
    if usable(configured) {
        configured
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let p = LadderParams::default();
        assert!(p.enable);
        assert_eq!(p.max_concurrent, 4);
        assert_eq!(p.day_loss_stop_usd, 60.0);
        assert_eq!(p.s2_max_age_min, 240);
        assert_eq!(p.s2_top10_max, 0.45);
        assert_eq!(p.s4_burst_window_s, 180);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_overrides_apply() {
        let mut p = LadderParams::default();
        p.apply_overrides(lookup_from(&[
            ("LDR_ENABLE", "off"),
            ("LDR_MAX_CONCURRENT", "2"),
            ("LDR_S1_MIN_BBW", " 0.5 "),
            ("LDR_S2_BLOCK_AUTH", "No"),
        ]));
        assert!(!p.enable);
        assert_eq!(p.max_concurrent, 2);
        assert_eq!(p.s1_min_bbw, 0.5);
        assert!(!p.s2_block_auth);
    }

    #[test]
    fn test_bad_override_keeps_base_value() {
        let mut p = LadderParams {
            s2_min_tx24: 75,
            ..LadderParams::default()
        };
        p.apply_overrides(lookup_from(&[
            ("LDR_S2_MIN_TX24", "lots"),
            ("LDR_MAX_CONCURRENT", "2.5"),
            ("LDR_KILL_ON_RUG", "maybe"),
        ]));
        assert_eq!(p.s2_min_tx24, 75);
        assert_eq!(p.max_concurrent, 4);
        assert!(p.kill_on_rug);
    }

    #[test]
    fn test_resolve_notional() {
        assert_eq!(resolve_notional(Some("0.1"), 0.05, 0.01), 0.1);
        assert_eq!(resolve_notional(Some("abc"), 0.05, 0.01), 0.05);
        assert_eq!(resolve_notional(Some("0"), 0.05, 0.01), 0.05);
        assert_eq!(resolve_notional(None, 0.05, 0.01), 0.05);
        assert_eq!(resolve_notional(None, 0.0, 0.01), 0.01);
        assert_eq!(resolve_notional(Some("NaN"), f64::NAN, 0.01), 0.01);
    }

    #[test]
    fn test_validate_reports_problems() {
        let p = LadderParams {
            s2_top10_max: 45.0,
            max_concurrent: 0,
            ..LadderParams::default()
        };
        let err = p.validate().unwrap_err().to_string();
        assert!(err.contains("s2_top10_max"));
        assert!(err.contains("max_concurrent"));
    }

    #[test]
    fn test_partial_toml_section_uses_defaults() {
        let p: LadderParams = serde_json::from_str(r#"{"max_concurrent": 7}"#).unwrap();
        assert_eq!(p.max_concurrent, 7);
        assert_eq!(p.entry_cooldown_s, 60);
    }
}
