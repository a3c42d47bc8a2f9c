//! Entry gate policy engine.
//!
//! Every candidate entry passes through a fixed sequence of gates. The first
//! failing gate denies the entry (fail-closed); the engine never raises into
//! the caller.
//!
//! # Gate Order
//! 1. kill switch
//! 2. cooldown: per-asset minimum time between entries
//! 3. day risk: realized loss stop, drawdown stop, max concurrent positions
//! 4. momentum: trend strength, bandwidth, volume, momentum or breakout
//! 5. safety: external safety assessment ok and score
//! 6. rug filter: holder concentration, authorities, pool size, activity
//!    (young listings only)
//! 7. sentiment: 5m order-flow delta, quality score, safety score
//! 8. liquidity shock: never denies, only selects the bucket
//!
//! Gate 8 has a side effect (it appends to the asset's liquidity history)
//! and therefore only runs once every blocking gate has passed.
//!
//! # Concurrency
//!
//! Callers should keep at most one evaluation in flight per asset. The
//! per-asset maps are `DashMap`s, so concurrent evaluations of the same asset
//! cannot corrupt state, but they can interleave cooldown checks and history
//! appends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use ladder_core::{
    AssetId, Bar, Bucket, EngineDiagnostics, GateDecision, GateReason, Lookup, MarketMeta,
    RugCheck, SafetyAssessment,
};
use ladder_journal::{DayAggregate, DayTimezone, EventLog};
use ladder_telemetry::Metrics;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::RiskResult;
use crate::liquidity::LiquidityHistory;
use crate::params::{notional_env_key, resolve_notional, LadderParams};
use crate::provider::Providers;

/// Per-asset maps are swept once they grow past this many entries.
const SWEEP_THRESHOLD: usize = 4096;

/// Inputs of the daily circuit breaker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DayRisk {
    pub aggregate: DayAggregate,
    pub open_positions: usize,
}

/// Snapshot for the status view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LadderStatus {
    pub enabled: bool,
    pub open_positions: usize,
    pub day_pnl: f64,
    pub day_drawdown: f64,
    pub core_notional: f64,
    pub opp_notional: f64,
    pub max_concurrent: usize,
    pub tracked_cooldowns: usize,
    pub tracked_histories: usize,
}

/// The entry gatekeeper.
pub struct LadderPolicy {
    /// Configuration before environment overrides.
    base: LadderParams,
    /// Live configuration (base + overrides).
    params: RwLock<LadderParams>,
    enabled: AtomicBool,
    journal: EventLog,
    timezone: DayTimezone,
    providers: Providers,
    clock: Arc<dyn Clock>,
    /// Last marked entry per asset (epoch ms).
    last_entry_ms: DashMap<AssetId, i64>,
    liquidity: DashMap<AssetId, LiquidityHistory>,
}

impl LadderPolicy {
    /// Create a gatekeeper.
    ///
    /// `base` should be the file-level params without env overrides; call
    /// [`LadderPolicy::reload_from_env`] to layer `LDR_*` on top of it.
    pub fn new(
        base: LadderParams,
        journal: EventLog,
        timezone: DayTimezone,
        providers: Providers,
    ) -> Self {
        let enabled = base.enable;
        Metrics::set_enabled(enabled);
        Self {
            params: RwLock::new(base.clone()),
            base,
            enabled: AtomicBool::new(enabled),
            journal,
            timezone,
            providers,
            clock: Arc::new(SystemClock),
            last_entry_ms: DashMap::new(),
            liquidity: DashMap::new(),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ------------------------------------------------------------------
    // Control
    // ------------------------------------------------------------------

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Flip the kill switch.
    pub fn set_enabled(&self, enabled: bool) {
        let prev = self.enabled.swap(enabled, Ordering::SeqCst);
        Metrics::set_enabled(enabled);
        if prev != enabled {
            info!(enabled, "Ladder kill switch changed");
        }
    }

    /// Snapshot of the live params, with `enable` reflecting the kill switch.
    pub fn params(&self) -> LadderParams {
        let mut params = self.params.read().clone();
        params.enable = self.is_enabled();
        params
    }

    /// Re-read `LDR_*` overrides from the process environment.
    pub fn reload_from_env(&self) {
        self.reload_with(|key| std::env::var(key).ok());
    }

    /// Re-apply overrides from `lookup` on top of the base params.
    ///
    /// The kill switch keeps its current state.
    pub fn reload_with(&self, lookup: impl Fn(&str) -> Option<String>) {
        let mut fresh = self.base.clone();
        fresh.apply_overrides(lookup);
        if let Err(e) = fresh.validate() {
            warn!(error = %e, "Reloaded ladder params look suspicious");
        }
        *self.params.write() = fresh;
        info!("Ladder params reloaded");
    }

    pub fn journal(&self) -> &EventLog {
        &self.journal
    }

    // ------------------------------------------------------------------
    // Public API
    // ------------------------------------------------------------------

    /// Decide whether an entry on `asset` is allowed and with which bucket.
    pub async fn allow_entry(
        &self,
        asset: &AssetId,
        bar: &Bar,
        diag: &EngineDiagnostics,
    ) -> GateDecision {
        let started = Instant::now();
        let decision = self.evaluate(asset, bar, diag).await;
        Metrics::evaluation_latency(started.elapsed().as_secs_f64() * 1000.0);

        if decision.allowed {
            Metrics::entry_allowed(decision.bucket.as_str());
            info!(asset = %asset, bucket = %decision.bucket, "Entry allowed");
        } else {
            Metrics::gate_blocked(decision.reason.gate());
            debug!(
                asset = %asset,
                gate = decision.reason.gate(),
                reason = %decision.reason,
                "Entry denied"
            );
        }
        decision
    }

    /// Record an executed entry; starts the asset's cooldown.
    ///
    /// Call only after the order actually went out, not on every allowed
    /// decision.
    pub fn mark_entry(&self, asset: &AssetId) {
        let now_ms = self.clock.now_ms();
        self.last_entry_ms.insert(asset.clone(), now_ms);
        debug!(asset = %asset, "Entry marked");

        if self.last_entry_ms.len() > SWEEP_THRESHOLD {
            let cooldown_ms = self.cooldown_ms();
            self.last_entry_ms
                .retain(|_, last| now_ms.saturating_sub(*last) < cooldown_ms);
        }
    }

    /// Position size for `bucket`.
    ///
    /// The environment override is re-read on every call so sizing can be
    /// changed without a restart.
    pub fn notional_for_bucket(&self, bucket: Bucket, fallback: f64) -> f64 {
        let raw = std::env::var(notional_env_key(bucket)).ok();
        let configured = self.params.read().notional(bucket);
        resolve_notional(raw.as_deref(), configured, fallback)
    }

    /// Today's aggregate and open position count from the journal.
    pub fn day_risk(&self) -> RiskResult<DayRisk> {
        let (aggregate, open_positions) = self
            .journal
            .day_risk(self.timezone, self.clock.now_utc())?;
        Ok(DayRisk {
            aggregate,
            open_positions,
        })
    }

    /// Status snapshot. Journal errors degrade to zeroed figures.
    pub fn status(&self) -> LadderStatus {
        let day = self.day_risk().unwrap_or_else(|e| {
            warn!(error = %e, "Journal unavailable for status");
            DayRisk::default()
        });
        let params = self.params.read();
        LadderStatus {
            enabled: self.is_enabled(),
            open_positions: day.open_positions,
            day_pnl: day.aggregate.pnl_sum,
            day_drawdown: day.aggregate.max_drawdown,
            core_notional: params.core_notional_sol,
            opp_notional: params.opp_notional_sol,
            max_concurrent: params.max_concurrent,
            tracked_cooldowns: self.last_entry_ms.len(),
            tracked_histories: self.liquidity.len(),
        }
    }

    /// Copy of the liquidity history for `asset`.
    pub fn liquidity_history(&self, asset: &AssetId) -> Option<LiquidityHistory> {
        self.liquidity.get(asset).map(|h| h.clone())
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    async fn evaluate(
        &self,
        asset: &AssetId,
        bar: &Bar,
        diag: &EngineDiagnostics,
    ) -> GateDecision {
        trace!(asset = %asset, close = bar.close, "Evaluating entry");

        // Gate 1: kill switch
        if !self.is_enabled() {
            return GateDecision::deny(GateReason::Disabled);
        }

        let params = self.params.read().clone();

        // Gate 2: cooldown
        if let Some(remaining_secs) = self.cooldown_remaining(asset, &params) {
            return GateDecision::deny(GateReason::Cooldown { remaining_secs });
        }

        // Gate 3: day risk
        if let Err(reason) = self.check_day_risk(&params) {
            return GateDecision::deny(reason);
        }

        // Gate 4: momentum / volatility
        if !check_momentum(diag, &params) {
            return GateDecision::deny(GateReason::Momentum);
        }

        // Metadata and safety are independent; fetch them together.
        let limit = Duration::from_millis(params.lookup_timeout_ms);
        let (meta, safety) = tokio::join!(
            self.fetch_market_meta(asset, limit),
            self.fetch_safety(asset, limit)
        );

        // Gate 5: safety
        let Some(safety) = safety else {
            return GateDecision::deny(GateReason::LookupTimeout {
                lookup: Lookup::SafetyAssessment,
            });
        };
        if !safety.ok || safety.score < params.safety_min_score {
            return GateDecision::deny(GateReason::Safety {
                ok: safety.ok,
                score: safety.score,
            });
        }

        // Gate 6: rug filter
        let Some(meta) = meta else {
            return GateDecision::deny(GateReason::LookupTimeout {
                lookup: Lookup::MarketMetadata,
            });
        };
        if let Err(check) = check_rug_filter(&meta, &safety, &params) {
            return GateDecision::deny(GateReason::RugFilter {
                check,
                blocking: params.kill_on_rug,
            });
        }

        // Gate 7: sentiment / flow
        if !check_sentiment(&meta, &safety, &params) {
            return GateDecision::deny(GateReason::Sentiment);
        }

        // Gate 8: liquidity shock (bucket only)
        let shock = self.check_liquidity_shock(asset, limit, &params).await;

        let bucket = if meta.age_minutes > params.s2_max_age_min && shock {
            Bucket::Core
        } else {
            Bucket::Opportunistic
        };
        GateDecision::allow(bucket)
    }

    fn cooldown_ms(&self) -> i64 {
        cooldown_ms(&self.params.read())
    }

    /// Seconds left on the asset's cooldown, if it is still running.
    fn cooldown_remaining(&self, asset: &AssetId, params: &LadderParams) -> Option<i64> {
        let last = *self.last_entry_ms.get(asset)?;
        let elapsed = self.clock.now_ms().saturating_sub(last);
        let cooldown = cooldown_ms(params);
        if elapsed >= cooldown {
            return None;
        }
        // Round up so a running cooldown never reports 0.
        Some((cooldown - elapsed + 999) / 1000)
    }

    fn check_day_risk(&self, params: &LadderParams) -> Result<(), GateReason> {
        let day = self.day_risk().map_err(|e| {
            warn!(error = %e, path = %self.journal.path().display(), "Journal unreadable");
            GateReason::DayRiskUnavailable {
                error: e.to_string(),
            }
        })?;
        day_risk_verdict(&day, params)
    }

    /// Market metadata, or `None` on timeout. Provider errors read as empty.
    async fn fetch_market_meta(&self, asset: &AssetId, limit: Duration) -> Option<MarketMeta> {
        let lookup = Lookup::MarketMetadata;
        match timeout(limit, self.providers.market.market_metadata(asset)).await {
            Ok(Ok(meta)) => Some(meta),
            Ok(Err(e)) => {
                warn!(asset = %asset, lookup = %lookup, error = %e, "Lookup failed");
                Metrics::lookup_failed(lookup.as_str());
                Some(MarketMeta::default())
            }
            Err(_) => {
                warn!(asset = %asset, lookup = %lookup, "Lookup timed out");
                Metrics::lookup_timeout(lookup.as_str());
                None
            }
        }
    }

    /// Safety assessment, or `None` on timeout. Provider errors read as not ok.
    async fn fetch_safety(&self, asset: &AssetId, limit: Duration) -> Option<SafetyAssessment> {
        let lookup = Lookup::SafetyAssessment;
        match timeout(limit, self.providers.safety.safety_assessment(asset)).await {
            Ok(Ok(safety)) => Some(safety),
            Ok(Err(e)) => {
                warn!(asset = %asset, lookup = %lookup, error = %e, "Lookup failed");
                Metrics::lookup_failed(lookup.as_str());
                Some(SafetyAssessment::not_ok())
            }
            Err(_) => {
                warn!(asset = %asset, lookup = %lookup, "Lookup timed out");
                Metrics::lookup_timeout(lookup.as_str());
                None
            }
        }
    }

    /// Reference count; failures and timeouts read as zero.
    async fn fetch_liquidity_refs(&self, asset: &AssetId, limit: Duration) -> u32 {
        let lookup = Lookup::LiquidityRefs;
        match timeout(limit, self.providers.liquidity.liquidity_reference_count(asset)).await {
            Ok(Ok(refs)) => refs,
            Ok(Err(e)) => {
                warn!(asset = %asset, lookup = %lookup, error = %e, "Lookup failed");
                Metrics::lookup_failed(lookup.as_str());
                0
            }
            Err(_) => {
                warn!(asset = %asset, lookup = %lookup, "Lookup timed out");
                Metrics::lookup_timeout(lookup.as_str());
                0
            }
        }
    }

    async fn check_liquidity_shock(
        &self,
        asset: &AssetId,
        limit: Duration,
        params: &LadderParams,
    ) -> bool {
        let refs = self.fetch_liquidity_refs(asset, limit).await;
        let now = self.clock.now_secs();

        // Entry guard holds the shard lock; keep it out of any await.
        let shock = {
            let mut history = self.liquidity.entry(asset.clone()).or_default();
            history.observe(now, refs, params.s4_burst_window_s);
            let shock = history.is_shock(refs, params.s4_liqrefs_min, params.s4_liq_burst_min);
            trace!(
                asset = %asset,
                refs,
                points = history.len(),
                burst = ?history.burst(),
                shock,
                "Liquidity observation"
            );
            shock
        };

        if self.liquidity.len() > SWEEP_THRESHOLD {
            let cutoff = now.saturating_sub(params.s4_burst_window_s as i64);
            self.liquidity
                .retain(|_, h| h.last_seen().is_some_and(|ts| ts >= cutoff));
        }

        shock
    }
}

fn cooldown_ms(params: &LadderParams) -> i64 {
    i64::try_from(params.entry_cooldown_s)
        .unwrap_or(i64::MAX / 1000)
        .saturating_mul(1000)
}

/// Circuit breaker verdict for the day.
///
/// Drawdown is reported as a non-negative magnitude; the stop compares the
/// signed decline (`-max_drawdown`) against `-|day_mdd_stop_usd|`.
pub fn day_risk_verdict(day: &DayRisk, params: &LadderParams) -> Result<(), GateReason> {
    let loss_stop = params.day_loss_stop_usd.abs();
    let mdd_stop = params.day_mdd_stop_usd.abs();

    if day.aggregate.pnl_sum <= -loss_stop {
        return Err(GateReason::DayLoss {
            pnl: day.aggregate.pnl_sum,
            stop: loss_stop,
        });
    }
    if -day.aggregate.max_drawdown <= -mdd_stop {
        return Err(GateReason::DayDrawdown {
            drawdown: day.aggregate.max_drawdown,
            stop: mdd_stop,
        });
    }
    if day.open_positions >= params.max_concurrent {
        return Err(GateReason::MaxConcurrent {
            open: day.open_positions,
            max: params.max_concurrent,
        });
    }
    Ok(())
}

/// S1: trend strength, bandwidth, volume, and momentum or breakout.
pub fn check_momentum(diag: &EngineDiagnostics, params: &LadderParams) -> bool {
    diag.trend_strength >= params.s1_min_adx
        && diag.bandwidth >= params.s1_min_bbw
        && diag.volume_ok
        && (diag.momentum_ok || diag.breakout_ok)
}

/// S2: stricter scrutiny for young listings only.
pub fn check_rug_filter(
    meta: &MarketMeta,
    safety: &SafetyAssessment,
    params: &LadderParams,
) -> Result<(), RugCheck> {
    if meta.age_minutes > params.s2_max_age_min {
        return Ok(());
    }

    let metrics = &safety.metrics;
    if metrics.top10_share > params.s2_top10_max {
        return Err(RugCheck::Top10Concentration {
            share: metrics.top10_share,
            max: params.s2_top10_max,
        });
    }
    if params.s2_block_auth && (metrics.freeze_authority || metrics.mint_authority) {
        return Err(RugCheck::Authority {
            mint: metrics.mint_authority,
            freeze: metrics.freeze_authority,
        });
    }
    if meta.liquidity_pool_size < params.s2_min_lp_sol {
        return Err(RugCheck::LowLiquidity {
            pool: meta.liquidity_pool_size,
            min: params.s2_min_lp_sol,
        });
    }
    // Zero counts as "unknown", matching providers that default missing data to zero.
    let tx_count = metrics
        .tx_count_24h
        .filter(|n| *n > 0)
        .unwrap_or_else(|| meta.activity_5m());
    if tx_count < params.s2_min_tx24 {
        return Err(RugCheck::LowActivity {
            tx_count,
            min: params.s2_min_tx24,
        });
    }
    Ok(())
}

/// S3: order-flow delta, quality score and safety score.
pub fn check_sentiment(
    meta: &MarketMeta,
    safety: &SafetyAssessment,
    params: &LadderParams,
) -> bool {
    meta.flow_delta_5m() >= params.s3_m5_delta_min
        && meta.quality_score >= params.s3_qscore_min
        && safety.score >= params.s3_sanity_min
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::params::ENV_CORE_NOTIONAL;
    use crate::provider::StaticProviders;
    use ladder_core::SafetyMetrics;
    use ladder_journal::{FillRecord, JournalWriter, Side};
    use tempfile::TempDir;

    // 2023-11-14T22:13:20Z
    const NOW: i64 = 1_700_000_000;

    struct Harness {
        policy: LadderPolicy,
        source: Arc<StaticProviders>,
        clock: Arc<ManualClock>,
        dir: TempDir,
    }

    impl Harness {
        fn journal_path(&self) -> std::path::PathBuf {
            self.dir.path().join("trades_log.csv")
        }

        fn write_fills(&self, fills: &[(i64, &str, Side, f64, f64)]) {
            let mut writer = JournalWriter::open(self.journal_path()).unwrap();
            for (ts, asset, side, qty, pnl) in fills {
                writer
                    .append(&FillRecord {
                        timestamp: *ts,
                        asset: AssetId::from(*asset),
                        side: *side,
                        quantity: *qty,
                        realized_pnl: *pnl,
                    })
                    .unwrap();
            }
        }

        async fn check(&self, asset: &AssetId) -> GateDecision {
            self.policy
                .allow_entry(asset, &Bar::new(1.0), &good_diag())
                .await
        }
    }

    fn harness(params: LadderParams) -> Harness {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(StaticProviders::new());
        let clock = Arc::new(ManualClock::new(NOW * 1000));
        let policy = LadderPolicy::new(
            params,
            EventLog::new(dir.path().join("trades_log.csv")),
            DayTimezone::Utc,
            Providers::from_single(source.clone()),
        )
        .with_clock(clock.clone());
        Harness {
            policy,
            source,
            clock,
            dir,
        }
    }

    fn good_diag() -> EngineDiagnostics {
        EngineDiagnostics {
            trend_strength: 20.0,
            bandwidth: 0.5,
            volume_ok: true,
            momentum_ok: true,
            breakout_ok: false,
        }
    }

    fn mature_meta() -> MarketMeta {
        MarketMeta {
            name: "Mature".to_string(),
            age_minutes: 300,
            buys_5m: 20,
            sells_5m: 5,
            volume_24h: 50_000.0,
            quality_score: 50,
            liquidity_pool_size: 2.0,
        }
    }

    fn good_safety() -> SafetyAssessment {
        SafetyAssessment {
            ok: true,
            score: 80,
            issues: Vec::new(),
            metrics: SafetyMetrics {
                top10_share: 0.20,
                freeze_authority: false,
                mint_authority: false,
                tx_count_24h: Some(500),
            },
        }
    }

    /// Register an asset that passes every gate.
    fn seed(source: &StaticProviders, asset: &AssetId, age_minutes: u64, refs: u32) {
        source.set_meta(
            asset,
            MarketMeta {
                age_minutes,
                ..mature_meta()
            },
        );
        source.set_safety(asset, good_safety());
        source.set_liquidity_refs(asset, refs);
    }

    #[tokio::test]
    async fn test_disabled_denies_before_any_lookup() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("WIF");
        seed(&h.source, &asset, 300, 25);
        h.policy.set_enabled(false);

        let decision = h.check(&asset).await;
        assert!(!decision.allowed);
        assert_eq!(decision.reason, GateReason::Disabled);
        assert_eq!(decision.bucket, Bucket::Opportunistic);
        assert_eq!(decision.reason.to_string(), "Disabled");
        assert_eq!(h.source.liquidity_calls(), 0);
    }

    #[tokio::test]
    async fn test_mature_listing_with_shock_is_core() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("JUP");
        seed(&h.source, &asset, 300, 25);

        let decision = h.check(&asset).await;
        assert!(decision.allowed);
        assert_eq!(decision.reason, GateReason::Ok);
        assert_eq!(decision.bucket, Bucket::Core);
        assert_eq!(h.source.liquidity_calls(), 1);
    }

    #[tokio::test]
    async fn test_young_listing_is_opportunistic() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("NEW");
        seed(&h.source, &asset, 100, 25);

        let decision = h.check(&asset).await;
        assert!(decision.allowed);
        assert_eq!(decision.bucket, Bucket::Opportunistic);
    }

    #[tokio::test]
    async fn test_mature_listing_without_shock_is_opportunistic() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("QUIET");
        seed(&h.source, &asset, 300, 5);

        let decision = h.check(&asset).await;
        assert!(decision.allowed);
        assert_eq!(decision.bucket, Bucket::Opportunistic);
    }

    #[tokio::test]
    async fn test_cooldown_runs_from_marked_entry() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("BONK");
        seed(&h.source, &asset, 300, 25);

        // An allowed decision alone does not start the cooldown.
        assert!(h.check(&asset).await.allowed);
        assert!(h.check(&asset).await.allowed);

        h.policy.mark_entry(&asset);
        let decision = h.check(&asset).await;
        assert_eq!(decision.reason, GateReason::Cooldown { remaining_secs: 60 });

        h.clock.advance_secs(30);
        let decision = h.check(&asset).await;
        assert_eq!(decision.reason, GateReason::Cooldown { remaining_secs: 30 });

        h.clock.advance_secs(30);
        assert!(h.check(&asset).await.allowed);

        // Other assets are unaffected.
        let other = AssetId::from("POPCAT");
        seed(&h.source, &other, 300, 25);
        h.policy.mark_entry(&asset);
        assert!(h.check(&other).await.allowed);
    }

    #[tokio::test]
    async fn test_day_loss_stop() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("WIF");
        seed(&h.source, &asset, 300, 25);
        h.write_fills(&[
            (NOW - 600, "A", Side::Sell, 1.0, -40.0),
            (NOW - 300, "B", Side::Sell, 1.0, -35.0),
        ]);

        let decision = h.check(&asset).await;
        assert_eq!(
            decision.reason,
            GateReason::DayLoss {
                pnl: -75.0,
                stop: 60.0
            }
        );
        assert_eq!(decision.reason.to_string(), "DayLoss -75 <= -60");
        assert_eq!(h.source.liquidity_calls(), 0);
    }

    #[tokio::test]
    async fn test_yesterdays_losses_do_not_count() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("WIF");
        seed(&h.source, &asset, 300, 25);
        // 2023-11-13
        h.write_fills(&[(NOW - 86_400, "A", Side::Sell, 1.0, -500.0)]);

        assert!(h.check(&asset).await.allowed);
    }

    #[tokio::test]
    async fn test_day_drawdown_stop() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("WIF");
        seed(&h.source, &asset, 300, 25);
        // Curve 0 -> 50 -> -35: sum above the loss stop, drawdown 85.
        h.write_fills(&[
            (NOW - 600, "A", Side::Sell, 1.0, 50.0),
            (NOW - 300, "B", Side::Sell, 1.0, -85.0),
        ]);

        let decision = h.check(&asset).await;
        assert_eq!(
            decision.reason,
            GateReason::DayDrawdown {
                drawdown: 85.0,
                stop: 80.0
            }
        );
    }

    #[tokio::test]
    async fn test_max_concurrent() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("WIF");
        seed(&h.source, &asset, 300, 25);
        h.write_fills(&[
            (NOW - 900, "A", Side::Buy, 1.0, 0.0),
            (NOW - 800, "B", Side::Buy, 1.0, 0.0),
            (NOW - 700, "C", Side::Buy, 1.0, 0.0),
            (NOW - 600, "D", Side::Buy, 1.0, 0.0),
        ]);

        let decision = h.check(&asset).await;
        assert_eq!(decision.reason, GateReason::MaxConcurrent { open: 4, max: 4 });

        // Closing one position frees a slot.
        h.write_fills(&[(NOW - 500, "D", Side::Sell, 1.0, 0.0)]);
        assert!(h.check(&asset).await.allowed);
    }

    #[tokio::test]
    async fn test_unreadable_journal_denies() {
        let dir = TempDir::new().unwrap();
        let source = Arc::new(StaticProviders::new());
        let asset = AssetId::from("WIF");
        seed(&source, &asset, 300, 25);
        // A directory where the journal should be.
        let policy = LadderPolicy::new(
            LadderParams::default(),
            EventLog::new(dir.path()),
            DayTimezone::Utc,
            Providers::from_single(source.clone()),
        );

        let decision = policy
            .allow_entry(&asset, &Bar::new(1.0), &good_diag())
            .await;
        assert!(!decision.allowed);
        assert!(matches!(
            decision.reason,
            GateReason::DayRiskUnavailable { .. }
        ));
        assert_eq!(decision.reason.gate(), "day_risk");
    }

    #[tokio::test]
    async fn test_momentum_gate() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("WIF");
        seed(&h.source, &asset, 300, 25);

        let weak = EngineDiagnostics {
            bandwidth: 0.1,
            ..good_diag()
        };
        let decision = h.policy.allow_entry(&asset, &Bar::new(1.0), &weak).await;
        assert_eq!(decision.reason, GateReason::Momentum);

        let breakout_only = EngineDiagnostics {
            momentum_ok: false,
            breakout_ok: true,
            ..good_diag()
        };
        let decision = h
            .policy
            .allow_entry(&asset, &Bar::new(1.0), &breakout_only)
            .await;
        assert!(decision.allowed);
    }

    #[tokio::test]
    async fn test_safety_gate() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("SCAM");
        seed(&h.source, &asset, 300, 25);
        h.source.set_safety(
            &asset,
            SafetyAssessment {
                score: 50,
                ..good_safety()
            },
        );

        let decision = h.check(&asset).await;
        assert_eq!(
            decision.reason,
            GateReason::Safety {
                ok: true,
                score: 50
            }
        );
        assert_eq!(decision.reason.to_string(), "Sanity fail");
    }

    #[tokio::test]
    async fn test_missing_safety_is_not_ok() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("WIF");
        h.source.set_meta(&asset, mature_meta());
        h.source.set_liquidity_refs(&asset, 25);

        let decision = h.check(&asset).await;
        assert_eq!(
            decision.reason,
            GateReason::Safety {
                ok: false,
                score: 0
            }
        );
    }

    #[tokio::test]
    async fn test_rug_filter_top10_on_young_listing() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("RUG");
        seed(&h.source, &asset, 10, 25);
        h.source.set_safety(
            &asset,
            SafetyAssessment {
                metrics: SafetyMetrics {
                    top10_share: 0.60,
                    ..good_safety().metrics
                },
                ..good_safety()
            },
        );

        let decision = h.check(&asset).await;
        assert_eq!(
            decision.reason,
            GateReason::RugFilter {
                check: RugCheck::Top10Concentration {
                    share: 0.60,
                    max: 0.45
                },
                blocking: true,
            }
        );
        assert_eq!(h.source.liquidity_calls(), 0);

        // Same holders on a mature listing skip the filter.
        h.source.set_meta(&asset, mature_meta());
        assert!(h.check(&asset).await.allowed);
    }

    #[tokio::test]
    async fn test_rug_filter_warn_mode_still_denies() {
        let h = harness(LadderParams {
            kill_on_rug: false,
            ..LadderParams::default()
        });
        let asset = AssetId::from("RUG");
        seed(&h.source, &asset, 10, 25);
        h.source.set_safety(
            &asset,
            SafetyAssessment {
                metrics: SafetyMetrics {
                    freeze_authority: true,
                    ..good_safety().metrics
                },
                ..good_safety()
            },
        );

        let decision = h.check(&asset).await;
        assert!(!decision.allowed);
        assert_eq!(
            decision.reason,
            GateReason::RugFilter {
                check: RugCheck::Authority {
                    mint: false,
                    freeze: true
                },
                blocking: false,
            }
        );
        assert!(decision.reason.to_string().starts_with("RugFilter warn"));
    }

    #[tokio::test]
    async fn test_sentiment_gate() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("FLAT");
        seed(&h.source, &asset, 300, 25);
        h.source.set_meta(
            &asset,
            MarketMeta {
                buys_5m: 10,
                sells_5m: 5,
                ..mature_meta()
            },
        );

        let decision = h.check(&asset).await;
        assert_eq!(decision.reason, GateReason::Sentiment);
    }

    #[tokio::test]
    async fn test_missing_metadata_reads_as_zeroes() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("GHOST");
        h.source.set_safety(&asset, good_safety());

        // Age 0 puts it through the rug filter with an empty pool.
        let decision = h.check(&asset).await;
        assert_eq!(
            decision.reason,
            GateReason::RugFilter {
                check: RugCheck::LowLiquidity {
                    pool: 0.0,
                    min: 0.5
                },
                blocking: true,
            }
        );
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let h = harness(LadderParams {
            lookup_timeout_ms: 20,
            ..LadderParams::default()
        });
        let asset = AssetId::from("SLOW");
        seed(&h.source, &asset, 300, 25);
        h.source.set_delay(Some(Duration::from_millis(500)));

        let decision = h.check(&asset).await;
        assert_eq!(
            decision.reason,
            GateReason::LookupTimeout {
                lookup: Lookup::SafetyAssessment
            }
        );
        assert_eq!(decision.reason.gate(), "lookup_timeout");
        assert_eq!(h.source.liquidity_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_liquidity_still_allows() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("WIF");
        h.source.set_meta(&asset, mature_meta());
        h.source.set_safety(&asset, good_safety());

        let decision = h.check(&asset).await;
        assert!(decision.allowed);
        assert_eq!(decision.bucket, Bucket::Opportunistic);
        let history = h.policy.liquidity_history(&asset).unwrap();
        assert_eq!(history.points().next(), Some(&(NOW, 0)));
    }

    #[tokio::test]
    async fn test_liquidity_history_is_pruned_to_window() {
        let h = harness(LadderParams::default());
        let asset = AssetId::from("WIF");
        seed(&h.source, &asset, 300, 25);

        for _ in 0..3 {
            assert!(h.check(&asset).await.allowed);
            h.clock.advance_secs(100);
        }

        let history = h.policy.liquidity_history(&asset).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.oldest(), Some(NOW + 100));
        assert_eq!(history.last_seen(), Some(NOW + 200));
    }

    #[tokio::test]
    async fn test_burst_qualifies_with_zero_floor() {
        let h = harness(LadderParams {
            s4_liqrefs_min: 0,
            ..LadderParams::default()
        });
        let asset = AssetId::from("WIF");
        seed(&h.source, &asset, 300, 0);

        assert_eq!(h.check(&asset).await.bucket, Bucket::Opportunistic);

        h.clock.advance_secs(60);
        h.source.set_liquidity_refs(&asset, 3);
        assert_eq!(h.check(&asset).await.bucket, Bucket::Core);
    }

    #[tokio::test]
    async fn test_reload_keeps_kill_switch() {
        let h = harness(LadderParams::default());
        h.policy.set_enabled(false);

        h.policy.reload_with(|key| match key {
            "LDR_ENABLE" => Some("1".to_string()),
            "LDR_MAX_CONCURRENT" => Some("1".to_string()),
            _ => None,
        });

        assert!(!h.policy.is_enabled());
        let params = h.policy.params();
        assert!(!params.enable);
        assert_eq!(params.max_concurrent, 1);

        // Overrides are relative to the base, not cumulative.
        h.policy.reload_with(|_| None);
        assert_eq!(h.policy.params().max_concurrent, 4);
    }

    #[tokio::test]
    async fn test_status_reflects_journal() {
        let h = harness(LadderParams::default());
        h.write_fills(&[
            (NOW - 600, "A", Side::Buy, 2.0, 0.0),
            (NOW - 300, "B", Side::Sell, 1.0, -12.5),
        ]);
        h.policy.mark_entry(&AssetId::from("A"));

        let status = h.policy.status();
        assert!(status.enabled);
        assert_eq!(status.open_positions, 1);
        assert_eq!(status.day_pnl, -12.5);
        assert_eq!(status.day_drawdown, 12.5);
        assert_eq!(status.core_notional, 0.05);
        assert_eq!(status.opp_notional, 0.02);
        assert_eq!(status.max_concurrent, 4);
        assert_eq!(status.tracked_cooldowns, 1);
    }

    #[test]
    fn test_notional_for_bucket_reads_env_live() {
        let dir = TempDir::new().unwrap();
        let policy = LadderPolicy::new(
            LadderParams::default(),
            EventLog::new(dir.path().join("trades_log.csv")),
            DayTimezone::Utc,
            Providers::from_single(Arc::new(StaticProviders::new())),
        );

        std::env::remove_var(ENV_CORE_NOTIONAL);
        assert_eq!(policy.notional_for_bucket(Bucket::Core, 0.01), 0.05);
        std::env::set_var(ENV_CORE_NOTIONAL, "0.2");
        assert_eq!(policy.notional_for_bucket(Bucket::Core, 0.01), 0.2);
        std::env::set_var(ENV_CORE_NOTIONAL, "-1");
        assert_eq!(policy.notional_for_bucket(Bucket::Core, 0.01), 0.05);
        std::env::remove_var(ENV_CORE_NOTIONAL);
    }

    #[test]
    fn test_day_risk_verdict_boundaries() {
        let params = LadderParams::default();
        let day = |pnl_sum, max_drawdown, open_positions| DayRisk {
            aggregate: DayAggregate {
                pnl_sum,
                max_drawdown,
            },
            open_positions,
        };

        assert!(day_risk_verdict(&day(-59.99, 0.0, 0), &params).is_ok());
        assert!(day_risk_verdict(&day(-60.0, 0.0, 0), &params).is_err());
        assert!(day_risk_verdict(&day(0.0, 79.99, 0), &params).is_ok());
        assert!(day_risk_verdict(&day(0.0, 80.0, 0), &params).is_err());
        assert!(day_risk_verdict(&day(0.0, 0.0, 3), &params).is_ok());

        // Negative stops behave like their magnitude.
        let negative = LadderParams {
            day_loss_stop_usd: -60.0,
            ..LadderParams::default()
        };
        assert!(day_risk_verdict(&day(-60.0, 0.0, 0), &negative).is_err());
    }

    #[test]
    fn test_rug_filter_activity_fallback() {
        let params = LadderParams::default();
        let meta = MarketMeta {
            age_minutes: 30,
            buys_5m: 20,
            sells_5m: 10,
            liquidity_pool_size: 2.0,
            ..MarketMeta::default()
        };
        let mut safety = good_safety();
        safety.metrics.tx_count_24h = None;

        assert_eq!(
            check_rug_filter(&meta, &safety, &params),
            Err(RugCheck::LowActivity {
                tx_count: 30,
                min: 50
            })
        );

        safety.metrics.tx_count_24h = Some(0);
        assert!(check_rug_filter(&meta, &safety, &params).is_err());

        safety.metrics.tx_count_24h = Some(120);
        assert_eq!(check_rug_filter(&meta, &safety, &params), Ok(()));
    }

    #[test]
    fn test_authority_ignored_when_not_blocking() {
        let params = LadderParams {
            s2_block_auth: false,
            ..LadderParams::default()
        };
        let meta = MarketMeta {
            age_minutes: 30,
            ..mature_meta()
        };
        let mut safety = good_safety();
        safety.metrics.mint_authority = true;
        assert_eq!(check_rug_filter(&meta, &safety, &params), Ok(()));
    }
}
