//! Application wiring.
//!
//! Builds the gate engine from `AppConfig` and exposes the operator
//! operations: kill switch, status, config dump and dry-run evaluation.

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::snapshot::load_providers;
use ladder_core::{AssetId, Bar, Bucket, EngineDiagnostics, GateDecision};
use ladder_journal::EventLog;
use ladder_risk::{
    parse_bool, Clock, LadderParams, LadderPolicy, LadderStatus, Providers, StaticProviders,
    ENV_ENABLE,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a dry-run evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DryRunReport {
    pub asset: AssetId,
    pub decision: GateDecision,
    /// Size the entry would get; zero when denied.
    pub notional: f64,
}

impl fmt::Display for DryRunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ladder {}: allow={} bucket={} notional={} reason={}",
            self.asset.short(),
            self.decision.allowed,
            self.decision.bucket,
            self.notional,
            self.decision.reason
        )
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    policy: LadderPolicy,
    source: Arc<StaticProviders>,
}

impl Application {
    /// Create the application from configuration, layering `LDR_*` from the
    /// process environment over the `[ladder]` section.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        Self::with_overrides(config, |key| std::env::var(key).ok())
    }

    /// Create the application with `LDR_*` overrides read from `lookup`.
    ///
    /// The engine keeps `config.ladder` as its base, so a later reload with
    /// the override removed falls back to the file value.
    pub fn with_overrides(
        config: AppConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let app = Self::build(config)?;
        app.policy.reload_with(&lookup);
        if let Some(enable) = lookup(ENV_ENABLE).as_deref().and_then(parse_bool) {
            app.policy.set_enabled(enable);
        }
        Ok(app)
    }

    fn build(config: AppConfig) -> AppResult<Self> {
        if let Err(e) = config.ladder.validate() {
            warn!(error = %e, "Ladder params look suspicious");
        }

        let source = match &config.snapshot_path {
            Some(path) => Arc::new(load_providers(path)?),
            None => {
                info!("No snapshot file configured, providers start empty");
                Arc::new(StaticProviders::new())
            }
        };

        let policy = LadderPolicy::new(
            config.ladder.clone(),
            EventLog::new(&config.journal_path),
            config.day_timezone(),
            Providers::from_single(source.clone()),
        );

        info!(
            journal = %config.journal_path.display(),
            timezone = %config.timezone,
            enabled = policy.is_enabled(),
            "Ladder gatekeeper ready"
        );

        Ok(Self {
            config,
            policy,
            source,
        })
    }

    /// Replace the engine clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.policy = self.policy.with_clock(clock);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn policy(&self) -> &LadderPolicy {
        &self.policy
    }

    /// Providers backing the engine (snapshot data).
    pub fn providers(&self) -> &StaticProviders {
        &self.source
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.policy.set_enabled(enabled);
    }

    /// Re-read `LDR_*` overrides on top of the `[ladder]` section.
    pub fn reload_from_env(&self) {
        self.policy.reload_from_env();
    }

    pub fn status(&self) -> LadderStatus {
        self.policy.status()
    }

    /// Human-readable status block.
    pub fn status_text(&self) -> String {
        let s = self.status();
        let p = self.policy.params();
        [
            "Barbell-Ladder Status".to_string(),
            format!("enable={} | open_pos={}", s.enabled, s.open_positions),
            format!(
                "core={} SOL | opp={} SOL | max_concurrent={}",
                s.core_notional, s.opp_notional, s.max_concurrent
            ),
            format!(
                "day_pnl={} USD | day_mdd={} USD | loss_stop={} USD | mdd_stop={} USD",
                s.day_pnl, s.day_drawdown, p.day_loss_stop_usd, p.day_mdd_stop_usd
            ),
            format!("S1: adx>={} bbw>={}", p.s1_min_adx, p.s1_min_bbw),
            format!(
                "S2: age<={}m lp>={} tx24>={} top10<={:.0}% block_auth={}",
                p.s2_max_age_min,
                p.s2_min_lp_sol,
                p.s2_min_tx24,
                p.s2_top10_max * 100.0,
                p.s2_block_auth
            ),
            format!(
                "S3: m5_delta>={} qscore>={} sanity>={}",
                p.s3_m5_delta_min, p.s3_qscore_min, p.s3_sanity_min
            ),
            format!(
                "S4: refs>={} burst>=+{} in {}s",
                p.s4_liqrefs_min, p.s4_liq_burst_min, p.s4_burst_window_s
            ),
        ]
        .join("\n")
    }

    /// Live params as pretty JSON.
    pub fn config_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.policy.params())?)
    }

    /// Evaluate one asset without executing anything.
    pub async fn dry_run(&self, asset: &AssetId, diag: &EngineDiagnostics) -> DryRunReport {
        let decision = self.policy.allow_entry(asset, &Bar::default(), diag).await;
        let notional = if decision.allowed {
            self.notional(decision.bucket)
        } else {
            0.0
        };
        DryRunReport {
            asset: asset.clone(),
            decision,
            notional,
        }
    }

    /// Bucket size, falling back to the built-in default.
    pub fn notional(&self, bucket: Bucket) -> f64 {
        let fallback = LadderParams::default().notional(bucket);
        self.policy.notional_for_bucket(bucket, fallback)
    }
}
