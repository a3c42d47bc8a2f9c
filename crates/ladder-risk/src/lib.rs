//! Entry gates for the ladder gatekeeper.
//!
//! Implements the checks that must pass before any entry, in order:
//! - Kill switch: gatekeeper enabled
//! - Cooldown: per-asset minimum time between entries
//! - Day risk: realized loss stop, intraday drawdown stop, max concurrent
//! - Momentum: trend strength, bandwidth, volume and momentum/breakout
//! - Safety: external safety assessment ok with a minimum score
//! - Rug filter: concentration, authorities, pool size, activity (young listings)
//! - Sentiment: 5m order flow, quality score, safety score
//! - Liquidity shock: selects the core bucket, never denies
//!
//! Also provides:
//! - LadderParams: thresholds with `LDR_*` environment overrides
//! - Provider traits for market metadata, safety and liquidity lookups
//! - Clock: injectable time source

pub mod clock;
pub mod error;
pub mod gates;
pub mod liquidity;
pub mod params;
pub mod provider;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ProviderError, ProviderResult, RiskError, RiskResult};
pub use gates::{
    check_momentum, check_rug_filter, check_sentiment, day_risk_verdict, DayRisk, LadderPolicy,
    LadderStatus,
};
pub use liquidity::LiquidityHistory;
pub use params::{
    notional_env_key, parse_bool, resolve_notional, LadderParams, ENV_CORE_NOTIONAL, ENV_ENABLE,
    ENV_OPP_NOTIONAL,
};
pub use provider::{
    AssetSnapshot, BoxFuture, LiquidityProvider, MarketDataProvider, Providers, SafetyProvider,
    StaticProviders,
};
