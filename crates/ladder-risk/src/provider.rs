//! External data providers consulted by the gates.
//!
//! The gate engine never reaches for a concrete data source. Market metadata,
//! safety scoring and liquidity-reference counting are injected at
//! construction as trait objects, which keeps the engine testable and lets
//! the host process plug in whatever scanners it already runs.
//!
//! Provider errors are absorbed by the engine at the call site and replaced
//! with conservative defaults; see `LadderPolicy::allow_entry`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ladder_core::{AssetId, MarketMeta, SafetyAssessment};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, ProviderResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Listing age, order flow and pool size.
pub trait MarketDataProvider: Send + Sync {
    fn market_metadata<'a>(
        &'a self,
        asset: &'a AssetId,
    ) -> BoxFuture<'a, ProviderResult<MarketMeta>>;
}

/// Token safety scoring (holder concentration, authorities).
pub trait SafetyProvider: Send + Sync {
    fn safety_assessment<'a>(
        &'a self,
        asset: &'a AssetId,
    ) -> BoxFuture<'a, ProviderResult<SafetyAssessment>>;
}

/// Count of independent markets/pools trading the asset.
pub trait LiquidityProvider: Send + Sync {
    fn liquidity_reference_count<'a>(
        &'a self,
        asset: &'a AssetId,
    ) -> BoxFuture<'a, ProviderResult<u32>>;
}

/// The set of providers handed to the engine.
#[derive(Clone)]
pub struct Providers {
    pub market: Arc<dyn MarketDataProvider>,
    pub safety: Arc<dyn SafetyProvider>,
    pub liquidity: Arc<dyn LiquidityProvider>,
}

impl Providers {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        safety: Arc<dyn SafetyProvider>,
        liquidity: Arc<dyn LiquidityProvider>,
    ) -> Self {
        Self {
            market,
            safety,
            liquidity,
        }
    }

    /// Use one object for all three lookups.
    pub fn from_single<P>(provider: Arc<P>) -> Self
    where
        P: MarketDataProvider + SafetyProvider + LiquidityProvider + 'static,
    {
        Self {
            market: provider.clone(),
            safety: provider.clone(),
            liquidity: provider,
        }
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers").finish_non_exhaustive()
    }
}

/// Everything known about one asset in a static snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSnapshot {
    pub meta: Option<MarketMeta>,
    pub safety: Option<SafetyAssessment>,
    pub liquidity_refs: Option<u32>,
}

/// In-memory provider backed by per-asset snapshots.
///
/// Missing data answers `ProviderError::NotFound`. An optional delay makes
/// every lookup slow, for exercising timeouts.
#[derive(Debug, Default)]
pub struct StaticProviders {
    assets: RwLock<HashMap<AssetId, AssetSnapshot>>,
    delay: RwLock<Option<Duration>>,
    liquidity_calls: AtomicUsize,
}

impl StaticProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(assets: HashMap<AssetId, AssetSnapshot>) -> Self {
        Self {
            assets: RwLock::new(assets),
            ..Self::default()
        }
    }

    pub fn insert(&self, asset: AssetId, snapshot: AssetSnapshot) {
        self.assets.write().insert(asset, snapshot);
    }

    pub fn set_meta(&self, asset: &AssetId, meta: MarketMeta) {
        self.assets.write().entry(asset.clone()).or_default().meta = Some(meta);
    }

    pub fn set_safety(&self, asset: &AssetId, safety: SafetyAssessment) {
        self.assets.write().entry(asset.clone()).or_default().safety = Some(safety);
    }

    pub fn set_liquidity_refs(&self, asset: &AssetId, refs: u32) {
        self.assets.write().entry(asset.clone()).or_default().liquidity_refs = Some(refs);
    }

    /// Delay every lookup by `delay` (None to disable).
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write() = delay;
    }

    /// Number of liquidity lookups served so far.
    pub fn liquidity_calls(&self) -> usize {
        self.liquidity_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }

    async fn lookup<T>(
        &self,
        asset: &AssetId,
        pick: impl FnOnce(&AssetSnapshot) -> Option<T>,
    ) -> ProviderResult<T> {
        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.assets
            .read()
            .get(asset)
            .and_then(pick)
            .ok_or_else(|| ProviderError::NotFound(asset.clone()))
    }
}

impl MarketDataProvider for StaticProviders {
    fn market_metadata<'a>(
        &'a self,
        asset: &'a AssetId,
    ) -> BoxFuture<'a, ProviderResult<MarketMeta>> {
        Box::pin(self.lookup(asset, |s| s.meta.clone()))
    }
}

impl SafetyProvider for StaticProviders {
    fn safety_assessment<'a>(
        &'a self,
        asset: &'a AssetId,
    ) -> BoxFuture<'a, ProviderResult<SafetyAssessment>> {
        Box::pin(self.lookup(asset, |s| s.safety.clone()))
    }
}

impl LiquidityProvider for StaticProviders {
    fn liquidity_reference_count<'a>(
        &'a self,
        asset: &'a AssetId,
    ) -> BoxFuture<'a, ProviderResult<u32>> {
        self.liquidity_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(self.lookup(asset, |s| s.liquidity_refs))
    }
}
