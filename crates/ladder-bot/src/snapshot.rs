//! Snapshot files for offline evaluation.
//!
//! A snapshot file is a JSON object keyed by asset id:
//!
//! ```json
//! {
//!   "So11...": {
//!     "meta": {"age_min": 300, "m5_buys": 20, "m5_sells": 4, "qscore": 50, "lp_sol": 3.0},
//!     "safety": {"ok": true, "score": 80, "metrics": {"top10_share": 0.2, "tx24": 400}},
//!     "liquidity_refs": 25
//!   }
//! }
//! ```

use crate::error::{AppError, AppResult};
use ladder_core::{AssetId, EngineDiagnostics};
use ladder_risk::{AssetSnapshot, StaticProviders};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Read a snapshot file into per-asset entries.
pub fn read_snapshots(path: impl AsRef<Path>) -> AppResult<HashMap<AssetId, AssetSnapshot>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::Snapshot(format!("Failed to read {}: {e}", path.display()))
    })?;
    let raw: HashMap<String, AssetSnapshot> = serde_json::from_str(&content)?;

    let mut snapshots = HashMap::with_capacity(raw.len());
    for (key, snapshot) in raw {
        let asset: AssetId = key
            .parse()
            .map_err(|e| AppError::Snapshot(format!("Bad asset key {key:?}: {e}")))?;
        snapshots.insert(asset, snapshot);
    }
    Ok(snapshots)
}

/// Build in-memory providers from a snapshot file.
pub fn load_providers(path: impl AsRef<Path>) -> AppResult<StaticProviders> {
    let snapshots = read_snapshots(path.as_ref())?;
    info!(
        path = %path.as_ref().display(),
        assets = snapshots.len(),
        "Loaded provider snapshots"
    );
    Ok(StaticProviders::from_snapshots(snapshots))
}

/// Read engine diagnostics from a JSON file.
pub fn read_diagnostics(path: impl AsRef<Path>) -> AppResult<EngineDiagnostics> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::Snapshot(format!("Failed to read {}: {e}", path.display()))
    })?;
    Ok(serde_json::from_str(&content)?)
}
