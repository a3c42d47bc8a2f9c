//! Ladder entry gatekeeper: operator application.
//!
//! Wires the gate engine to its collaborators:
//! - Configuration from TOML with `LDR_*` environment overrides
//! - The fill journal feeding the daily circuit breaker
//! - Snapshot-file providers for market, safety and liquidity lookups
//! - Status, config dump and dry-run evaluation for operators

pub mod app;
pub mod config;
pub mod error;
pub mod snapshot;

pub use app::{Application, DryRunReport};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
