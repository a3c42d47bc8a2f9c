//! Core domain types for the ladder entry gatekeeper.
//!
//! This crate provides the types shared across the workspace:
//! - `AssetId`: Identifier of a tradable asset (token mint or symbol)
//! - `Bucket`: Risk-sizing class of an admitted entry
//! - `GateDecision`, `GateReason`: Outcome of a gate evaluation
//! - `MarketMeta`, `SafetyAssessment`: Data returned by external providers
//! - `EngineDiagnostics`, `Bar`: Caller-supplied evaluation inputs

pub mod asset;
pub mod decision;
pub mod error;
mod lenient;
pub mod types;

pub use asset::AssetId;
pub use decision::{Bucket, GateDecision, GateReason, Lookup, RugCheck};
pub use error::{CoreError, Result};
pub use types::{Bar, EngineDiagnostics, MarketMeta, SafetyAssessment, SafetyMetrics};
