//! Forgiving field deserializers for provider payloads.
//!
//! Upstream scanners are loosely typed: counts arrive as floats or strings,
//! flags as `0`/`1`. These helpers coerce any scalar into the target type and
//! resolve anything unusable (null, arrays, objects, junk text) to zero.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl Loose {
    fn into_u64(self) -> u64 {
        match self {
            Loose::Bool(b) => u64::from(b),
            Loose::Int(v) => u64::try_from(v).unwrap_or(0),
            Loose::UInt(v) => v,
            Loose::Float(v) => float_to_u64(v),
            Loose::Text(s) => {
                let s = s.trim();
                s.parse::<u64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(float_to_u64))
                    .unwrap_or(0)
            }
            Loose::Null | Loose::Other(_) => 0,
        }
    }

    fn into_i64(self) -> i64 {
        match self {
            Loose::Bool(b) => i64::from(b),
            Loose::Int(v) => v,
            Loose::UInt(v) => i64::try_from(v).unwrap_or(i64::MAX),
            Loose::Float(v) => float_to_i64(v),
            Loose::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(float_to_i64))
                    .unwrap_or(0)
            }
            Loose::Null | Loose::Other(_) => 0,
        }
    }

    fn into_f64(self) -> f64 {
        let v = match self {
            Loose::Bool(b) => f64::from(u8::from(b)),
            Loose::Int(v) => v as f64,
            Loose::UInt(v) => v as f64,
            Loose::Float(v) => v,
            Loose::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            Loose::Null | Loose::Other(_) => 0.0,
        };
        if v.is_finite() {
            v
        } else {
            0.0
        }
    }

    fn into_bool(self) -> bool {
        match self {
            Loose::Bool(b) => b,
            Loose::Int(v) => v != 0,
            Loose::UInt(v) => v != 0,
            Loose::Float(v) => v != 0.0 && !v.is_nan(),
            Loose::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
            Loose::Null | Loose::Other(_) => false,
        }
    }
}

// Truncates toward zero; `as` saturates and maps NaN to 0.
fn float_to_u64(v: f64) -> u64 {
    v as u64
}

fn float_to_i64(v: f64) -> i64 {
    v as i64
}

pub(crate) fn unsigned<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Loose::deserialize(d).map(Loose::into_u64)
}

pub(crate) fn signed<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Loose::deserialize(d).map(Loose::into_i64)
}

pub(crate) fn float<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Loose::deserialize(d).map(Loose::into_f64)
}

pub(crate) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Loose::deserialize(d).map(Loose::into_bool)
}

/// Like [`unsigned`], but null and unusable values stay unknown.
pub(crate) fn opt_unsigned<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Loose::deserialize(d).map(|v| match v {
        Loose::Null | Loose::Other(_) => None,
        other => Some(other.into_u64()),
    })
}
