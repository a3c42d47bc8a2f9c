//! Daily risk aggregation over the fill journal.
//!
//! Everything here is recomputed from the full journal on each call. There
//! is deliberately no cache: the day boundary moves with the wall clock and
//! the journal may be appended by other processes.

use crate::error::JournalResult;
use crate::reader::read_events;
use crate::record::EventRecord;
use chrono::{DateTime, FixedOffset, Local, TimeZone, Timelike, Utc};
use ladder_core::AssetId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Seconds in an aggregation day.
pub const DAY_SECS: i64 = 86_400;

/// Net quantity above which a position counts as open.
pub const OPEN_EPSILON: f64 = 1e-9;

/// Timezone used to find the start of the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayTimezone {
    #[default]
    Utc,
    /// Process local timezone.
    Local,
    Fixed(FixedOffset),
}

impl DayTimezone {
    /// Parse a config value, falling back to UTC on anything unrecognised.
    pub fn parse_or_utc(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            warn!(timezone = raw, "Unrecognised day timezone, using UTC");
            Self::Utc
        })
    }

    /// `[start, end)` of the day containing `now`, as epoch seconds.
    pub fn day_window(&self, now: DateTime<Utc>) -> (i64, i64) {
        let start = match self {
            Self::Utc => start_of_day(&now),
            Self::Local => start_of_day(&now.with_timezone(&Local)),
            Self::Fixed(offset) => start_of_day(&now.with_timezone(offset)),
        };
        (start, start + DAY_SECS)
    }
}

impl FromStr for DayTimezone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("utc") || s.eq_ignore_ascii_case("z") {
            return Ok(Self::Utc);
        }
        if s.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        parse_offset(s)
            .map(Self::Fixed)
            .ok_or_else(|| format!("invalid timezone: {s}"))
    }
}

/// Parse `+HH:MM`, `-HHMM` or `+HH`.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn start_of_day<Tz: TimeZone>(now: &DateTime<Tz>) -> i64 {
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| now.timezone().from_local_datetime(&naive).earliest());
    match midnight {
        Some(dt) => dt.timestamp(),
        // Midnight skipped by a DST jump.
        None => now.timestamp() - i64::from(now.num_seconds_from_midnight()),
    }
}

/// Realized P&L and intraday drawdown for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DayAggregate {
    pub pnl_sum: f64,
    /// Largest peak-to-trough decline of the cumulative P&L curve (>= 0).
    pub max_drawdown: f64,
}

fn round6(v: f64) -> f64 {
    let r = (v * 1_000_000.0).round() / 1_000_000.0;
    // Avoid reporting -0.0.
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Aggregate the records falling in the day of `now` in `tz`.
///
/// Records without a parseable timestamp are ignored. The cumulative curve
/// starts at zero, so a losing first fill already counts as drawdown.
pub fn day_aggregate_at(
    records: &[EventRecord],
    tz: DayTimezone,
    now: DateTime<Utc>,
) -> DayAggregate {
    let (start, end) = tz.day_window(now);

    let mut day: Vec<(i64, f64)> = records
        .iter()
        .filter_map(|r| r.timestamp.map(|ts| (ts, r.realized_pnl)))
        .filter(|(ts, _)| (start..end).contains(ts))
        .collect();

    if day.is_empty() {
        return DayAggregate::default();
    }

    day.sort_by_key(|(ts, _)| *ts);

    let mut cum = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut mdd = 0.0_f64;
    for (_, pnl) in &day {
        cum += pnl;
        peak = peak.max(cum);
        mdd = mdd.max(peak - cum);
    }

    DayAggregate {
        pnl_sum: round6(cum),
        max_drawdown: round6(mdd),
    }
}

/// Net signed quantity per asset across all records.
pub fn net_positions(records: &[EventRecord]) -> HashMap<AssetId, f64> {
    let mut nets: HashMap<AssetId, f64> = HashMap::new();
    for record in records {
        let Some(asset) = &record.asset else {
            continue;
        };
        let sign = record.side.sign();
        if sign == 0.0 {
            continue;
        }
        *nets.entry(asset.clone()).or_insert(0.0) += sign * record.quantity;
    }
    nets
}

/// Number of assets whose net quantity is above `OPEN_EPSILON`.
pub fn open_position_count(records: &[EventRecord]) -> usize {
    net_positions(records)
        .values()
        .filter(|net| **net > OPEN_EPSILON)
        .count()
}

/// Handle to the fill journal on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> JournalResult<Vec<EventRecord>> {
        read_events(&self.path)
    }

    /// Today's aggregate in `tz`.
    pub fn day_aggregate(&self, tz: DayTimezone) -> JournalResult<DayAggregate> {
        Ok(day_aggregate_at(&self.read()?, tz, Utc::now()))
    }

    pub fn open_position_count(&self) -> JournalResult<usize> {
        Ok(open_position_count(&self.read()?))
    }

    /// Day aggregate and open count from a single read.
    pub fn day_risk(
        &self,
        tz: DayTimezone,
        now: DateTime<Utc>,
    ) -> JournalResult<(DayAggregate, usize)> {
        let records = self.read()?;
        Ok((
            day_aggregate_at(&records, tz, now),
            open_position_count(&records),
        ))
    }
}
