//! Trade fill journal for the ladder gatekeeper.
//!
//! The journal is an append-only delimited log of fills. It is the only
//! source of truth for the daily circuit breaker:
//! - `reader`: tolerant parsing into typed `EventRecord`s
//! - `aggregate`: daily realized P&L, intraday drawdown, open positions
//! - `writer`: appending executed fills

pub mod aggregate;
pub mod error;
pub mod reader;
pub mod record;
pub mod writer;

pub use aggregate::{
    day_aggregate_at, net_positions, open_position_count, DayAggregate, DayTimezone, EventLog,
    OPEN_EPSILON,
};
pub use error::{JournalError, JournalResult};
pub use reader::{read_events, read_events_from};
pub use record::{parse_number, parse_timestamp, EventRecord, Side};
pub use writer::{FillRecord, JournalWriter};
