//! Tolerant CSV reader for the fill journal.
//!
//! Journals are written by several tools over time, so column names vary.
//! Each logical field resolves to the first alias found in the header
//! (case-insensitive). A missing file is an empty journal.

use crate::error::JournalResult;
use crate::record::{parse_number, parse_timestamp, EventRecord, Side};
use csv::{ReaderBuilder, StringRecord, Trim};
use ladder_core::AssetId;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::{debug, warn};

const TIMESTAMP_ALIASES: [&str; 3] = ["timestamp", "ts", "time"];
const ASSET_ALIASES: [&str; 3] = ["mint", "symbol", "asset"];
const SIDE_ALIASES: [&str; 2] = ["side", "action"];
const QUANTITY_ALIASES: [&str; 3] = ["qty", "quantity", "size"];
const PNL_ALIASES: [&str; 3] = ["realized_usd", "pnl_usd", "pnl"];

/// Header positions of the logical fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ColumnMap {
    timestamp: Option<usize>,
    asset: Option<usize>,
    side: Option<usize>,
    quantity: Option<usize>,
    pnl: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> Self {
        Self {
            timestamp: find_column(headers, &TIMESTAMP_ALIASES),
            asset: find_column(headers, &ASSET_ALIASES),
            side: find_column(headers, &SIDE_ALIASES),
            quantity: find_column(headers, &QUANTITY_ALIASES),
            pnl: find_column(headers, &PNL_ALIASES),
        }
    }

    fn parse_row(&self, row: &StringRecord) -> EventRecord {
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("");

        let asset = AssetId::new(field(self.asset));
        EventRecord {
            timestamp: parse_timestamp(field(self.timestamp)),
            asset: (!asset.is_empty()).then_some(asset),
            side: Side::parse(field(self.side)),
            quantity: parse_number(field(self.quantity)),
            realized_pnl: parse_number(field(self.pnl)),
        }
    }
}

/// First alias present in the header wins.
fn find_column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(alias))
    })
}

/// Read every record of the journal at `path`.
///
/// Returns an empty vector if the file does not exist.
pub fn read_events(path: impl AsRef<Path>) -> JournalResult<Vec<EventRecord>> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Journal not found, treating as empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };
    read_events_from(file)
}

/// Read journal records from any reader (header row required).
pub fn read_events_from<R: Read>(reader: R) -> JournalResult<Vec<EventRecord>> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = ColumnMap::resolve(rdr.headers()?);
    let mut records = Vec::new();

    for (line, row) in rdr.records().enumerate() {
        match row {
            Ok(row) => records.push(columns.parse_row(&row)),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!(row = line + 1, error = %e, "Skipping undecodable journal row");
            }
        }
    }

    Ok(records)
}
