//! Append-only CSV writer for executed fills.
//!
//! Opens the journal in append mode so existing rows are never truncated.
//! The header is written only when the file is new or empty. Every append
//! is flushed immediately: the daily breaker reads this file on the next
//! evaluation.

use crate::error::JournalResult;
use crate::record::Side;
use csv::{Writer, WriterBuilder};
use ladder_core::AssetId;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HEADER: [&str; 5] = ["timestamp", "mint", "side", "qty", "realized_usd"];

/// An executed fill to append to the journal.
#[derive(Debug, Clone, PartialEq)]
pub struct FillRecord {
    /// Epoch seconds.
    pub timestamp: i64,
    pub asset: AssetId,
    pub side: Side,
    pub quantity: f64,
    pub realized_pnl: f64,
}

/// Appends fills to the journal file.
pub struct JournalWriter {
    path: PathBuf,
    writer: Writer<File>,
    records_written: usize,
}

impl JournalWriter {
    /// Open (or create) the journal at `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> JournalResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(HEADER)?;
            writer.flush()?;
            info!(path = %path.display(), "Created fill journal");
        }

        Ok(Self {
            path,
            writer,
            records_written: 0,
        })
    }

    /// Append one fill and flush it to disk.
    pub fn append(&mut self, fill: &FillRecord) -> JournalResult<()> {
        self.writer.write_record([
            fill.timestamp.to_string(),
            fill.asset.to_string(),
            fill.side.to_string(),
            fill.quantity.to_string(),
            fill.realized_pnl.to_string(),
        ])?;
        self.writer.flush()?;
        self.records_written += 1;

        debug!(
            asset = %fill.asset,
            side = %fill.side,
            qty = fill.quantity,
            pnl = fill.realized_pnl,
            "Appended fill to journal"
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows appended through this writer.
    pub fn records_written(&self) -> usize {
        self.records_written
    }
}
