//! Row sinks for the load stage.
//!
//! Rows are inserted one at a time. Delivery is at-least-once: a failed
//! load that is re-run inserts the earlier rows again.

use crate::error::PipelineError;
use cda_types::AggregatedRow;
use std::fs::{self, File, OpenOptions};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Column names of the analytics table.
pub const SINK_COLUMNS: [&str; 4] = ["date", "project_id", "transactions", "total_volume_usd"];

/// Destination for aggregated rows.
pub trait RowSink: Send {
    /// Insert one row.
    fn insert(
        &mut self,
        row: &AggregatedRow,
    ) -> impl Future<Output = Result<(), PipelineError>> + Send;

    /// Flush anything buffered. Called once after the last insert.
    fn finish(&mut self) -> impl Future<Output = Result<(), PipelineError>> + Send;
}

/// Appends rows to a CSV file shaped like the analytics table.
///
/// The header is written only when the file is new or empty, so repeated
/// loads accumulate into one file.
///
/// Writes are buffered synchronous `std::fs` I/O performed on the calling
/// task; `insert` only touches the disk when the buffer fills and `finish`
/// flushes it.
pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Open (or create) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| sink_io(&path, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| sink_io(&path, e))?;
        let is_empty = file.metadata().map_err(|e| sink_io(&path, e))?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_empty {
            writer.write_record(SINK_COLUMNS)?;
        }

        debug!("Opened CSV sink at {}", path.display());
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSink for CsvSink {
    async fn insert(&mut self, row: &AggregatedRow) -> Result<(), PipelineError> {
        self.writer.write_record([
            row.date.as_str(),
            row.project_id.as_str(),
            &row.transaction_count.to_string(),
            &row.total_volume_usd.to_string(),
        ])?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), PipelineError> {
        self.writer.flush().map_err(|e| sink_io(&self.path, e))
    }
}

fn sink_io(path: &Path, err: std::io::Error) -> PipelineError {
    PipelineError::Sink(format!("{}: {}", path.display(), err))
}

/// Collects rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub rows: Vec<AggregatedRow>,
    pub finished: bool,
    fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every insert after the first `n` (builder pattern).
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl RowSink for MemorySink {
    async fn insert(&mut self, row: &AggregatedRow) -> Result<(), PipelineError> {
        if self.fail_after.is_some_and(|n| self.rows.len() >= n) {
            return Err(PipelineError::Sink(format!(
                "failed to insert data: row {} rejected",
                self.rows.len() + 1
            )));
        }
        self.rows.push(row.clone());
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), PipelineError> {
        self.finished = true;
        Ok(())
    }
}
