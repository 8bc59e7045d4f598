//! Parallel extraction over a fixed-size worker pool.
//!
//! # Design
//!
//! All rows are queued up front on a bounded channel sized to the row
//! count, and the sending half is dropped before any worker starts, so
//! the queue is closed exactly once. `W` scoped worker threads then take
//! turns receiving from the queue and push every outcome onto one of two
//! output channels (transactions or failures). Once every worker has
//! been joined, the last output senders are gone and the caller drains
//! both channels to decide the outcome.

use crate::decoder::RecordDecoder;
use crate::error::{DecodeError, ExtractionError, RowFailure};
use crate::scanner::{FieldExtractor, KeyScanner};
use cda_types::Transaction;
use csv::StringRecord;
use parking_lot::Mutex;
use std::sync::mpsc;
use std::thread;

/// A queued row: its 1-based line in the input plus its fields.
type Job = (u64, StringRecord);

/// Drains raw rows through a [`RecordDecoder`] on `W` worker threads.
///
/// # Example
///
/// ```rust
/// use cda_extract::{ExtractionError, RecordExtractor};
///
/// let extractor = RecordExtractor::new(8).unwrap();
///
/// // A header with no rows is an empty success.
/// let header = "app,ts,event,project_id\n";
/// assert!(extractor.extract(header.as_bytes()).unwrap().is_empty());
///
/// // Zero workers is a configuration error.
/// assert!(matches!(
///     RecordExtractor::new(0),
///     Err(ExtractionError::InvalidWorkerCount(0))
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct RecordExtractor<E = KeyScanner> {
    decoder: RecordDecoder<E>,
    workers: usize,
}

impl RecordExtractor {
    /// Create an extractor with `workers` threads and the default decoder.
    ///
    /// # Errors
    ///
    /// Returns `InvalidWorkerCount` if `workers` is zero.
    pub fn new(workers: usize) -> Result<Self, ExtractionError> {
        Self::with_decoder(RecordDecoder::new(), workers)
    }
}

impl<E: FieldExtractor> RecordExtractor<E> {
    /// Create an extractor with a custom decoder.
    pub fn with_decoder(decoder: RecordDecoder<E>, workers: usize) -> Result<Self, ExtractionError> {
        if workers == 0 {
            return Err(ExtractionError::InvalidWorkerCount(workers));
        }
        Ok(Self { decoder, workers })
    }

    /// Number of worker threads used per call.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Read a CSV export (header row first) and decode every data row.
    ///
    /// # Errors
    ///
    /// - `Decode(Structure)` if there is no header row or the record
    ///   stream cannot be read (e.g. rows of differing lengths)
    /// - `Rows` if any individual row fails to decode
    pub fn extract(&self, input: &[u8]) -> Result<Vec<Transaction>, ExtractionError> {
        let records = read_records(input)?;
        self.extract_records(records)
    }

    /// Decode already-split rows on the worker pool.
    ///
    /// Returns every transaction, in no particular order, or every
    /// row-level failure sorted by line.
    pub fn extract_records(
        &self,
        records: Vec<StringRecord>,
    ) -> Result<Vec<Transaction>, ExtractionError> {
        let total = records.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        tracing::debug!("Extracting {} rows with {} workers", total, self.workers);

        let (job_tx, job_rx) = mpsc::sync_channel::<Job>(total);
        for (idx, record) in records.into_iter().enumerate() {
            let line = record
                .position()
                .map(|p| p.line())
                .unwrap_or(idx as u64 + 2);
            // Capacity equals the row count, so this never blocks.
            if job_tx.send((line, record)).is_err() {
                break;
            }
        }
        drop(job_tx);

        let queue = Mutex::new(job_rx);
        let (result_tx, result_rx) = mpsc::channel::<Transaction>();
        let (error_tx, error_rx) = mpsc::channel::<RowFailure>();

        let panicked = thread::scope(|scope| {
            let handles: Vec<_> = (0..self.workers)
                .map(|_| {
                    let queue = &queue;
                    let decoder = &self.decoder;
                    let result_tx = result_tx.clone();
                    let error_tx = error_tx.clone();

                    scope.spawn(move || {
                        loop {
                            // Lock only for the receive, not the decode.
                            let job = queue.lock().recv();
                            let Ok((line, record)) = job else {
                                break;
                            };
                            let sent = match decoder.decode(&record) {
                                Ok(transaction) => result_tx.send(transaction).is_ok(),
                                Err(error) => error_tx.send(RowFailure { line, error }).is_ok(),
                            };
                            if !sent {
                                break;
                            }
                        }
                    })
                })
                .collect();

            drop(result_tx);
            drop(error_tx);

            handles
                .into_iter()
                .map(|handle| handle.join())
                .filter(Result::is_err)
                .count()
        });

        if panicked > 0 {
            return Err(ExtractionError::WorkerPanicked);
        }

        let transactions: Vec<Transaction> = result_rx.into_iter().collect();
        let mut failures: Vec<RowFailure> = error_rx.into_iter().collect();

        if !failures.is_empty() {
            failures.sort_by_key(|f| f.line);
            tracing::warn!(
                "Extraction failed: {} of {} rows could not be decoded",
                failures.len(),
                total
            );
            return Err(ExtractionError::Rows { failures, total });
        }

        tracing::info!("Extracted {} transactions", transactions.len());
        Ok(transactions)
    }
}

/// Split a CSV export into data rows, skipping the header.
fn read_records(input: &[u8]) -> Result<Vec<StringRecord>, DecodeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);

    let header = reader.headers()?;
    if header.is_empty() {
        return Err(DecodeError::Structure("missing header row".to_string()));
    }

    let records = reader.records().collect::<Result<Vec<_>, _>>()?;
    Ok(records)
}
