//! Batched persistence of enriched records
//!
//! The `BatchWriter` is the only consumer of the result funnel. It keeps at
//! most `batch_size` records in memory and writes them to its sink in one
//! bulk operation whenever that many have accumulated, plus once more when
//! the funnel closes. A failed flush is logged and counted; the writer keeps
//! consuming so later batches still reach the sink.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error};

use super::funnel::FunnelReceiver;
use super::progress::ProgressReporter;
use super::scrape_types::{ScrapeError, ScrapeResult};
use crate::page_parser::Record;
use crate::utils::CSV_HEADERS;

/// Destination for flushed batches
pub trait RecordSink: Send {
    /// Persist every record of `batch`, in order
    ///
    /// # Errors
    /// Any I/O or encoding failure. The caller discards the batch either way.
    fn write_batch(&mut self, batch: &[Record]) -> ScrapeResult<()>;
}

/// CSV file sink with the fixed header row
///
/// Each batch is encoded in memory first and reaches the underlying writer
/// in a single `write_all`, so a rejected batch leaves nothing behind to be
/// written by a later flush.
pub struct CsvSink<W: Write> {
    inner: W,
}

impl CsvSink<File> {
    /// Create (or truncate) the output file and write the header row
    ///
    /// # Errors
    /// Returns `ScrapeError::Sink` if the file cannot be created or the
    /// header cannot be written. Callers treat this as fatal.
    pub fn create(path: impl AsRef<Path>) -> ScrapeResult<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            ScrapeError::Sink(format!("cannot create {}: {e}", path.display()))
        })?;
        Self::from_writer(file)
    }
}

impl<W: Write + Send> CsvSink<W> {
    /// Wrap an arbitrary writer, writing the header row immediately
    ///
    /// # Errors
    /// Returns `ScrapeError::Sink` if the header cannot be written.
    pub fn from_writer(inner: W) -> ScrapeResult<Self> {
        let mut sink = Self { inner };
        let header = encode_rows(std::iter::once(CSV_HEADERS))?;
        sink.write_encoded(&header)?;
        Ok(sink)
    }

    /// Flush and return the underlying writer
    ///
    /// # Errors
    /// Returns `ScrapeError::Sink` if the writer cannot be flushed.
    pub fn into_inner(mut self) -> ScrapeResult<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn write_encoded(&mut self, bytes: &[u8]) -> ScrapeResult<()> {
        self.inner.write_all(bytes)?;
        self.inner.flush()?;
        Ok(())
    }
}

/// Encode rows into a standalone CSV buffer
fn encode_rows<I, R>(rows: I) -> ScrapeResult<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut encoder = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for row in rows {
        encoder.write_record(row)?;
    }
    encoder
        .into_inner()
        .map_err(|e| ScrapeError::Sink(e.error().to_string()))
}

impl<W: Write + Send> RecordSink for CsvSink<W> {
    fn write_batch(&mut self, batch: &[Record]) -> ScrapeResult<()> {
        let bytes = encode_rows(batch.iter().map(Record::to_row))?;
        self.write_encoded(&bytes)
    }
}

/// Counters kept by the writer over its lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Records taken off the funnel
    pub received: usize,
    /// Records in batches the sink accepted
    pub written: usize,
    /// Size of every flush in order, the final one included
    pub flushes: Vec<usize>,
    /// Flushes the sink rejected
    pub failed_flushes: usize,
}

/// Sole consumer of the result funnel
pub struct BatchWriter<S, P> {
    sink: S,
    batch: Vec<Record>,
    batch_size: usize,
    total_expected: usize,
    progress: Arc<P>,
    stats: WriterStats,
}

impl<S: RecordSink, P: ProgressReporter> BatchWriter<S, P> {
    /// Create a writer flushing every `batch_size` records (minimum 1)
    ///
    /// `total_expected` is only used for progress reporting.
    pub fn new(sink: S, batch_size: usize, total_expected: usize, progress: Arc<P>) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            sink,
            batch: Vec::with_capacity(batch_size),
            batch_size,
            total_expected,
            progress,
            stats: WriterStats::default(),
        }
    }

    /// Add one record, flushing if the batch is now full
    pub fn push(&mut self, record: Record) {
        self.batch.push(record);
        self.stats.received += 1;
        if self.batch.len() >= self.batch_size {
            self.flush();
        }
    }

    /// Write the current batch to the sink and empty it
    fn flush(&mut self) {
        let size = self.batch.len();
        match self.sink.write_batch(&self.batch) {
            Ok(()) => {
                self.stats.written += size;
                debug!(
                    "Flushed batch of {size} records ({} written so far)",
                    self.stats.written
                );
                self.progress
                    .report_batch_flushed(size, self.stats.written, self.total_expected);
            }
            Err(e) => {
                self.stats.failed_flushes += 1;
                error!("Error writing batch of {size} records: {e}");
                self.progress.report_flush_failed(size, &e);
            }
        }
        self.stats.flushes.push(size);
        self.batch.clear();
    }

    /// Flush whatever remains (possibly nothing) and return the final counters
    pub fn finish(mut self) -> WriterStats {
        self.flush();
        self.stats
    }

    /// Drain `funnel` until it closes, then finish
    ///
    /// Blocks the calling thread; run it under `tokio::task::spawn_blocking`
    /// or on a dedicated thread.
    pub fn run_blocking(mut self, mut funnel: FunnelReceiver<Record>) -> WriterStats {
        while let Some(record) = funnel.blocking_recv() {
            self.push(record);
        }
        self.finish()
    }

    /// Records currently buffered
    #[must_use]
    pub fn pending(&self) -> usize {
        self.batch.len()
    }
}
