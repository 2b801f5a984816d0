//! Lazy, single-pass row stream over a batch-fetching source.
//!
//! `RowStream` decouples fetch granularity (one server round trip of up to
//! `batch_size` rows) from consumption granularity (one row at a time). The
//! in-memory buffer never holds more than `batch_size` rows, so resident
//! memory is independent of the total result-set size.
//!
//! The stream is finite, forward-only and non-restartable: once exhausted or
//! failed it yields `None` forever, and a fresh source must be opened to
//! iterate again. The source is closed on every terminal path — after the
//! last buffered row on natural exhaustion, or immediately when a fetch
//! fails — and any error is yielded exactly once.

use std::collections::VecDeque;

use log::debug;

use crate::domain::errors::Result;
use crate::domain::record::Record;
use crate::ports::batch_source::BatchSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// More batches may remain on the server.
    Active,
    /// The final batch is buffered; the source still has to be closed.
    Exhausted,
    /// Closed cleanly; nothing left to yield.
    Finished,
    /// Terminal after a fetch or close error.
    Failed,
}

/// Pull-based iterator yielding one [`Record`] at a time.
pub struct RowStream<S: BatchSource> {
    source: S,
    batch_size: usize,
    buffer: VecDeque<Record>,
    state: StreamState,
}

impl<S: BatchSource> RowStream<S> {
    /// Wraps `source`, fetching up to `batch_size` rows per round trip.
    pub fn new(source: S, batch_size: usize) -> Self {
        debug_assert!(batch_size >= 1);
        Self {
            source,
            batch_size,
            buffer: VecDeque::new(),
            state: StreamState::Active,
        }
    }

    /// Refills the buffer with one batch. A batch shorter than `batch_size`
    /// means the cursor is exhausted, saving the final empty round trip.
    fn refill(&mut self) -> Result<()> {
        match self.source.fetch(self.batch_size) {
            Ok(batch) => {
                if batch.len() < self.batch_size {
                    self.state = StreamState::Exhausted;
                }
                self.buffer.extend(batch);
                Ok(())
            }
            Err(e) => {
                self.state = StreamState::Failed;
                if let Err(close_err) = self.source.close() {
                    debug!("cursor close after failed fetch also failed: {}", close_err);
                }
                Err(e)
            }
        }
    }

    #[cfg(test)]
    fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl<S: BatchSource> Iterator for RowStream<S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                return Some(Ok(record));
            }
            match self.state {
                StreamState::Finished | StreamState::Failed => return None,
                StreamState::Exhausted => {
                    self.state = StreamState::Finished;
                    if let Err(e) = self.source.close() {
                        self.state = StreamState::Failed;
                        return Some(Err(e));
                    }
                    return None;
                }
                StreamState::Active => {
                    if let Err(e) = self.refill() {
                        return Some(Err(e));
                    }
                }
            }
        }
    }
}
