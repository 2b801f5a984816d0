//! Port defining the interface for fetching rows in bounded batches.

use crate::domain::errors::Result;
use crate::domain::record::Record;

/// Port over a forward-only, server-side source of rows.
///
/// `fetch` returns at most `max_rows` rows per call; a batch shorter than
/// `max_rows` (including an empty one) signals that the source is exhausted.
/// `close` releases the underlying cursor and must be safe to call after
/// either exhaustion or a failed fetch.
pub trait BatchSource {
    /// Fetches the next batch of up to `max_rows` rows.
    fn fetch(&mut self, max_rows: usize) -> Result<Vec<Record>>;

    /// Closes the underlying cursor. Idempotent.
    fn close(&mut self) -> Result<()>;
}
