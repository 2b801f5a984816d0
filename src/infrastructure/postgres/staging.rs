//! Executes the configured staging statement against the session.

use log::info;
use postgres::Client;

use crate::domain::errors::{ExportError, Result};

/// Runs the staging statement pair (unconditional drop of any pre-existing
/// staged object, then create-from-query) as one unit of work.
///
/// The transaction commits only if every statement succeeds; if anything
/// fails the transaction guard rolls back when dropped, and the error
/// propagates before any cursor is opened. The statement text itself is a
/// configured input, never assembled here.
pub fn stage(client: &mut Client, staging_sql: &str) -> Result<()> {
    info!("creating staged result set");
    let mut txn = client.transaction().map_err(ExportError::Staging)?;
    txn.batch_execute(staging_sql).map_err(ExportError::Staging)?;
    txn.commit().map_err(ExportError::Staging)?;
    info!("staged result set ready");
    Ok(())
}
