//! Exclusive owner of the PostgreSQL session used by the whole run.

use log::{info, warn};
use postgres::{Client, NoTls};

use crate::domain::errors::{ExportError, Result};

/// Single live database handle.
///
/// Created once at startup and destroyed exactly once at shutdown: `close`
/// is a no-op after the first successful call, and `Drop` closes the
/// connection on abnormal exit paths so the server-side session (and with it
/// any staged temp table) is always released.
pub struct Session {
    client: Option<Client>,
}

impl Session {
    /// Establishes the session. A failure here halts the pipeline before
    /// staging; the run never continues without a live session.
    pub fn open(connection_string: &str) -> Result<Self> {
        info!("connecting to database");
        let client =
            Client::connect(connection_string, NoTls).map_err(ExportError::Connectivity)?;
        Ok(Self {
            client: Some(client),
        })
    }

    /// Borrows the live connection.
    pub fn client_mut(&mut self) -> Result<&mut Client> {
        self.client
            .as_mut()
            .ok_or_else(|| ExportError::Config("session is already closed".to_string()))
    }

    /// Releases the session. Safe to call multiple times.
    pub fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            info!("closing database connection");
            client.close().map_err(ExportError::Connectivity)?;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(e) = client.close() {
                warn!("error closing database connection: {}", e);
            }
        }
    }
}
