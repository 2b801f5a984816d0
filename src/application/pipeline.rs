//! End-to-end run coordination: connect, stage, stream, write, tear down.
//!
//! The run is strictly sequential and carries its state through an explicit
//! [`RunState`] value rather than process-wide globals. Every failure path
//! closes the database session before the error is returned to the caller.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate};
use log::{info, warn};

use crate::application::export_writer::ExportWriter;
use crate::application::row_stream::RowStream;
use crate::config::AppConfig;
use crate::domain::errors::{ExportError, Result};
use crate::infrastructure::postgres::cursor::PgCursor;
use crate::infrastructure::postgres::session::Session;
use crate::infrastructure::postgres::staging;

/// Pipeline progress. `Failed` is terminal and reachable from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Connected,
    Staged,
    Streaming,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "init",
            RunState::Connected => "connected",
            RunState::Staged => "staged",
            RunState::Streaming => "streaming",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

fn transition(state: &mut RunState, to: RunState) {
    info!("run state: {} -> {}", state, to);
    *state = to;
}

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunReport {
    pub rows: u64,
    pub output_file: PathBuf,
    pub duration: Duration,
}

/// Runs the whole export once.
///
/// Opens the session, stages the result set, streams it through a named
/// cursor into the dated output file, then closes the session. On any error
/// the session is still torn down before the error propagates.
pub fn run(config: &AppConfig) -> Result<RunReport> {
    let started = Instant::now();
    let mut state = RunState::Init;

    let mut session = match Session::open(&config.database.connection_string) {
        Ok(s) => s,
        Err(e) => {
            transition(&mut state, RunState::Failed);
            return Err(e);
        }
    };
    transition(&mut state, RunState::Connected);

    match execute(&mut session, config, &mut state) {
        Ok((rows, output_file)) => {
            session.close()?;
            transition(&mut state, RunState::Done);
            Ok(RunReport {
                rows,
                output_file,
                duration: started.elapsed(),
            })
        }
        Err(e) => {
            transition(&mut state, RunState::Failed);
            if let Err(close_err) = session.close() {
                warn!("session close after failure also failed: {}", close_err);
            }
            Err(e)
        }
    }
}

fn execute(
    session: &mut Session,
    config: &AppConfig,
    state: &mut RunState,
) -> Result<(u64, PathBuf)> {
    staging::stage(session.client_mut()?, &config.export.staging_sql)?;
    transition(state, RunState::Staged);

    // The destination is only created once staging has succeeded.
    let destination = output_file_path(
        Path::new(&config.export.output_path),
        Local::now().date_naive(),
    );
    let batch_size = config.database.itersize;

    let cursor = PgCursor::open(session.client_mut()?, &config.export.export_query)?;
    let stream = RowStream::new(cursor, batch_size);
    transition(state, RunState::Streaming);

    let rows = ExportWriter::new(batch_size).run(stream, &destination)?;
    if rows == 0 && config.export.fail_on_empty {
        return Err(ExportError::EmptyResult);
    }
    Ok((rows, destination))
}

/// `<output_path>/<ISO-date>-csv_output.csv`
pub fn output_file_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}-csv_output.csv", date.format("%Y-%m-%d")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_path_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let path = output_file_path(Path::new("/tmp/out"), date);
        assert_eq!(path, PathBuf::from("/tmp/out/2026-08-07-csv_output.csv"));
    }

    #[test]
    fn test_run_state_display() {
        assert_eq!(RunState::Init.to_string(), "init");
        assert_eq!(RunState::Streaming.to_string(), "streaming");
        assert_eq!(RunState::Failed.to_string(), "failed");
    }

    #[test]
    fn test_transition_replaces_state() {
        let mut state = RunState::Init;
        transition(&mut state, RunState::Connected);
        assert_eq!(state, RunState::Connected);
        transition(&mut state, RunState::Failed);
        assert_eq!(state, RunState::Failed);
    }
}
