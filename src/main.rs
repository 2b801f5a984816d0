//! # PostgreSQL staged CSV exporter
//!
//! One-shot bulk export utility: stages a filtered result set in a
//! session-scoped temp table on the server, streams it back in bounded
//! batches through a server-side named cursor, and serializes it to a dated
//! local CSV file.
//!
//! Resident memory stays proportional to the configured batch size
//! regardless of how many rows the staged result set holds.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ports;

use clap::Parser;
use log::{error, info};
use std::process;

use crate::application::pipeline;
use crate::config::{AppConfig, CliArgs};

fn main() {
    env_logger::init();

    let args = CliArgs::parse();

    let mut config = match AppConfig::from_file(&args.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {}", e);
            process::exit(1);
        }
    };
    config.merge_cli(&args);

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        process::exit(1);
    }

    info!("Starting export...");
    match pipeline::run(&config) {
        Ok(report) => {
            info!(
                "Exported {} rows to {} in {:.2}s",
                report.rows,
                report.output_file.display(),
                report.duration.as_secs_f64()
            );
        }
        Err(e) => {
            error!("Export failed: {}", e);
            process::exit(1);
        }
    }
}
