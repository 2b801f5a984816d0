//! Core error definitions for the export pipeline.
//!
//! This module provides a centralized `ExportError` enum and a `Result` type
//! used throughout the application. Every error is terminal for the current
//! run; there are no retries anywhere in the pipeline.

use thiserror::Error;

/// Error types encountered during an export run.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connectivity error: {0}")]
    Connectivity(#[source] postgres::Error),

    #[error("Staging failed: {0}")]
    Staging(#[source] postgres::Error),

    #[error("Row stream failed: {0}")]
    Stream(String),

    #[error("Unsupported column type {ty} for column {column}")]
    UnsupportedType { column: String, ty: String },

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Staged result set produced no rows")]
    EmptyResult,
}

/// A specialized Result type for the exporter.
pub type Result<T> = std::result::Result<T, ExportError>;
