//! Application layer: the streaming pipeline and its coordination.

pub mod export_writer;
pub mod pipeline;
pub mod row_stream;
