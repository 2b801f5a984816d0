//! Server-side named cursor adapter implementing `BatchSource`.
//!
//! The cursor is declared `NO SCROLL` inside its own transaction. `close`
//! issues `CLOSE` and commits; dropping the adapter without closing rolls
//! the transaction back, which also discards the cursor server-side. Either
//! way the cursor cannot outlive the adapter.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use log::debug;
use postgres::types::Type;
use postgres::{Client, Row, Transaction};

use crate::domain::errors::{ExportError, Result};
use crate::domain::record::{FieldValue, Record};
use crate::infrastructure::postgres::numeric::PgNumeric;
use crate::ports::batch_source::BatchSource;

static CURSOR_SEQ: AtomicU64 = AtomicU64::new(0);

/// Cursor names only need to be unique among cursors open on the same
/// session; a process-wide counter makes that deterministic.
pub(crate) fn next_cursor_name() -> String {
    format!("csv_export_cur_{}", CURSOR_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// Forward-only named cursor over the export query.
pub struct PgCursor<'a> {
    txn: Option<Transaction<'a>>,
    name: String,
    columns: Option<Arc<Vec<String>>>,
}

impl<'a> PgCursor<'a> {
    /// Declares a named cursor for `query`. The query text is a configured
    /// input executed verbatim.
    pub fn open(client: &'a mut Client, query: &str) -> Result<Self> {
        let name = next_cursor_name();
        debug!("declaring cursor {}", name);
        let mut txn = client.transaction().map_err(stream_err)?;
        txn.batch_execute(&format!("DECLARE {} NO SCROLL CURSOR FOR {}", name, query))
            .map_err(stream_err)?;
        Ok(Self {
            txn: Some(txn),
            name,
            columns: None,
        })
    }

    fn decode_row(&mut self, row: &Row) -> Result<Record> {
        let columns = match &self.columns {
            Some(c) => Arc::clone(c),
            None => {
                let names: Vec<String> =
                    row.columns().iter().map(|c| c.name().to_string()).collect();
                let shared = Arc::new(names);
                self.columns = Some(Arc::clone(&shared));
                shared
            }
        };

        let mut values = Vec::with_capacity(columns.len());
        for (idx, col) in row.columns().iter().enumerate() {
            values.push(decode_value(row, idx, col.type_(), col.name())?);
        }
        Ok(Record::new(columns, values))
    }
}

impl BatchSource for PgCursor<'_> {
    fn fetch(&mut self, max_rows: usize) -> Result<Vec<Record>> {
        let rows = {
            let txn = self
                .txn
                .as_mut()
                .ok_or_else(|| ExportError::Stream("cursor is already closed".to_string()))?;
            let sql = format!("FETCH FORWARD {} FROM {}", max_rows, self.name);
            txn.query(sql.as_str(), &[]).map_err(stream_err)?
        };

        let mut batch = Vec::with_capacity(rows.len());
        for row in &rows {
            batch.push(self.decode_row(row)?);
        }
        Ok(batch)
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut txn) = self.txn.take() {
            debug!("closing cursor {}", self.name);
            txn.batch_execute(&format!("CLOSE {}", self.name))
                .map_err(stream_err)?;
            txn.commit().map_err(stream_err)?;
        }
        Ok(())
    }
}

fn stream_err(e: postgres::Error) -> ExportError {
    ExportError::Stream(e.to_string())
}

/// Decodes one column of one row into the exporter's value taxonomy.
///
/// NULLs collapse to `FieldValue::Null` regardless of column type. Types
/// outside the known set fall back to a textual read, which covers enums and
/// text-like extensions; anything else surfaces as an unsupported-type error
/// naming the column.
fn decode_value(row: &Row, idx: usize, ty: &Type, column: &str) -> Result<FieldValue> {
    let decoded = match *ty {
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)
            .map(|v| v.map(FieldValue::Bool)),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .map(|v| v.map(|n| FieldValue::Int(n as i64))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .map(|v| v.map(|n| FieldValue::Int(n as i64))),
        Type::INT8 => row
            .try_get::<_, Option<i64>>(idx)
            .map(|v| v.map(FieldValue::Int)),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map(|v| v.map(|n| FieldValue::Float(n as f64))),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)
            .map(|v| v.map(FieldValue::Float)),
        Type::NUMERIC => row
            .try_get::<_, Option<PgNumeric>>(idx)
            .map(|v| v.map(|n| FieldValue::Numeric(n.into_string()))),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
            .try_get::<_, Option<String>>(idx)
            .map(|v| v.map(FieldValue::Text)),
        Type::DATE => row
            .try_get::<_, Option<chrono::NaiveDate>>(idx)
            .map(|v| v.map(|d| FieldValue::Text(d.format("%Y-%m-%d").to_string()))),
        Type::TIME => row
            .try_get::<_, Option<chrono::NaiveTime>>(idx)
            .map(|v| v.map(|t| FieldValue::Text(t.format("%H:%M:%S%.6f").to_string()))),
        Type::TIMESTAMP => row.try_get::<_, Option<chrono::NaiveDateTime>>(idx).map(|v| {
            v.map(|ts| FieldValue::Text(ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()))
        }),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)
            .map(|v| {
                v.map(|ts| FieldValue::Text(ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()))
            }),
        Type::UUID => row
            .try_get::<_, Option<uuid::Uuid>>(idx)
            .map(|v| v.map(|u| FieldValue::Text(u.to_string()))),
        Type::JSON | Type::JSONB => row
            .try_get::<_, Option<serde_json::Value>>(idx)
            .map(|v| v.map(|j| FieldValue::Text(j.to_string()))),
        Type::BYTEA => row.try_get::<_, Option<Vec<u8>>>(idx).map(|v| {
            v.map(|bytes| FieldValue::Text(general_purpose::STANDARD.encode(bytes)))
        }),
        _ => {
            return row
                .try_get::<_, Option<String>>(idx)
                .map(|v| v.map(FieldValue::Text).unwrap_or(FieldValue::Null))
                .map_err(|_| ExportError::UnsupportedType {
                    column: column.to_string(),
                    ty: ty.to_string(),
                })
        }
    };

    match decoded {
        Ok(value) => Ok(value.unwrap_or(FieldValue::Null)),
        Err(e) => Err(ExportError::Stream(format!(
            "column {} ({}): {}",
            column, ty, e
        ))),
    }
}
