//! Row representation and the CSV quoting policy.
//!
//! A [`Record`] is one exported row: an ordered list of column names shared
//! across the whole run, plus one [`FieldValue`] per column. Serialization to
//! CSV fields happens here so the quoting rules live in exactly one place.
//!
//! ## Quoting policy
//!
//! The policy is driven by the *value class*, never by what the text looks
//! like:
//!
//! - `Null` becomes an empty, unquoted field.
//! - `Int`, finite `Float` and `Numeric` are written bare, never quoted.
//! - `Bool` is written bare as `true`/`false`.
//! - `Text` is always quoted, with embedded `"` doubled.
//! - Non-finite floats (`NaN`, `inf`) are quoted, since they do not parse
//!   back as numbers.
//!
//! A text value such as `"0012"` therefore stays quoted and remains
//! distinguishable from the number `12` when the file is read back.

use std::sync::Arc;

/// A single scalar field as it will appear in the output file.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Arbitrary-precision numeric, already rendered in canonical decimal
    /// form by the cursor adapter.
    Numeric(String),
    Text(String),
}

impl FieldValue {
    /// Serializes the value into its final CSV field text, applying the
    /// module-level quoting policy.
    pub fn to_csv_field(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) if f.is_finite() => f.to_string(),
            FieldValue::Float(f) => quote_text(&f.to_string()),
            FieldValue::Numeric(s) => s.clone(),
            FieldValue::Text(s) => quote_text(s),
        }
    }
}

/// Wraps a textual field in quotes, doubling any embedded quote characters.
/// Used for data fields of text class and for header cells.
pub fn quote_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// One exported row.
///
/// Column names are fixed for the life of a run and only known once the
/// first row arrives, so they are shared between all records via `Arc`.
#[derive(Debug, Clone)]
pub struct Record {
    columns: Arc<Vec<String>>,
    values: Vec<FieldValue>,
}

impl Record {
    pub fn new(columns: Arc<Vec<String>>, values: Vec<FieldValue>) -> Self {
        Self { columns, values }
    }

    /// Column names, in projection order.
    pub fn field_names(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// All fields of this row serialized per the quoting policy.
    pub fn csv_fields(&self) -> Vec<String> {
        self.values().iter().map(FieldValue::to_csv_field).collect()
    }
}
