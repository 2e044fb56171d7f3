//! 领域模型到传输模型的转换

use base64::Engine;
use common::models::{ColumnResponse, RowResponse, TableResponse};
use serde_json::{Number, Value as JsonValue};

use crate::models::{Column, Row, Table, Temporal, Value};

impl From<Table> for TableResponse {
    fn from(table: Table) -> Self {
        Self { name: table.name }
    }
}

impl From<Column> for ColumnResponse {
    fn from(column: Column) -> Self {
        Self {
            name: column.name,
            data_type: column.data_type,
        }
    }
}

/// Converts a row into a JSON object, keeping column order.
pub fn row_to_json(row: Row) -> RowResponse {
    row.into_cells()
        .into_iter()
        .map(|(name, value)| (name, value_to_json(value)))
        .collect()
}

/// Converts a single cell.
///
/// Bytes become base64 strings; non-finite floats, which JSON numbers
/// cannot hold, become `"NaN"`, `"Infinity"` or `"-Infinity"`.
pub fn value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(b),
        Value::Int(i) => JsonValue::Number(i.into()),
        Value::UInt(u) => JsonValue::Number(u.into()),
        Value::Float(f) => match Number::from_f64(f) {
            Some(n) => JsonValue::Number(n),
            None if f.is_nan() => JsonValue::String("NaN".into()),
            None if f.is_sign_positive() => JsonValue::String("Infinity".into()),
            None => JsonValue::String("-Infinity".into()),
        },
        Value::Text(s) => JsonValue::String(s),
        Value::Bytes(bytes) => {
            JsonValue::String(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        Value::Temporal(t) => JsonValue::String(temporal_to_string(&t)),
    }
}

fn temporal_to_string(t: &Temporal) -> String {
    match t {
        Temporal::TimestampTz(dt) => dt.to_rfc3339(),
        Temporal::Timestamp(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        Temporal::Date(d) => d.format("%Y-%m-%d").to_string(),
        Temporal::Time(t) => t.format("%H:%M:%S%.f").to_string(),
    }
}
