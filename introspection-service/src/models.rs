//! Introspection domain types.
//!
//! Everything here is created per request from catalog or data queries and
//! dropped once the response is serialized. Nothing is mutated after creation.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// A base table of the target database's current schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
}

/// A column with its declared type as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: String,
}

/// A decoded cell.
///
/// The variant is chosen from the driver-reported type of each value, so
/// the same column may legitimately yield `Null` in one row and a concrete
/// variant in the next.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integers that may not fit `i64` (MySQL `... UNSIGNED`).
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Temporal(Temporal),
}

/// Date and time values, kept in the precision the driver reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Temporal {
    TimestampTz(DateTime<Utc>),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
}

/// One tuple: column name to value, in result-set column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new(cells: Vec<(String, Value)>) -> Self {
        Self { cells }
    }

    pub fn into_cells(self) -> Vec<(String, Value)> {
        self.cells
    }
}

#[cfg(test)]
impl Row {
    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// Looks up a cell by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
