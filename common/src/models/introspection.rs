//! Introspection transport models.
//!
//! Wire shapes returned by the introspection API, plus the validated request
//! metadata (connection string, table name) its handlers consume.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// A table of the introspected database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct TableResponse {
    /// Table name exactly as reported by the catalog.
    pub name: String,
}

/// A column of an introspected table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ColumnResponse {
    /// Column name exactly as reported by the catalog.
    pub name: String,
    /// Declared type name, not normalized.
    #[serde(rename = "type")]
    pub data_type: String,
}

/// One row, keyed by column name in column order.
pub type RowResponse = serde_json::Map<String, serde_json::Value>;

/// Request metadata for table listing.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TablesRequest {
    /// Driver-specific connection string.
    #[validate(length(min = 1, message = "no connection string header provided"))]
    pub connection_string: String,
}

/// Request metadata for column and row listing.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TableRequest {
    /// Driver-specific connection string.
    #[validate(length(min = 1, message = "no connection string header provided"))]
    pub connection_string: String,
    /// Table to inspect.
    #[validate(length(min = 1, message = "no table name header provided"))]
    pub table_name: String,
}
