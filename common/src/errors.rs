//! Application error type.
//!
//! `AppError` is the single error type crossing service boundaries. Its
//! `IntoResponse` impl renders the shared [`ApiResponse`] envelope with a
//! status code derived from the error kind.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::response::ApiResponse;

/// Result alias used throughout the workspace.
pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by the services.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed caller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// The connection string names a driver we cannot open.
    #[error("unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    /// The target database could not be reached or authenticated against.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// A catalog metadata query failed.
    #[error("catalog query failed: {0}")]
    CatalogQuery(String),

    /// The named table does not exist in the target schema.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// A data query failed to run or a row failed to decode.
    #[error("query execution failed: {0}")]
    QueryExecution(String),

    /// The query sequence exceeded its deadline.
    #[error("query timed out after {0} seconds")]
    QueryTimeout(u64),

    /// Missing or invalid bearer token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Login failed.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// No user with the given key.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Registration with an email that is taken.
    #[error("user with email {0} already exists")]
    UserAlreadyExists(String),

    /// A query against the service's own database failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::UnsupportedDatabaseType(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::DatabaseConnection(_)
            | AppError::CatalogQuery(_)
            | AppError::QueryExecution(_) => StatusCode::BAD_GATEWAY,
            AppError::TableNotFound(_) | AppError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AppError::QueryTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Unauthorized(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            AppError::DatabaseQuery(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::UnsupportedDatabaseType(_) => "UNSUPPORTED_DATABASE",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::CatalogQuery(_) => "CATALOG_QUERY_ERROR",
            AppError::TableNotFound(_) => "TABLE_NOT_FOUND",
            AppError::QueryExecution(_) => "QUERY_EXECUTION_ERROR",
            AppError::QueryTimeout(_) => "QUERY_TIMEOUT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::UserNotFound(_) => "USER_NOT_FOUND",
            AppError::UserAlreadyExists(_) => "USER_ALREADY_EXISTS",
            AppError::DatabaseQuery(_) => "DATABASE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Structured context for the error body, where a variant has any.
    ///
    /// Never includes driver text, which may echo the connection string.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::UnsupportedDatabaseType(scheme) => Some(json!({ "scheme": scheme })),
            AppError::TableNotFound(table) => Some(json!({ "table": table })),
            AppError::QueryTimeout(secs) => Some(json!({ "timeout_secs": secs })),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "request rejected");
        }

        let body = ApiResponse::err_with_details(self.code(), self.to_string(), self.details());
        (status, Json(body)).into_response()
    }
}
