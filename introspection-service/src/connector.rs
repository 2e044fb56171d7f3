//! Request-scoped database connections.
//!
//! Opens a single, unpooled connection for one introspection call. The driver
//! is chosen from the connection string's scheme (MySQL, PostgreSQL, SQLite).
//! The handle is owned by the caller and must be given back through
//! [`DbConnection::close`]; if the owning future is dropped instead (panic,
//! cancelled request) the driver connection's `Drop` releases the socket.

use std::str::FromStr;
use std::time::Duration;

use common::errors::{AppError, AppResult};
use common::utils::{redact_connection_string, scrub};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, MySqlConnection, PgConnection, SqliteConnection};

/// Upper bound for a graceful close. Past it the handle is simply dropped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Database engine selected by the connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// PostgreSQL (`postgres://`, `postgresql://`).
    Postgres,
    /// MySQL (`mysql://`).
    MySql,
    /// SQLite (`sqlite:`).
    Sqlite,
}

impl DbKind {
    /// Determines the engine from the scheme of a connection string.
    ///
    /// Only the scheme is echoed back in errors; the rest of the string may
    /// carry credentials.
    pub fn from_connection_string(connection_string: &str) -> AppResult<Self> {
        let (scheme, _) = connection_string.split_once(':').ok_or_else(|| {
            AppError::Validation("connection string must start with a driver scheme".into())
        })?;

        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(DbKind::Postgres),
            "mysql" | "mariadb" => Ok(DbKind::MySql),
            "sqlite" => Ok(DbKind::Sqlite),
            other => Err(AppError::UnsupportedDatabaseType(other.to_string())),
        }
    }
}

impl std::fmt::Display for DbKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbKind::Postgres => write!(f, "postgres"),
            DbKind::MySql => write!(f, "mysql"),
            DbKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// An open connection to the caller's database.
#[derive(Debug)]
pub enum DbConnection {
    /// PostgreSQL connection.
    Postgres(PgConnection),
    /// MySQL connection.
    MySql(MySqlConnection),
    /// SQLite connection (opened read-only).
    Sqlite(SqliteConnection),
}

impl DbConnection {
    /// Engine of this connection.
    pub fn kind(&self) -> DbKind {
        match self {
            DbConnection::Postgres(_) => DbKind::Postgres,
            DbConnection::MySql(_) => DbKind::MySql,
            DbConnection::Sqlite(_) => DbKind::Sqlite,
        }
    }

    /// Terminates the session.
    ///
    /// Failures are logged and swallowed so they never mask the result of
    /// the operation that used the connection.
    pub async fn close(self) {
        let kind = self.kind();
        let closing = async move {
            match self {
                DbConnection::Postgres(conn) => conn.close().await,
                DbConnection::MySql(conn) => conn.close().await,
                DbConnection::Sqlite(conn) => conn.close().await,
            }
        };

        match tokio::time::timeout(CLOSE_TIMEOUT, closing).await {
            Ok(Ok(())) => tracing::debug!(engine = %kind, "connection closed"),
            Ok(Err(e)) => tracing::warn!(engine = %kind, error = %e, "connection did not close cleanly"),
            Err(_) => tracing::warn!(engine = %kind, "connection close timed out, dropping handle"),
        }
    }
}

/// Opens a connection for a single request.
///
/// No liveness check is performed; the first failing query is the point of
/// detection. Never retries.
///
/// # Errors
/// - `AppError::Validation` for an empty or unparseable connection string
/// - `AppError::UnsupportedDatabaseType` for an unknown scheme
/// - `AppError::DatabaseConnection` when the database cannot be reached in
///   `timeout` or rejects the session
pub async fn open(connection_string: &str, timeout: Duration) -> AppResult<DbConnection> {
    if connection_string.trim().is_empty() {
        return Err(AppError::Validation("connection string is empty".into()));
    }

    let kind = DbKind::from_connection_string(connection_string)?;
    tracing::debug!(
        engine = %kind,
        database = %redact_connection_string(connection_string),
        "opening connection"
    );
    let connecting = async {
        match kind {
            DbKind::Postgres => PgConnection::connect(connection_string)
                .await
                .map(DbConnection::Postgres),
            DbKind::MySql => MySqlConnection::connect(connection_string)
                .await
                .map(DbConnection::MySql),
            DbKind::Sqlite => match SqliteConnectOptions::from_str(connection_string) {
                Ok(options) => SqliteConnection::connect_with(&options.read_only(true))
                    .await
                    .map(DbConnection::Sqlite),
                Err(e) => Err(e),
            },
        }
    };

    match tokio::time::timeout(timeout, connecting).await {
        Ok(Ok(conn)) => {
            tracing::debug!(engine = %kind, "connection opened");
            Ok(conn)
        }
        Ok(Err(e)) => Err(connect_error(e, connection_string)),
        Err(_) => Err(AppError::DatabaseConnection(format!(
            "timed out after {}s connecting to {} database",
            timeout.as_secs(),
            kind
        ))),
    }
}

fn connect_error(error: sqlx::Error, connection_string: &str) -> AppError {
    let message = scrub(&error.to_string(), connection_string);
    match error {
        sqlx::Error::Configuration(_) => {
            AppError::Validation(format!("invalid connection string: {}", message))
        }
        _ => AppError::DatabaseConnection(message),
    }
}
