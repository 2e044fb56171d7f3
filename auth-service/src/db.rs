//! 用户库连接
//!
//! 启动时按配置重试连接服务自身的 PostgreSQL，数据库容器晚于服务就绪时不会直接退出。

use std::time::Duration;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::utils::{redact_connection_string, scrub};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connects to `DATABASE_URL`, retrying `DB_CONNECT_RETRIES` times.
///
/// # Errors
/// `AppError::Config` when no database URL is configured, otherwise
/// `AppError::DatabaseConnection` with the last (scrubbed) driver error.
pub async fn connect_with_retry(config: &AppConfig) -> AppResult<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL env variable not set".into()))?;
    let attempts = config.db_connect_retries.max(1);
    let interval = Duration::from_secs(config.db_retry_interval_secs);

    let mut last_error = String::new();
    for attempt in 1..=attempts {
        match PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect(url)
            .await
        {
            Ok(pool) => {
                tracing::info!(
                    attempt,
                    database = %redact_connection_string(url),
                    "connected to user database"
                );
                return Ok(pool);
            }
            Err(e) => {
                last_error = scrub(&e.to_string(), url);
                tracing::warn!(
                    attempt,
                    attempts,
                    database = %redact_connection_string(url),
                    error = %last_error,
                    "user database not reachable"
                );
                if attempt < attempts {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }

    Err(AppError::DatabaseConnection(last_error))
}
