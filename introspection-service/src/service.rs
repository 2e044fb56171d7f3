//! 数据库自省服务模块
//!
//! 每次调用独立打开一个连接，执行一次目录或数据查询后关闭，
//! 不在请求之间缓存或复用任何连接与结构信息。

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::{ColumnResponse, RowResponse, TableResponse};

use crate::connector::{self, DbConnection, DbKind};
use crate::{catalog, mapper, rows};

/// 自省服务 Trait
#[async_trait]
pub trait IntrospectionServiceTrait: Send + Sync {
    /// 列出当前 schema 的所有表
    async fn get_all_tables(&self, connection_string: &str) -> AppResult<Vec<TableResponse>>;

    /// 列出指定表的所有列
    async fn get_columns_from_table(
        &self,
        connection_string: &str,
        table_name: &str,
    ) -> AppResult<Vec<ColumnResponse>>;

    /// 读取指定表的全部数据
    async fn get_all_rows_from_table(
        &self,
        connection_string: &str,
        table_name: &str,
    ) -> AppResult<Vec<RowResponse>>;
}

/// 数据库自省服务
#[derive(Debug, Clone)]
pub struct IntrospectionService {
    connect_timeout: Duration,
    query_timeout: Duration,
    allow_sqlite: bool,
}

impl IntrospectionService {
    /// 创建新的自省服务实例
    pub fn new(connect_timeout: Duration, query_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            query_timeout,
            allow_sqlite: false,
        }
    }

    /// 从应用配置创建
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.connect_timeout(), config.query_timeout())
            .allow_sqlite(config.allow_sqlite)
    }

    /// 是否接受 `sqlite:` 连接串（默认关闭）
    pub fn allow_sqlite(mut self, allow: bool) -> Self {
        self.allow_sqlite = allow;
        self
    }

    /// Runs one reader operation under the query deadline.
    async fn within_deadline<T>(
        &self,
        query: impl Future<Output = AppResult<T>> + Send,
    ) -> AppResult<T> {
        tokio::time::timeout(self.query_timeout, query)
            .await
            .unwrap_or_else(|_| Err(AppError::QueryTimeout(self.query_timeout.as_secs())))
    }

    async fn open(&self, connection_string: &str) -> AppResult<DbConnection> {
        // A sqlite URL names a file on this host, not a remote server.
        if !self.allow_sqlite
            && DbKind::from_connection_string(connection_string)? == DbKind::Sqlite
        {
            tracing::warn!("rejected sqlite connection string, sqlite is disabled");
            return Err(AppError::UnsupportedDatabaseType(DbKind::Sqlite.to_string()));
        }
        connector::open(connection_string, self.connect_timeout).await
    }
}

fn require(value: &str, what: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", what)));
    }
    Ok(())
}

#[async_trait]
impl IntrospectionServiceTrait for IntrospectionService {
    async fn get_all_tables(&self, connection_string: &str) -> AppResult<Vec<TableResponse>> {
        let connection_string = connection_string.trim();
        require(connection_string, "connection string")?;

        let started = Instant::now();
        let mut conn = self.open(connection_string).await?;
        let result = self.within_deadline(catalog::list_tables(&mut conn)).await;
        conn.close().await;
        let tables = result?;

        tracing::info!(
            tables = tables.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tables listed"
        );
        Ok(tables.into_iter().map(TableResponse::from).collect())
    }

    async fn get_columns_from_table(
        &self,
        connection_string: &str,
        table_name: &str,
    ) -> AppResult<Vec<ColumnResponse>> {
        let connection_string = connection_string.trim();
        require(connection_string, "connection string")?;
        require(table_name, "table name")?;

        let mut conn = self.open(connection_string).await?;
        let result = self
            .within_deadline(catalog::list_columns(&mut conn, table_name))
            .await;
        conn.close().await;
        let columns = result?;

        tracing::info!(table = %table_name, columns = columns.len(), "columns listed");
        Ok(columns.into_iter().map(ColumnResponse::from).collect())
    }

    async fn get_all_rows_from_table(
        &self,
        connection_string: &str,
        table_name: &str,
    ) -> AppResult<Vec<RowResponse>> {
        let connection_string = connection_string.trim();
        require(connection_string, "connection string")?;
        require(table_name, "table name")?;

        let started = Instant::now();
        let mut conn = self.open(connection_string).await?;
        let result = self
            .within_deadline(rows::list_rows(&mut conn, table_name))
            .await;
        conn.close().await;
        let rows = result?;

        tracing::info!(
            table = %table_name,
            rows = rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rows read"
        );
        Ok(rows.into_iter().map(mapper::row_to_json).collect())
    }
}
