//! 用户仓储模块

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use common::errors::{AppError, AppResult};
use common::models::UserResponse;

/// Row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// 用户仓储 Trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户，邮箱重复时返回 `UserAlreadyExists`
    async fn create(&self, email: &str, hashed_password: &str) -> AppResult<User>;

    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// 按创建时间分页列出用户
    async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<User>>;

    /// 用户总数
    async fn count(&self) -> AppResult<u64>;
}

/// PostgreSQL 用户仓储
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the users table if it does not exist.
    pub async fn ensure_table(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id              BIGSERIAL    PRIMARY KEY,
                email           TEXT         NOT NULL UNIQUE,
                hashed_password TEXT         NOT NULL,
                created_at      TIMESTAMPTZ  NOT NULL DEFAULT now(),
                updated_at      TIMESTAMPTZ  NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseQuery(format!("Failed to create users table: {}", e)))?;

        tracing::info!("Table `users` ensured");
        Ok(())
    }
}

fn query_error(e: sqlx::Error) -> AppError {
    AppError::DatabaseQuery(e.to_string())
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, email: &str, hashed_password: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, hashed_password) VALUES ($1, $2) \
             RETURNING id, email, hashed_password, created_at, updated_at",
        )
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::UserAlreadyExists(email.to_string())
            }
            other => query_error(other),
        })
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, hashed_password, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, hashed_password, created_at, updated_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, email, hashed_password, created_at, updated_at FROM users \
             ORDER BY created_at, id LIMIT $1 OFFSET $2",
        )
        .bind(to_i64(limit))
        .bind(to_i64(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn count(&self) -> AppResult<u64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}

/// In-memory repository used by the service and HTTP tests.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: tokio::sync::RwLock<Vec<User>>,
}

#[cfg(test)]
#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, email: &str, hashed_password: &str) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::UserAlreadyExists(email.to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: users.len() as i64 + 1,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.email == email).cloned())
    }

    async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.users.read().await.len() as u64)
    }
}
