//! 认证服务模块

use std::sync::Arc;

use validator::Validate;

use common::config::JwtConfig;
use common::errors::{AppError, AppResult};
use common::models::{ListUsersQuery, LoginRequest, RegisterRequest, TokenResponse, UserResponse};
use common::response::PaginatedData;
use common::utils::{issue_token, Claims};

use crate::password::{hash_password, verify_dummy, verify_password};
use crate::repository::UserRepository;

/// 用户注册、登录与查询服务
pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    jwt: JwtConfig,
}

impl AuthService {
    /// 创建新的认证服务实例
    pub fn new(repo: Arc<dyn UserRepository>, jwt: JwtConfig) -> Self {
        Self { repo, jwt }
    }

    /// 注册新用户
    pub async fn register(&self, req: RegisterRequest) -> AppResult<UserResponse> {
        req.validate()?;
        let email = normalize_email(&req.email);

        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::UserAlreadyExists(email));
        }

        let hashed = hash_password(req.password).await?;
        // The unique index still guards against a concurrent registration.
        let user = self.repo.create(&email, &hashed).await?;

        tracing::info!(user_id = user.id, "user registered");
        Ok(user.into())
    }

    /// 校验凭据并签发访问令牌
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, req: LoginRequest) -> AppResult<TokenResponse> {
        req.validate()?;
        let email = normalize_email(&req.email);

        let Some(user) = self.repo.find_by_email(&email).await? else {
            verify_dummy(req.password).await?;
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(req.password, user.hashed_password.clone()).await? {
            tracing::warn!(user_id = user.id, "login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let claims = Claims::new(user.id, &user.email, &self.jwt.audience, self.jwt.ttl_secs);
        let token = issue_token(&claims, &self.jwt)?;

        tracing::info!(user_id = user.id, "user logged in");
        Ok(TokenResponse::bearer(token, self.jwt.ttl_secs))
    }

    /// 根据 ID 获取用户
    pub async fn get_user(&self, id: i64) -> AppResult<UserResponse> {
        self.repo
            .find_by_id(id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// 分页列出用户
    pub async fn list_users(&self, query: ListUsersQuery) -> AppResult<PaginatedData<UserResponse>> {
        query.validate()?;

        let total = self.repo.count().await?;
        let users = self
            .repo
            .list(u64::from(query.page_size), query.offset())
            .await?;

        Ok(PaginatedData::new(
            users.into_iter().map(UserResponse::from).collect(),
            query.page,
            query.page_size,
            total,
        ))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
