//! Handler模块

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::errors::AppError;
use common::middleware::{AuthUser, RequestId};
use common::models::{ListUsersQuery, LoginRequest, RegisterRequest, TokenResponse, UserResponse};
use common::response::{ApiResponse, PaginatedData};

use crate::state::AppState;
use crate::SERVICE_NAME;

/// 健康检查响应
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// 注册新用户
#[utoipa::path(
    post,
    path = "/db-dashboards/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "注册成功", body = ApiResponse<UserResponse>),
        (status = 400, description = "邮箱或密码格式错误"),
        (status = 409, description = "邮箱已被注册")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = state.auth.register(req).await?;
    Ok(Json(
        ApiResponse::ok_with_service(user, SERVICE_NAME).with_request_id(request_id.as_str()),
    ))
}

/// 登录并获取访问令牌
#[utoipa::path(
    post,
    path = "/db-dashboards/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "登录成功", body = ApiResponse<TokenResponse>),
        (status = 401, description = "邮箱或密码错误")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, AppError> {
    let token = state.auth.login(req).await?;
    Ok(Json(
        ApiResponse::ok_with_service(token, SERVICE_NAME).with_request_id(request_id.as_str()),
    ))
}

/// 获取当前登录用户
#[utoipa::path(
    get,
    path = "/db-dashboards/api/v1/users/me",
    tag = "users",
    responses(
        (status = 200, description = "当前用户", body = ApiResponse<UserResponse>),
        (status = 401, description = "未认证")
    )
)]
pub async fn current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let data = state.auth.get_user(user.id).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE_NAME)))
}

/// 根据 ID 获取用户
#[utoipa::path(
    get,
    path = "/db-dashboards/api/v1/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "用户 ID")
    ),
    responses(
        (status = 200, description = "用户详情", body = ApiResponse<UserResponse>),
        (status = 401, description = "未认证"),
        (status = 404, description = "用户不存在")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let data = state.auth.get_user(id).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE_NAME)))
}

/// 分页列出用户
#[utoipa::path(
    get,
    path = "/db-dashboards/api/v1/users",
    tag = "users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "用户列表", body = ApiResponse<PaginatedData<UserResponse>>),
        (status = 400, description = "分页参数无效"),
        (status = 401, description = "未认证")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<PaginatedData<UserResponse>>>, AppError> {
    let data = state.auth.list_users(query).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE_NAME)))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}
