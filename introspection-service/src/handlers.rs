//! Handler模块
//!
//! 连接字符串与表名通过请求头传入，处理器只做校验与转发，
//! 所有数据库访问都在 [`crate::service::IntrospectionService`] 中完成。

use std::time::Instant;

use axum::{extract::State, http::HeaderMap, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use common::errors::{AppError, AppResult};
use common::middleware::{AuthUser, RequestId};
use common::models::{ColumnResponse, RowResponse, TableRequest, TableResponse, TablesRequest};
use common::response::ApiResponse;

use crate::service::IntrospectionServiceTrait;
use crate::state::AppState;
use crate::SERVICE_NAME;

/// 连接字符串请求头
pub const CONNECTION_STRING_HEADER: &str = "connection-string";
/// 表名请求头
pub const TABLE_NAME_HEADER: &str = "table-name";

/// 健康检查响应
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// 列出数据库中的所有表
#[utoipa::path(
    get,
    path = "/db-dashboards/api/v1/postgres/tables",
    tag = "introspection",
    params(
        ("connection-string" = String, Header, description = "目标数据库连接字符串")
    ),
    responses(
        (status = 200, description = "表列表", body = ApiResponse<Vec<TableResponse>>),
        (status = 400, description = "缺少或无效的连接字符串"),
        (status = 401, description = "未认证"),
        (status = 502, description = "目标数据库连接或查询失败")
    )
)]
pub async fn get_all_tables(
    State(state): State<AppState>,
    user: AuthUser,
    request_id: RequestId,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<Vec<TableResponse>>>> {
    let started = Instant::now();
    let req = TablesRequest {
        connection_string: header_value(&headers, CONNECTION_STRING_HEADER)?,
    };
    req.validate()?;

    tracing::debug!(user_id = user.id, "listing tables");
    let data = state.introspection.get_all_tables(&req.connection_string).await?;
    Ok(Json(respond(data, &request_id, started)))
}

/// 列出指定表的所有列
#[utoipa::path(
    get,
    path = "/db-dashboards/api/v1/postgres/columns",
    tag = "introspection",
    params(
        ("connection-string" = String, Header, description = "目标数据库连接字符串"),
        ("table-name" = String, Header, description = "表名（区分大小写）")
    ),
    responses(
        (status = 200, description = "列列表", body = ApiResponse<Vec<ColumnResponse>>),
        (status = 400, description = "缺少请求头"),
        (status = 401, description = "未认证"),
        (status = 404, description = "表不存在"),
        (status = 502, description = "目标数据库连接或查询失败")
    )
)]
pub async fn get_columns_from_table(
    State(state): State<AppState>,
    user: AuthUser,
    request_id: RequestId,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<Vec<ColumnResponse>>>> {
    let started = Instant::now();
    let req = table_request(&headers)?;

    tracing::debug!(user_id = user.id, table = %req.table_name, "listing columns");
    let data = state
        .introspection
        .get_columns_from_table(&req.connection_string, &req.table_name)
        .await?;
    Ok(Json(respond(data, &request_id, started)))
}

/// 读取指定表的全部数据
#[utoipa::path(
    get,
    path = "/db-dashboards/api/v1/postgres/data",
    tag = "introspection",
    params(
        ("connection-string" = String, Header, description = "目标数据库连接字符串"),
        ("table-name" = String, Header, description = "表名（区分大小写）")
    ),
    responses(
        (status = 200, description = "行数据（按列顺序的对象数组）", body = Object),
        (status = 400, description = "缺少请求头"),
        (status = 401, description = "未认证"),
        (status = 404, description = "表不存在"),
        (status = 502, description = "目标数据库连接或查询失败"),
        (status = 504, description = "查询超时")
    )
)]
pub async fn get_all_rows_from_table(
    State(state): State<AppState>,
    user: AuthUser,
    request_id: RequestId,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<Vec<RowResponse>>>> {
    let started = Instant::now();
    let req = table_request(&headers)?;

    tracing::debug!(user_id = user.id, table = %req.table_name, "reading rows");
    let data = state
        .introspection
        .get_all_rows_from_table(&req.connection_string, &req.table_name)
        .await?;
    Ok(Json(respond(data, &request_id, started)))
}

/// 健康检查
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

fn respond<T: Serialize>(data: T, request_id: &RequestId, started: Instant) -> ApiResponse<T> {
    ApiResponse::ok_with_service(data, SERVICE_NAME)
        .with_request_id(request_id.as_str())
        .with_duration(started.elapsed().as_millis() as u64)
}

fn table_request(headers: &HeaderMap) -> AppResult<TableRequest> {
    let req = TableRequest {
        connection_string: header_value(headers, CONNECTION_STRING_HEADER)?,
        table_name: header_value(headers, TABLE_NAME_HEADER)?,
    };
    req.validate()?;
    Ok(req)
}

/// Missing headers read as empty and are rejected by validation.
fn header_value(headers: &HeaderMap, name: &str) -> AppResult<String> {
    match headers.get(name) {
        Some(value) => value
            .to_str()
            .map(str::to_owned)
            .map_err(|_| AppError::Validation(format!("{} header is not valid text", name))),
        None => Ok(String::new()),
    }
}
