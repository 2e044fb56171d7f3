//! 自省服务路由模块

use axum::{middleware, routing::get, Router};
use common::config::JwtConfig;
use common::middleware::auth_middleware;

use crate::handlers;
use crate::state::AppState;

/// 自省接口前缀
pub const API_PREFIX: &str = "/db-dashboards/api/v1/postgres";

/// 创建自省路由，`/tables`、`/columns`、`/data` 需要 Bearer Token
pub fn router(jwt: JwtConfig) -> Router<AppState> {
    let protected = Router::new()
        .route("/tables", get(handlers::get_all_tables))
        .route("/columns", get(handlers::get_columns_from_table))
        .route("/data", get(handlers::get_all_rows_from_table))
        .route_layer(middleware::from_fn_with_state(jwt, auth_middleware));

    Router::new()
        .nest(API_PREFIX, protected)
        .route("/api/health", get(handlers::health_check))
}
