//! 路由模块

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use common::config::JwtConfig;
use common::middleware::auth_middleware;

use crate::handlers;
use crate::state::AppState;

/// 接口前缀
pub const API_PREFIX: &str = "/db-dashboards/api/v1";

/// 注册与登录公开，用户查询需要 Bearer Token
pub fn router(jwt: JwtConfig) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login));

    let protected = Router::new()
        .route("/users", get(handlers::list_users))
        .route("/users/me", get(handlers::current_user))
        .route("/users/{id}", get(handlers::get_user))
        .route_layer(middleware::from_fn_with_state(jwt, auth_middleware));

    Router::new()
        .nest(API_PREFIX, public.merge(protected))
        .route("/api/health", get(handlers::health_check))
}
