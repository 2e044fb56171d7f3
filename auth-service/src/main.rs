//! 认证服务
//!
//! 提供用户注册、登录与 JWT 令牌签发，签发的令牌用于访问自省服务：
//! - 用户注册（Argon2id 密码哈希）
//! - 登录并签发访问令牌
//! - 用户查询

mod db;
mod handlers;
mod password;
mod repository;
mod routes;
mod service;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig};
use common::middleware::request_id_middleware;
use repository::PgUserRepository;
use state::AppState;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "auth-service";
const DEFAULT_PORT: u16 = 8081;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "认证服务 API",
        version = "0.1.0",
        description = "用户注册、登录与令牌签发微服务"
    ),
    paths(
        handlers::register,
        handlers::login,
        handlers::current_user,
        handlers::get_user,
        handlers::list_users,
        handlers::health_check,
    ),
    components(schemas(
        common::models::RegisterRequest,
        common::models::LoginRequest,
        common::models::TokenResponse,
        common::models::UserResponse,
        handlers::HealthResponse,
    )),
    tags(
        (name = "auth", description = "注册与登录端点"),
        (name = "users", description = "用户查询端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let config = AppConfig::load_with_service(SERVICE_NAME, DEFAULT_PORT)
        .context("failed to load configuration")?;

    // 用户库（启动时重试连接）
    let pool = db::connect_with_retry(&config)
        .await
        .context("failed to connect to user database")?;
    let repo = PgUserRepository::new(pool);
    repo.ensure_table().await.context("failed to prepare user table")?;
    password::prepare_dummy_hash()
        .await
        .context("failed to prepare password hasher")?;

    let state = AppState::new(config.clone(), Arc::new(repo));
    let app = create_router(state);

    // 启动服务
    let addr = config.bind_addr();
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!(service = SERVICE_NAME, "服务已停止");
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router(state.config.jwt.clone()))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::warn!("Ctrl+C received, starting graceful shutdown"),
        () = terminate => tracing::warn!("SIGTERM received, starting graceful shutdown"),
    }
}
