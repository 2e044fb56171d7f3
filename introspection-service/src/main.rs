//! 数据库自省服务
//!
//! 根据请求时提供的连接字符串，对任意关系型数据库进行结构与数据自省：
//! - 列出当前 schema 的所有表
//! - 列出指定表的列及声明类型
//! - 导出指定表的全部行数据
//!
//! 每个请求独立建立连接，用完即关，不缓存任何结构或数据。

mod catalog;
mod connector;
#[cfg(test)]
mod engine_tests;
mod handlers;
mod mapper;
mod models;
mod routes;
mod rows;
mod service;
mod state;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use axum::{middleware, routing::get, Json, Router};
use common::config::{load_dotenv, AppConfig};
use common::middleware::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "introspection-service";
const DEFAULT_PORT: u16 = 8082;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "自省服务 API",
        version = "0.1.0",
        description = "数据库结构与数据自省微服务"
    ),
    paths(
        handlers::get_all_tables,
        handlers::get_columns_from_table,
        handlers::get_all_rows_from_table,
        handlers::health_check,
    ),
    components(schemas(
        common::models::TableResponse,
        common::models::ColumnResponse,
        handlers::HealthResponse,
    )),
    tags(
        (name = "introspection", description = "数据库自省端点"),
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

    let state = AppState::new(config.clone());
    let app = create_router(state);

    // 启动服务
    let addr = config.bind_addr();
    info!(
        service = SERVICE_NAME,
        address = %addr,
        connect_timeout_secs = config.connect_timeout_secs,
        query_timeout_secs = config.query_timeout_secs,
        allow_sqlite = config.allow_sqlite,
        "启动服务"
    );

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
