//! IAM Access Service - 访问控制服务入口

use std::sync::Arc;

use anyhow::Context;
use axum::{Router, routing::get};
use scopegate_adapter_postgres::{PostgresConfig, check_connection, create_pool};
use scopegate_config::AppConfig;
use scopegate_iam_access::api::router;
use scopegate_iam_access::application::{AuthorizationService, EngineOptions};
use scopegate_iam_access::domain::role::RbacStore;
use scopegate_iam_access::infrastructure::{ColumnMapping, InMemoryRbacStore, PostgresRbacStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());
    let config = AppConfig::load(&config_dir).context("Failed to load configuration")?;

    let metrics_handle = scopegate_telemetry::init(&config.telemetry)?;

    info!(
        app = %config.app_name,
        env = %config.app_env,
        enforce = config.rbac.enforce,
        "Starting IAM Access Service"
    );
    if !config.rbac.enforce {
        warn!("RBAC enforcement is disabled, every check will be allowed");
    }

    // 二进制只返回过滤条件本身; 列映射供嵌入本库、用 push_predicate 拼接 SQL 的调用方使用,
    // 在此校验使错误的列名配置在启动时失败
    let columns = ColumnMapping::try_from(&config.rbac.columns)?;
    info!(?columns, "Filter column mapping loaded");

    let options = EngineOptions::from(&config.rbac);

    let app = match &config.database {
        Some(database) => {
            let pool = create_pool(&PostgresConfig::from(database)).await?;
            check_connection(&pool).await?;
            info!("Connected to PostgreSQL");
            build_app(PostgresRbacStore::new(pool), options)
        }
        None => {
            warn!("No database configured, using an empty in-memory RBAC store");
            build_app(InMemoryRbacStore::new(), options)
        }
    };

    let app = match metrics_handle {
        Some(handle) => app.route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        ),
        None => app,
    };

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("IAM Access Service stopped");
    Ok(())
}

fn build_app<S: RbacStore>(store: S, options: EngineOptions) -> Router {
    router(Arc::new(AuthorizationService::new(Arc::new(store), options)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
