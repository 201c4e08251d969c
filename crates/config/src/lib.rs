//! scopegate-config - 配置加载库

use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

/// 环境变量前缀, 嵌套字段用 `__` 分隔 (如 `SCOPEGATE_RBAC__ENFORCE=false`)
pub const ENV_PREFIX: &str = "SCOPEGATE_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    // 开发环境: 10, 生产环境: 50
    match std::env::var("APP_ENV").as_deref() {
        Ok("production") => 50,
        _ => 10,
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 是否输出 JSON 日志
    #[serde(default)]
    pub json: bool,
    /// 是否安装 Prometheus recorder
    #[serde(default)]
    pub metrics: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
            metrics: false,
        }
    }
}

/// RBAC 鉴权配置
///
/// 作为显式参数传入鉴权引擎; `enforce = false` 时所有检查直接放行。
#[derive(Debug, Clone, Deserialize)]
pub struct RbacConfig {
    #[serde(default = "default_enforce")]
    pub enforce: bool,
    /// 单次存储读取的超时 (毫秒), 超时按存储不可用处理
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// 批量检查的最大并发
    #[serde(default = "default_batch_concurrency")]
    pub batch_concurrency: usize,
    /// 列表过滤时目标实体的列名
    #[serde(default)]
    pub columns: ColumnConfig,
}

fn default_enforce() -> bool {
    true
}

fn default_store_timeout_ms() -> u64 {
    2000
}

fn default_batch_concurrency() -> usize {
    10
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            enforce: default_enforce(),
            store_timeout_ms: default_store_timeout_ms(),
            batch_concurrency: default_batch_concurrency(),
            columns: ColumnConfig::default(),
        }
    }
}

impl RbacConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// 过滤条件翻译为 SQL 时使用的列名
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ColumnConfig {
    #[serde(default = "default_id_column")]
    pub id: String,
    #[serde(default = "default_country_column")]
    pub country_id: String,
    #[serde(default = "default_province_column")]
    pub province_id: String,
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_country_column() -> String {
    "country_id".to_string()
}

fn default_province_column() -> String {
    "province_id".to_string()
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            id: default_id_column(),
            country_id: default_country_column(),
            province_id: default_province_column(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub rbac: RbacConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        Ok(Self::figment(config_dir).extract()?)
    }

    /// 配置来源: `default.toml` < `{APP_ENV}.toml` < 环境变量
    pub fn figment(config_dir: &str) -> Figment {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
