//! 数据库错误映射
//!
//! 引擎只读取 RBAC 表, 任何读取失败都意味着无法做出可信决策,
//! 统一映射为存储不可用。

use crate::error::AccessError;

/// 将 SQLx 错误转换为 AccessError
pub fn map_sqlx_error(e: sqlx::Error) -> AccessError {
    match e {
        sqlx::Error::PoolTimedOut => {
            AccessError::store_unavailable("Database connection pool timeout")
        }
        sqlx::Error::PoolClosed => {
            AccessError::store_unavailable("Database connection pool is closed")
        }
        sqlx::Error::Database(db_err) => match db_err.code() {
            Some(code) => {
                AccessError::store_unavailable(format!("Database error ({}): {}", code, db_err))
            }
            None => AccessError::store_unavailable(db_err.to_string()),
        },
        sqlx::Error::Protocol(msg) => {
            AccessError::store_unavailable(format!("Database protocol error: {}", msg))
        }
        _ => AccessError::store_unavailable(e.to_string()),
    }
}
