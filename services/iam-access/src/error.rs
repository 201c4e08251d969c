use scopegate_errors::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    /// 角色/权限/范围存储读取失败 (超时、连接错误)
    #[error("Permission store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Unknown scope kind: {0}")]
    UnknownScopeKind(String),
    #[error("Unknown permission effect: {0}")]
    UnknownEffect(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AccessError {
    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// 是否为基础设施故障 (调用方应返回 503 而不是 403)
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

impl From<AccessError> for AppError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::StoreUnavailable(msg) => AppError::Unavailable(msg),
            AccessError::UnknownScopeKind(_) | AccessError::UnknownEffect(_) => {
                AppError::Internal(error.to_string())
            }
            AccessError::InvalidRequest(msg) => AppError::Validation(msg),
        }
    }
}

pub type AccessResult<T> = Result<T, AccessError>;
