//! 应用层模块

pub mod authorization;

pub use authorization::{
    AuthorizationCheckRequest, AuthorizationCheckResult, AuthorizationService, EngineOptions,
    PermissionResolver, ScopeEvaluator,
};
