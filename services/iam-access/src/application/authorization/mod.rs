//! 授权应用层模块

pub mod resolver;
pub mod scope_evaluator;
pub mod service;

pub use resolver::PermissionResolver;
pub use scope_evaluator::ScopeEvaluator;
pub use service::{
    AuthorizationCheckRequest, AuthorizationCheckResult, AuthorizationService, EngineOptions,
};
