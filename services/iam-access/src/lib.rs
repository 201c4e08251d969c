//! 基于范围的访问控制引擎
//!
//! 主体通过角色获得权限, 每条权限带有范围种类 (GLOBAL / COUNTRY / PROVINCE / SELF)
//! 和效果 (ALLOW / DENY)。引擎对单个实体给出允许/拒绝决策, 为列表查询给出等价的
//! 过滤条件, 并能列出主体的全部有效权限。

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::{AuthorizationCheckRequest, AuthorizationCheckResult, AuthorizationService, EngineOptions};
pub use domain::authorization::{Decision, DecisionEngine, DecisionSource, EffectivePermissions, Predicate};
pub use error::{AccessError, AccessResult};
