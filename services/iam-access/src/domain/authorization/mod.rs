//! 鉴权决策领域模块
//!
//! 纯函数实现: 给定已解析的权限与范围成员关系, 计算单实体决策或列表过滤条件。

pub mod effective;
pub mod evaluator;
pub mod predicate;

pub use effective::{EffectivePermission, EffectivePermissions};
pub use evaluator::{Decision, DecisionEngine, DecisionSource, Evaluation};
pub use predicate::{FieldIn, Predicate, TargetField};
