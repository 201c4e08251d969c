//! 列表过滤条件
//!
//! 与具体查询 API 无关的声明式表达式, 由各存储后端翻译为自身的过滤语法。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::scope::TargetDescriptor;
use crate::error::AccessResult;

/// 可用于过滤的目标字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetField {
    Id,
    CountryId,
    ProvinceId,
}

impl TargetField {
    /// 从目标投影中取出该字段的值
    pub fn value_of<'a>(&self, target: &'a TargetDescriptor) -> Option<&'a str> {
        match self {
            TargetField::Id => target.id(),
            TargetField::CountryId => target.country_id(),
            TargetField::ProvinceId => target.province_id(),
        }
    }
}

/// `field IN ids`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIn {
    pub field: TargetField,
    pub ids: BTreeSet<String>,
}

impl FieldIn {
    pub fn new<I, T>(field: TargetField, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            field,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, target: &TargetDescriptor) -> bool {
        self.field
            .value_of(target)
            .is_some_and(|value| self.ids.contains(value))
    }
}

/// 过滤条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Predicate {
    DenyAll,
    AllowAll,
    Or { clauses: Vec<FieldIn> },
}

impl Predicate {
    /// 在内存中对单行求值
    pub fn matches(&self, target: &TargetDescriptor) -> bool {
        match self {
            Predicate::DenyAll => false,
            Predicate::AllowAll => true,
            Predicate::Or { clauses } => clauses.iter().any(|clause| clause.matches(target)),
        }
    }

    /// 存储不可用时按 DenyAll 处理
    pub fn fail_closed(result: &AccessResult<Predicate>) -> Predicate {
        match result {
            Ok(predicate) => predicate.clone(),
            Err(_) => Predicate::DenyAll,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Predicate::DenyAll => "deny_all",
            Predicate::AllowAll => "allow_all",
            Predicate::Or { .. } => "or",
        }
    }
}
