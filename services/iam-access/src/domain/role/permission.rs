//! 权限实体

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::domain::scope::{Effect, ScopeKind, eq_ignore_case};
use crate::error::AccessError;

/// 权限 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
#[display("{_0}")]
#[serde(transparent)]
pub struct PermissionId(pub String);

impl PermissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// 存储中的权限记录
///
/// `scope`/`effect` 保持存储中的原始字符串, 由 [`Permission::try_from`] 校验。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub id: PermissionId,
    pub resource: String,
    pub action: String,
    pub scope: String,
    pub effect: String,
}

impl PermissionRecord {
    pub fn new(
        id: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        scope: impl Into<String>,
        effect: impl Into<String>,
    ) -> Self {
        Self {
            id: PermissionId::new(id),
            resource: resource.into(),
            action: action.into(),
            scope: scope.into(),
            effect: effect.into(),
        }
    }

    /// 资源和操作是否匹配 (忽略大小写)
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        eq_ignore_case(&self.resource, resource) && eq_ignore_case(&self.action, action)
    }
}

/// 权限实体
///
/// 对某个资源执行某个操作的许可或拒绝, 例如 USER/VIEW
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    /// 资源标识 (如 "USER")
    pub resource: String,
    /// 操作标识 (如 "VIEW", "UPDATE")
    pub action: String,
    pub scope: ScopeKind,
    pub effect: Effect,
}

impl Permission {
    pub fn new(
        id: impl Into<String>,
        resource: impl Into<String>,
        action: impl Into<String>,
        scope: ScopeKind,
        effect: Effect,
    ) -> Self {
        Self {
            id: PermissionId::new(id),
            resource: resource.into(),
            action: action.into(),
            scope,
            effect,
        }
    }

    /// 检查是否匹配资源和操作 (忽略大小写)
    pub fn matches(&self, resource: &str, action: &str) -> bool {
        eq_ignore_case(&self.resource, resource) && eq_ignore_case(&self.action, action)
    }

    pub fn is_allow(&self) -> bool {
        self.effect == Effect::Allow
    }

    pub fn is_deny(&self) -> bool {
        self.effect == Effect::Deny
    }
}

impl TryFrom<PermissionRecord> for Permission {
    type Error = AccessError;

    fn try_from(record: PermissionRecord) -> Result<Self, Self::Error> {
        let scope = record.scope.parse::<ScopeKind>()?;
        let effect = record.effect.parse::<Effect>()?;
        Ok(Self {
            id: record.id,
            resource: record.resource,
            action: record.action,
            scope,
            effect,
        })
    }
}
