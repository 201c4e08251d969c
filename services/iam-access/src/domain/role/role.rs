//! 角色实体及关联记录

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use super::permission::PermissionId;
use crate::domain::actor::ActorId;

/// 角色 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From)]
#[display("{_0}")]
#[serde(transparent)]
pub struct RoleId(pub String);

impl RoleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// 角色实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

impl Role {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: RoleId::new(id),
            name: name.into(),
        }
    }
}

/// 角色-权限关联
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
}

/// 用户-角色关联
///
/// 一个主体可同时持有多个角色, 有效权限为所有角色权限的并集
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub user_id: ActorId,
    pub role_id: RoleId,
}

/// 用户范围成员关系
///
/// `scope_type` 保持存储中的原始字符串, 解析时未知种类会被忽略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserScope {
    pub user_id: ActorId,
    pub scope_type: String,
    pub scope_id: String,
}

impl UserScope {
    pub fn new(
        user_id: ActorId,
        scope_type: impl Into<String>,
        scope_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            scope_type: scope_type.into(),
            scope_id: scope_id.into(),
        }
    }
}
