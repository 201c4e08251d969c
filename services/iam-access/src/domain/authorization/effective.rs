//! 有效权限投影 (用于 "我能做什么" 自查)

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::actor::ActorId;
use crate::domain::role::Permission;
use crate::domain::scope::{Effect, ScopeKind, ScopeMemberships};

/// 单条有效权限
///
/// COUNTRY/PROVINCE 携带主体在该种类下的范围 ID (可能为空, 即不生效);
/// GLOBAL/SELF 不携带。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermission {
    pub resource: String,
    pub action: String,
    pub scope: ScopeKind,
    pub effect: Effect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope_ids: Option<BTreeSet<String>>,
}

impl EffectivePermission {
    pub fn project(permission: &Permission, scopes: &ScopeMemberships) -> Self {
        let scope_ids = permission
            .scope
            .is_membership_scoped()
            .then(|| scopes.ids(permission.scope).clone());

        Self {
            resource: permission.resource.clone(),
            action: permission.action.clone(),
            scope: permission.scope,
            effect: permission.effect,
            scope_ids,
        }
    }

    /// 持有权限定义但没有对应范围授予
    pub fn is_inert(&self) -> bool {
        self.scope_ids.as_ref().is_some_and(BTreeSet::is_empty)
    }
}

/// 主体的全部有效权限
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectivePermissions {
    pub actor_id: Option<ActorId>,
    /// 角色名称 (排序、去重)
    pub roles: Vec<String>,
    pub permissions: Vec<EffectivePermission>,
}

impl EffectivePermissions {
    /// 未解析主体: 没有任何权限
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn build(
        actor_id: ActorId,
        roles: impl IntoIterator<Item = String>,
        permissions: &[Permission],
        scopes: &ScopeMemberships,
    ) -> Self {
        let roles: BTreeSet<String> = roles.into_iter().collect();
        let permissions: BTreeSet<EffectivePermission> = permissions
            .iter()
            .map(|p| EffectivePermission::project(p, scopes))
            .collect();

        Self {
            actor_id: Some(actor_id),
            roles: roles.into_iter().collect(),
            permissions: permissions.into_iter().collect(),
        }
    }
}
