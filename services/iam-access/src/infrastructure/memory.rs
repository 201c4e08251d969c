//! 内存 RBAC 存储
//!
//! 用于测试以及未配置数据库时的本地运行。构建后只读。

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::actor::ActorId;
use crate::domain::role::{
    PermissionId, PermissionRecord, PermissionRepository, Role, RoleId, RolePermission,
    RolePermissionRepository, RoleRepository, UserRole, UserRoleRepository, UserScope,
    UserScopeRepository,
};
use crate::error::AccessResult;

#[derive(Debug, Clone, Default)]
pub struct InMemoryRbacStore {
    roles: HashMap<RoleId, Role>,
    permissions: HashMap<PermissionId, PermissionRecord>,
    role_permissions: Vec<RolePermission>,
    user_roles: Vec<UserRole>,
    user_scopes: Vec<UserScope>,
}

impl InMemoryRbacStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        let role = Role::new(id, name);
        self.roles.insert(role.id.clone(), role);
        self
    }

    pub fn with_permission(mut self, record: PermissionRecord) -> Self {
        self.permissions.insert(record.id.clone(), record);
        self
    }

    /// 把权限授予角色
    pub fn grant(mut self, role_id: impl Into<String>, permission_id: impl Into<String>) -> Self {
        self.role_permissions.push(RolePermission {
            role_id: RoleId::new(role_id),
            permission_id: PermissionId::new(permission_id),
        });
        self
    }

    /// 把角色分配给用户
    pub fn assign(mut self, user_id: impl Into<String>, role_id: impl Into<String>) -> Self {
        self.user_roles.push(UserRole {
            user_id: ActorId::new(user_id),
            role_id: RoleId::new(role_id),
        });
        self
    }

    pub fn with_scope(
        mut self,
        user_id: impl Into<String>,
        scope_type: impl Into<String>,
        scope_id: impl Into<String>,
    ) -> Self {
        self.user_scopes
            .push(UserScope::new(ActorId::new(user_id), scope_type, scope_id));
        self
    }
}

#[async_trait]
impl UserRoleRepository for InMemoryRbacStore {
    async fn find_role_ids_by_user(&self, user_id: &ActorId) -> AccessResult<Vec<RoleId>> {
        Ok(self
            .user_roles
            .iter()
            .filter(|ur| &ur.user_id == user_id)
            .map(|ur| ur.role_id.clone())
            .collect())
    }
}

#[async_trait]
impl RoleRepository for InMemoryRbacStore {
    async fn find_roles_by_ids(&self, ids: &[RoleId]) -> AccessResult<Vec<Role>> {
        Ok(ids.iter().filter_map(|id| self.roles.get(id).cloned()).collect())
    }
}

#[async_trait]
impl RolePermissionRepository for InMemoryRbacStore {
    async fn find_permission_ids_by_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AccessResult<Vec<PermissionId>> {
        Ok(self
            .role_permissions
            .iter()
            .filter(|rp| role_ids.contains(&rp.role_id))
            .map(|rp| rp.permission_id.clone())
            .collect())
    }
}

#[async_trait]
impl PermissionRepository for InMemoryRbacStore {
    async fn find_permissions_by_ids(
        &self,
        ids: &[PermissionId],
    ) -> AccessResult<Vec<PermissionRecord>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.permissions.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl UserScopeRepository for InMemoryRbacStore {
    async fn find_scopes_by_user(&self, user_id: &ActorId) -> AccessResult<Vec<UserScope>> {
        Ok(self
            .user_scopes
            .iter()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect())
    }
}
