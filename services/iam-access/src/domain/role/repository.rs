//! RBAC 存储接口
//!
//! 角色、权限与范围由外部管理工具维护, 引擎只读取。

use async_trait::async_trait;

use super::permission::{PermissionId, PermissionRecord};
use super::role::{Role, RoleId, UserScope};
use crate::domain::actor::ActorId;
use crate::error::AccessResult;

/// 用户角色关联仓储接口
#[async_trait]
pub trait UserRoleRepository: Send + Sync {
    /// 获取用户绑定的所有角色 ID
    async fn find_role_ids_by_user(&self, user_id: &ActorId) -> AccessResult<Vec<RoleId>>;
}

/// 角色仓储接口
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// 根据多个 ID 批量查找角色
    async fn find_roles_by_ids(&self, ids: &[RoleId]) -> AccessResult<Vec<Role>>;
}

/// 角色权限关联仓储接口
#[async_trait]
pub trait RolePermissionRepository: Send + Sync {
    /// 获取多个角色绑定的权限 ID (可能重复)
    async fn find_permission_ids_by_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AccessResult<Vec<PermissionId>>;
}

/// 权限仓储接口
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// 根据多个 ID 批量查找权限
    async fn find_permissions_by_ids(
        &self,
        ids: &[PermissionId],
    ) -> AccessResult<Vec<PermissionRecord>>;
}

/// 用户范围仓储接口
#[async_trait]
pub trait UserScopeRepository: Send + Sync {
    /// 获取用户的所有范围成员关系
    async fn find_scopes_by_user(&self, user_id: &ActorId) -> AccessResult<Vec<UserScope>>;
}

/// 鉴权引擎所需的全部读取接口
pub trait RbacStore:
    UserRoleRepository
    + RoleRepository
    + RolePermissionRepository
    + PermissionRepository
    + UserScopeRepository
    + 'static
{
}

impl<T> RbacStore for T where
    T: UserRoleRepository
        + RoleRepository
        + RolePermissionRepository
        + PermissionRepository
        + UserScopeRepository
        + 'static
{
}
