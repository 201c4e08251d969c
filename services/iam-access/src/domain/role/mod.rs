//! RBAC 角色权限领域模块

#![allow(clippy::module_inception)]

pub mod permission;
pub mod repository;
pub mod role;

pub use permission::{Permission, PermissionId, PermissionRecord};
pub use repository::{
    PermissionRepository, RbacStore, RolePermissionRepository, RoleRepository, UserRoleRepository,
    UserScopeRepository,
};
pub use role::{Role, RoleId, RolePermission, UserRole, UserScope};
