//! PostgreSQL RBAC 存储实现
//!
//! 只读访问 `user_roles`、`roles`、`role_permissions`、`permissions`、`user_scope`。

use async_trait::async_trait;
use sqlx::PgPool;

use super::error_mapper::map_sqlx_error;
use crate::domain::actor::ActorId;
use crate::domain::role::{
    PermissionId, PermissionRecord, PermissionRepository, Role, RoleId,
    RolePermissionRepository, RoleRepository, UserRoleRepository, UserScope, UserScopeRepository,
};
use crate::error::AccessResult;

#[derive(Clone)]
pub struct PostgresRbacStore {
    pool: PgPool,
}

impl PostgresRbacStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRoleRepository for PostgresRbacStore {
    async fn find_role_ids_by_user(&self, user_id: &ActorId) -> AccessResult<Vec<RoleId>> {
        let ids: Vec<String> =
            sqlx::query_scalar("SELECT role_id FROM user_roles WHERE user_id = $1")
                .bind(user_id.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(ids.into_iter().map(RoleId).collect())
    }
}

#[async_trait]
impl RoleRepository for PostgresRbacStore {
    async fn find_roles_by_ids(&self, ids: &[RoleId]) -> AccessResult<Vec<Role>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_strs: Vec<String> = ids.iter().map(|id| id.0.clone()).collect();
        let rows = sqlx::query_as::<_, RoleRow>("SELECT id, name FROM roles WHERE id = ANY($1)")
            .bind(&id_strs)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Role::from).collect())
    }
}

#[async_trait]
impl RolePermissionRepository for PostgresRbacStore {
    async fn find_permission_ids_by_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AccessResult<Vec<PermissionId>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_strs: Vec<String> = role_ids.iter().map(|id| id.0.clone()).collect();
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT permission_id FROM role_permissions WHERE role_id = ANY($1)",
        )
        .bind(&id_strs)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(ids.into_iter().map(PermissionId).collect())
    }
}

#[async_trait]
impl PermissionRepository for PostgresRbacStore {
    async fn find_permissions_by_ids(
        &self,
        ids: &[PermissionId],
    ) -> AccessResult<Vec<PermissionRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let id_strs: Vec<String> = ids.iter().map(|id| id.0.clone()).collect();
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, resource, action, scope, effect
            FROM permissions
            WHERE id = ANY($1)
            "#,
        )
        .bind(&id_strs)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PermissionRecord::from).collect())
    }
}

#[async_trait]
impl UserScopeRepository for PostgresRbacStore {
    async fn find_scopes_by_user(&self, user_id: &ActorId) -> AccessResult<Vec<UserScope>> {
        let rows = sqlx::query_as::<_, UserScopeRow>(
            "SELECT scope_type, scope_id FROM user_scope WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| UserScope::new(user_id.clone(), row.scope_type, row.scope_id))
            .collect())
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: String,
    name: String,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role::new(row.id, row.name)
    }
}

#[derive(sqlx::FromRow)]
struct PermissionRow {
    id: String,
    resource: String,
    action: String,
    scope: String,
    effect: String,
}

impl From<PermissionRow> for PermissionRecord {
    fn from(row: PermissionRow) -> Self {
        PermissionRecord::new(row.id, row.resource, row.action, row.scope, row.effect)
    }
}

#[derive(sqlx::FromRow)]
struct UserScopeRow {
    scope_type: String,
    scope_id: String,
}
