//! 权限解析器
//!
//! 主体 → 角色 → 权限, 按 (resource, action) 过滤

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, error, warn};

use crate::domain::actor::ActorId;
use crate::domain::role::{Permission, PermissionId, PermissionRecord, RbacStore, RoleId};
use crate::error::{AccessError, AccessResult};

/// 带超时的存储读取; 超时视为存储不可用
pub(crate) async fn bounded<T, F>(timeout: Duration, lookup: &'static str, fut: F) -> AccessResult<T>
where
    F: Future<Output = AccessResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!(lookup, error = %e, "RBAC store lookup failed");
            counter!("rbac_store_errors_total", "lookup" => lookup).increment(1);
            Err(e)
        }
        Err(_) => {
            error!(lookup, timeout_ms = timeout.as_millis() as u64, "RBAC store lookup timed out");
            counter!("rbac_store_errors_total", "lookup" => lookup).increment(1);
            Err(AccessError::store_unavailable(format!(
                "{} timed out after {}ms",
                lookup,
                timeout.as_millis()
            )))
        }
    }
}

/// 校验存储记录; 未知的范围种类或效果记为异常并跳过, 不参与任何决策
fn validate(records: Vec<PermissionRecord>) -> Vec<Permission> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.id.clone();
            match Permission::try_from(record) {
                Ok(permission) => Some(permission),
                Err(e) => {
                    let reason = match e {
                        AccessError::UnknownScopeKind(_) => "unknown_scope_kind",
                        AccessError::UnknownEffect(_) => "unknown_effect",
                        _ => "invalid",
                    };
                    warn!(permission_id = %id, error = %e, "Ignoring malformed permission");
                    counter!("rbac_permission_anomalies_total", "reason" => reason).increment(1);
                    None
                }
            }
        })
        .collect()
}

fn dedup<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items.dedup();
    items
}

pub struct PermissionResolver<S: RbacStore> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S: RbacStore> PermissionResolver<S> {
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// 主体绑定的角色 ID (去重)
    pub async fn role_ids(&self, actor: &ActorId) -> AccessResult<Vec<RoleId>> {
        let ids = bounded(
            self.timeout,
            "user_roles",
            self.store.find_role_ids_by_user(actor),
        )
        .await?;
        Ok(dedup(ids))
    }

    /// 角色名称
    pub async fn role_names(&self, role_ids: &[RoleId]) -> AccessResult<Vec<String>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }
        let roles = bounded(self.timeout, "roles", self.store.find_roles_by_ids(role_ids)).await?;
        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    async fn records_for_roles(&self, role_ids: &[RoleId]) -> AccessResult<Vec<PermissionRecord>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let permission_ids: Vec<PermissionId> = dedup(
            bounded(
                self.timeout,
                "role_permissions",
                self.store.find_permission_ids_by_roles(role_ids),
            )
            .await?,
        );
        if permission_ids.is_empty() {
            return Ok(Vec::new());
        }

        bounded(
            self.timeout,
            "permissions",
            self.store.find_permissions_by_ids(&permission_ids),
        )
        .await
    }

    /// 解析主体在 (resource, action) 上的权限
    ///
    /// 未解析的主体返回空集合; 多个角色持有同一权限时按并集处理。
    pub async fn resolve(
        &self,
        actor: Option<&ActorId>,
        resource: &str,
        action: &str,
    ) -> AccessResult<Vec<Permission>> {
        let Some(actor) = actor else {
            return Ok(Vec::new());
        };

        let role_ids = self.role_ids(actor).await?;
        let records: Vec<PermissionRecord> = self
            .records_for_roles(&role_ids)
            .await?
            .into_iter()
            .filter(|record| record.matches(resource, action))
            .collect();

        let permissions = validate(records);
        debug!(
            actor = %actor,
            resource,
            action,
            roles = role_ids.len(),
            permissions = permissions.len(),
            "Resolved permissions"
        );
        Ok(permissions)
    }

    /// 给定角色下可达的全部权限 (不按资源过滤)
    pub async fn reachable(&self, role_ids: &[RoleId]) -> AccessResult<Vec<Permission>> {
        let records = self.records_for_roles(role_ids).await?;
        Ok(validate(records))
    }
}
