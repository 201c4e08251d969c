//! 范围求值器

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::warn;

use super::resolver::bounded;
use crate::domain::actor::ActorId;
use crate::domain::role::{RbacStore, UserScope};
use crate::domain::scope::{ScopeKind, ScopeMemberships};
use crate::error::AccessResult;

pub struct ScopeEvaluator<S: RbacStore> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S: RbacStore> ScopeEvaluator<S> {
    pub fn new(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// 主体的范围成员关系, 按种类分组
    pub async fn scopes_of(&self, actor: Option<&ActorId>) -> AccessResult<ScopeMemberships> {
        let Some(actor) = actor else {
            return Ok(ScopeMemberships::new());
        };

        let rows = bounded(self.timeout, "user_scopes", self.store.find_scopes_by_user(actor)).await?;
        Ok(group(rows))
    }
}

/// 按种类分组; 未知种类记为异常并忽略
fn group(rows: Vec<UserScope>) -> ScopeMemberships {
    let mut memberships = ScopeMemberships::new();
    for row in rows {
        match row.scope_type.parse::<ScopeKind>() {
            Ok(kind) => memberships.insert(kind, row.scope_id),
            Err(e) => {
                warn!(user_id = %row.user_id, error = %e, "Ignoring user scope with unknown kind");
                counter!("rbac_permission_anomalies_total", "reason" => "unknown_user_scope_kind")
                    .increment(1);
            }
        }
    }
    memberships
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryRbacStore;

    #[tokio::test]
    async fn test_scopes_grouped_by_kind() {
        let store = InMemoryRbacStore::new()
            .with_scope("U1", "COUNTRY", "C1")
            .with_scope("U1", "country", "C2")
            .with_scope("U1", "PROVINCE", "P1")
            .with_scope("U1", "DISTRICT", "D1")
            .with_scope("U2", "COUNTRY", "C9");
        let evaluator = ScopeEvaluator::new(Arc::new(store), Duration::from_secs(1));

        let scopes = evaluator.scopes_of(Some(&ActorId::new("U1"))).await.unwrap();
        assert_eq!(scopes.ids(ScopeKind::Country).len(), 2);
        assert!(scopes.contains(ScopeKind::Province, "P1"));
        assert!(!scopes.contains(ScopeKind::Country, "C9"));
        assert!(scopes.ids(ScopeKind::Global).is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_actor_has_no_scopes() {
        let evaluator = ScopeEvaluator::new(Arc::new(InMemoryRbacStore::new()), Duration::from_secs(1));
        assert!(evaluator.scopes_of(None).await.unwrap().is_empty());
    }
}
