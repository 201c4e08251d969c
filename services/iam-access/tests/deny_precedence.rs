//! DENY 优先
//!
//! 任意 ALLOW 组合中只要混入一条匹配的 DENY, 不论其范围种类与位置,
//! 逐行决策都是 Deny, 列表过滤条件都是 `DenyAll`。

use std::sync::Arc;

use proptest::prelude::*;
use scopegate_iam_access::application::{
    AuthorizationCheckRequest, AuthorizationService, EngineOptions,
};
use scopegate_iam_access::domain::actor::ActorId;
use scopegate_iam_access::domain::authorization::{
    Decision, DecisionEngine, DecisionSource, Predicate,
};
use scopegate_iam_access::domain::role::{Permission, PermissionId, PermissionRecord};
use scopegate_iam_access::domain::scope::{Effect, ScopeKind, ScopeMemberships, TargetDescriptor};
use scopegate_iam_access::infrastructure::InMemoryRbacStore;

const SCOPES: [&str; 4] = ["GLOBAL", "COUNTRY", "PROVINCE", "SELF"];
const DENY_ID: &str = "deny";

fn scope_kind(raw: &str) -> ScopeKind {
    raw.parse().unwrap()
}

fn scope_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(SCOPES.to_vec())
}

fn target_strategy() -> impl Strategy<Value = TargetDescriptor> {
    (
        prop::option::of(prop::sample::select(vec!["U1", "U2"])),
        prop::option::of(prop::sample::select(vec!["C1", "C2"])),
        prop::option::of(prop::sample::select(vec!["P1", "P2"])),
    )
        .prop_map(|(id, country_id, province_id)| TargetDescriptor {
            id: id.map(String::from),
            country_id: country_id.map(String::from),
            province_id: province_id.map(String::from),
        })
}

/// ALLOW 列表, 在 `position` 处插入一条 DENY
fn with_deny(allows: &[&'static str], deny_scope: &'static str, position: usize) -> Vec<Permission> {
    let mut permissions: Vec<Permission> = allows
        .iter()
        .enumerate()
        .map(|(i, scope)| {
            Permission::new(format!("p{}", i), "USER", "VIEW", scope_kind(scope), Effect::Allow)
        })
        .collect();
    let deny = Permission::new(DENY_ID, "USER", "VIEW", scope_kind(deny_scope), Effect::Deny);
    permissions.insert(position.min(permissions.len()), deny);
    permissions
}

/// U1 持有全部成员范围, 最容易被放行
fn generous_scopes() -> ScopeMemberships {
    let mut scopes = ScopeMemberships::new();
    for (kind, id) in [("COUNTRY", "C1"), ("COUNTRY", "C2"), ("PROVINCE", "P1"), ("PROVINCE", "P2")] {
        scopes.insert(scope_kind(kind), id.to_string());
    }
    scopes
}

fn store(permissions: &[Permission]) -> InMemoryRbacStore {
    let mut store = InMemoryRbacStore::new().with_role("r1", "Generated").assign("U1", "r1");
    for permission in permissions {
        let effect = if permission.is_deny() { "DENY" } else { "ALLOW" };
        store = store
            .with_permission(PermissionRecord::new(
                permission.id.to_string(),
                "USER",
                "VIEW",
                permission.scope.as_str(),
                effect,
            ))
            .grant("r1", permission.id.to_string());
    }
    for (kind, id) in [("COUNTRY", "C1"), ("COUNTRY", "C2"), ("PROVINCE", "P1"), ("PROVINCE", "P2")] {
        store = store.with_scope("U1", kind, id);
    }
    store
}

proptest! {
    #[test]
    fn single_deny_overrides_any_allows(
        allows in prop::collection::vec(scope_strategy(), 0..6),
        deny_scope in scope_strategy(),
        position in 0usize..7,
        actor in prop::option::of(prop::sample::select(vec!["U1", "U2"]).prop_map(ActorId::new)),
        rows in prop::collection::vec(target_strategy(), 1..6),
    ) {
        let permissions = with_deny(&allows, deny_scope, position);
        let scopes = generous_scopes();

        let predicate = DecisionEngine::build_predicate(actor.as_ref(), &permissions, &scopes);
        prop_assert_eq!(&predicate, &Predicate::DenyAll);

        let targets = rows.iter().map(Some).chain(std::iter::once(None));
        for target in targets {
            let evaluation = DecisionEngine::evaluate(actor.as_ref(), &permissions, &scopes, target);
            prop_assert_eq!(evaluation.decision, Decision::Deny, "target {:?}", target);
            prop_assert_eq!(evaluation.source, DecisionSource::DenyRule);
            prop_assert_eq!(evaluation.matched_permission, Some(PermissionId::new(DENY_ID)));
        }
    }

    #[test]
    fn single_deny_overrides_any_allows_through_store(
        allows in prop::collection::vec(scope_strategy(), 0..6),
        deny_scope in scope_strategy(),
        position in 0usize..7,
        rows in prop::collection::vec(target_strategy(), 1..6),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let permissions = with_deny(&allows, deny_scope, position);
        let service = AuthorizationService::new(Arc::new(store(&permissions)), EngineOptions::default());
        let actor = ActorId::new("U1");

        runtime.block_on(async {
            let predicate = service.build_filter(Some(&actor), "USER", "VIEW").await.unwrap();
            prop_assert_eq!(predicate, Predicate::DenyAll);

            for row in &rows {
                let request = AuthorizationCheckRequest::new(Some(actor.clone()), "USER", "VIEW")
                    .with_target(row.clone());
                let result = service.check(&request).await.unwrap();
                prop_assert!(!result.allowed, "row {:?}", row);
                prop_assert_eq!(result.decision_source, DecisionSource::DenyRule);
            }
            Ok(())
        })?;
    }
}
