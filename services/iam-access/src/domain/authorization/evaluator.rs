//! 鉴权决策引擎

use serde::Serialize;

use super::predicate::{FieldIn, Predicate, TargetField};
use crate::domain::actor::ActorId;
use crate::domain::role::{Permission, PermissionId};
use crate::domain::scope::{ScopeKind, ScopeMemberships, TargetDescriptor};
use crate::error::AccessResult;

/// 决策结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        *self == Decision::Allow
    }

    /// 存储不可用时按 Deny 处理
    pub fn fail_closed(result: &AccessResult<Decision>) -> Decision {
        match result {
            Ok(decision) => *decision,
            Err(_) => Decision::Deny,
        }
    }
}

/// 决策来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionSource {
    /// 未启用鉴权, 直接放行
    EnforcementDisabled,
    /// GLOBAL 许可
    Global,
    /// SELF 许可 (目标即主体本人)
    #[serde(rename = "SELF")]
    SelfScope,
    /// COUNTRY 许可
    Country,
    /// PROVINCE 许可
    Province,
    /// 存在 DENY 权限
    DenyRule,
    /// 默认拒绝
    DefaultDeny,
}

impl std::fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DecisionSource::EnforcementDisabled => "ENFORCEMENT_DISABLED",
            DecisionSource::Global => "GLOBAL",
            DecisionSource::SelfScope => "SELF",
            DecisionSource::Country => "COUNTRY",
            DecisionSource::Province => "PROVINCE",
            DecisionSource::DenyRule => "DENY_RULE",
            DecisionSource::DefaultDeny => "DEFAULT_DENY",
        };
        f.write_str(name)
    }
}

/// 单次评估的结果及其依据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: Decision,
    pub source: DecisionSource,
    /// 决定结果的权限 (默认拒绝时为空)
    pub matched_permission: Option<PermissionId>,
}

impl Evaluation {
    fn allow(source: DecisionSource, permission: &Permission) -> Self {
        Self {
            decision: Decision::Allow,
            source,
            matched_permission: Some(permission.id.clone()),
        }
    }

    fn deny_by(permission: &Permission) -> Self {
        Self {
            decision: Decision::Deny,
            source: DecisionSource::DenyRule,
            matched_permission: Some(permission.id.clone()),
        }
    }

    fn default_deny() -> Self {
        Self {
            decision: Decision::Deny,
            source: DecisionSource::DefaultDeny,
            matched_permission: None,
        }
    }

    pub(crate) fn enforcement_disabled() -> Self {
        Self {
            decision: Decision::Allow,
            source: DecisionSource::EnforcementDisabled,
            matched_permission: None,
        }
    }
}

/// 决策引擎
///
/// 输入是已经按 (resource, action) 过滤过的权限集合。
/// 使用 Deny-Override: 任何 DENY 都优先于所有 ALLOW, 与范围和顺序无关。
pub struct DecisionEngine;

impl DecisionEngine {
    /// 单实体决策
    ///
    /// 算法:
    /// 1. 无权限 → 拒绝
    /// 2. 存在 DENY → 拒绝
    /// 3. 存在 GLOBAL ALLOW → 允许
    /// 4. 无目标 → 拒绝
    /// 5. SELF ALLOW 且目标 ID 等于主体 → 允许
    /// 6. COUNTRY ALLOW 且目标国家属于主体的 COUNTRY 范围 → 允许
    /// 7. PROVINCE ALLOW 且目标省份属于主体的 PROVINCE 范围 → 允许
    /// 8. 默认拒绝
    pub fn evaluate(
        actor: Option<&ActorId>,
        permissions: &[Permission],
        scopes: &ScopeMemberships,
        target: Option<&TargetDescriptor>,
    ) -> Evaluation {
        if let Some(deny) = permissions.iter().find(|p| p.is_deny()) {
            return Evaluation::deny_by(deny);
        }

        if let Some(global) = Self::first_allow(permissions, ScopeKind::Global) {
            return Evaluation::allow(DecisionSource::Global, global);
        }

        let Some(target) = target else {
            return Evaluation::default_deny();
        };

        if let (Some(actor), Some(target_id)) = (actor, target.id()) {
            if target_id == actor.as_str() {
                if let Some(own) = Self::first_allow(permissions, ScopeKind::SelfOnly) {
                    return Evaluation::allow(DecisionSource::SelfScope, own);
                }
            }
        }

        if let Some(country) = target.country_id() {
            if scopes.contains(ScopeKind::Country, country) {
                if let Some(p) = Self::first_allow(permissions, ScopeKind::Country) {
                    return Evaluation::allow(DecisionSource::Country, p);
                }
            }
        }

        if let Some(province) = target.province_id() {
            if scopes.contains(ScopeKind::Province, province) {
                if let Some(p) = Self::first_allow(permissions, ScopeKind::Province) {
                    return Evaluation::allow(DecisionSource::Province, p);
                }
            }
        }

        Evaluation::default_deny()
    }

    /// 构建与 [`DecisionEngine::evaluate`] 逐行等价的过滤条件
    ///
    /// SELF 许可翻译为 `id IN {actor}`, 保证主体本人所在行与单实体决策一致。
    pub fn build_predicate(
        actor: Option<&ActorId>,
        permissions: &[Permission],
        scopes: &ScopeMemberships,
    ) -> Predicate {
        if permissions.is_empty() || permissions.iter().any(Permission::is_deny) {
            return Predicate::DenyAll;
        }

        if Self::first_allow(permissions, ScopeKind::Global).is_some() {
            return Predicate::AllowAll;
        }

        let mut clauses = Vec::new();

        if let Some(actor) = actor {
            if Self::first_allow(permissions, ScopeKind::SelfOnly).is_some() {
                clauses.push(FieldIn::new(TargetField::Id, [actor.as_str()]));
            }
        }

        for (kind, field) in [
            (ScopeKind::Country, TargetField::CountryId),
            (ScopeKind::Province, TargetField::ProvinceId),
        ] {
            let ids = scopes.ids(kind);
            if !ids.is_empty() && Self::first_allow(permissions, kind).is_some() {
                clauses.push(FieldIn::new(field, ids.iter().cloned()));
            }
        }

        if clauses.is_empty() {
            Predicate::DenyAll
        } else {
            Predicate::Or { clauses }
        }
    }

    /// 决策是否需要读取主体的范围成员关系
    pub fn needs_memberships(permissions: &[Permission]) -> bool {
        !permissions.iter().any(Permission::is_deny)
            && Self::first_allow(permissions, ScopeKind::Global).is_none()
            && permissions
                .iter()
                .any(|p| p.is_allow() && p.scope.is_membership_scoped())
    }

    fn first_allow(permissions: &[Permission], kind: ScopeKind) -> Option<&Permission> {
        permissions
            .iter()
            .find(|p| p.is_allow() && p.scope == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scope::Effect;

    fn perm(id: &str, scope: ScopeKind, effect: Effect) -> Permission {
        Permission::new(id, "USER", "VIEW", scope, effect)
    }

    fn actor(id: &str) -> ActorId {
        ActorId::new(id)
    }

    #[test]
    fn test_default_deny_without_permissions() {
        let result = DecisionEngine::evaluate(
            Some(&actor("U1")),
            &[],
            &ScopeMemberships::new(),
            Some(&TargetDescriptor::new("x")),
        );
        assert_eq!(result.decision, Decision::Deny);
        assert_eq!(result.source, DecisionSource::DefaultDeny);
        assert_eq!(
            DecisionEngine::build_predicate(Some(&actor("U1")), &[], &ScopeMemberships::new()),
            Predicate::DenyAll
        );
    }

    #[test]
    fn test_global_allow_ignores_target() {
        let perms = vec![perm("p1", ScopeKind::Global, Effect::Allow)];
        let target = TargetDescriptor::new("x").with_country("ZZ");

        let result =
            DecisionEngine::evaluate(Some(&actor("U1")), &perms, &ScopeMemberships::new(), Some(&target));
        assert_eq!(result.decision, Decision::Allow);
        assert_eq!(result.source, DecisionSource::Global);
        assert_eq!(result.matched_permission, Some(PermissionId::new("p1")));

        // 纯能力检查 (无目标) 也允许
        let result = DecisionEngine::evaluate(Some(&actor("U1")), &perms, &ScopeMemberships::new(), None);
        assert!(result.decision.is_allowed());

        // 目标缺少国家/省份也允许
        let result = DecisionEngine::evaluate(
            Some(&actor("U1")),
            &perms,
            &ScopeMemberships::new(),
            Some(&TargetDescriptor::default()),
        );
        assert!(result.decision.is_allowed());
    }

    #[test]
    fn test_deny_overrides_any_allow() {
        let scopes = ScopeMemberships::new().with(ScopeKind::Country, "C1");
        let target = TargetDescriptor::new("U1").with_country("C1");

        // DENY 的范围与目标无关, 顺序也无关
        for perms in [
            vec![
                perm("allow", ScopeKind::Global, Effect::Allow),
                perm("deny", ScopeKind::Global, Effect::Deny),
            ],
            vec![
                perm("deny", ScopeKind::Province, Effect::Deny),
                perm("allow", ScopeKind::Global, Effect::Allow),
                perm("self", ScopeKind::SelfOnly, Effect::Allow),
            ],
            vec![
                perm("country", ScopeKind::Country, Effect::Allow),
                perm("deny", ScopeKind::SelfOnly, Effect::Deny),
            ],
        ] {
            let result = DecisionEngine::evaluate(Some(&actor("U1")), &perms, &scopes, Some(&target));
            assert_eq!(result.decision, Decision::Deny);
            assert_eq!(result.source, DecisionSource::DenyRule);
            assert_eq!(result.matched_permission, Some(PermissionId::new("deny")));
            assert_eq!(
                DecisionEngine::build_predicate(Some(&actor("U1")), &perms, &scopes),
                Predicate::DenyAll
            );
        }
    }

    #[test]
    fn test_self_scope() {
        let perms = vec![Permission::new("p1", "USER", "UPDATE", ScopeKind::SelfOnly, Effect::Allow)];
        let scopes = ScopeMemberships::new();

        let own = DecisionEngine::evaluate(Some(&actor("U1")), &perms, &scopes, Some(&TargetDescriptor::new("U1")));
        assert_eq!(own.decision, Decision::Allow);
        assert_eq!(own.source, DecisionSource::SelfScope);

        let other = DecisionEngine::evaluate(Some(&actor("U1")), &perms, &scopes, Some(&TargetDescriptor::new("U2")));
        assert_eq!(other.decision, Decision::Deny);

        // 无目标时 SELF 不生效
        let capability = DecisionEngine::evaluate(Some(&actor("U1")), &perms, &scopes, None);
        assert_eq!(capability.decision, Decision::Deny);

        // 未解析的主体不会匹配任何目标
        let anonymous = DecisionEngine::evaluate(None, &perms, &scopes, Some(&TargetDescriptor::new("U1")));
        assert_eq!(anonymous.decision, Decision::Deny);
    }

    #[test]
    fn test_country_scope() {
        let perms = vec![perm("p1", ScopeKind::Country, Effect::Allow)];
        let scopes = ScopeMemberships::new().with(ScopeKind::Country, "C1");
        let evaluate = |target: TargetDescriptor| {
            DecisionEngine::evaluate(Some(&actor("U1")), &perms, &scopes, Some(&target)).decision
        };

        assert_eq!(evaluate(TargetDescriptor::new("x").with_country("C1")), Decision::Allow);
        assert_eq!(evaluate(TargetDescriptor::new("x").with_country("C2")), Decision::Deny);
        assert_eq!(evaluate(TargetDescriptor::new("x")), Decision::Deny);
    }

    #[test]
    fn test_province_scope_and_membership_without_grant() {
        let scopes = ScopeMemberships::new()
            .with(ScopeKind::Country, "C1")
            .with(ScopeKind::Province, "P1");
        let target = TargetDescriptor::new("x").with_country("C1").with_province("P1");

        // 只有 PROVINCE 许可: 国家成员关系不起作用
        let perms = vec![perm("p1", ScopeKind::Province, Effect::Allow)];
        let result = DecisionEngine::evaluate(Some(&actor("U1")), &perms, &scopes, Some(&target));
        assert_eq!(result.source, DecisionSource::Province);

        let other_province = TargetDescriptor::new("y").with_country("C1").with_province("P2");
        let result = DecisionEngine::evaluate(Some(&actor("U1")), &perms, &scopes, Some(&other_province));
        assert_eq!(result.decision, Decision::Deny);
    }

    #[test]
    fn test_scoped_grant_without_membership_is_inert() {
        let perms = vec![perm("p1", ScopeKind::Country, Effect::Allow)];
        let target = TargetDescriptor::new("x").with_country("C1");

        let result =
            DecisionEngine::evaluate(Some(&actor("U1")), &perms, &ScopeMemberships::new(), Some(&target));
        assert_eq!(result.decision, Decision::Deny);
        assert_eq!(
            DecisionEngine::build_predicate(Some(&actor("U1")), &perms, &ScopeMemberships::new()),
            Predicate::DenyAll
        );
    }

    #[test]
    fn test_build_predicate_collects_scoped_clauses() {
        let perms = vec![
            perm("p1", ScopeKind::Country, Effect::Allow),
            perm("p2", ScopeKind::Country, Effect::Allow),
            perm("p3", ScopeKind::Province, Effect::Allow),
            perm("p4", ScopeKind::SelfOnly, Effect::Allow),
        ];
        let scopes = ScopeMemberships::new()
            .with(ScopeKind::Country, "C1")
            .with(ScopeKind::Country, "C2")
            .with(ScopeKind::Province, "P1");

        let predicate = DecisionEngine::build_predicate(Some(&actor("U1")), &perms, &scopes);
        assert_eq!(
            predicate,
            Predicate::Or {
                clauses: vec![
                    FieldIn::new(TargetField::Id, ["U1"]),
                    FieldIn::new(TargetField::CountryId, ["C1", "C2"]),
                    FieldIn::new(TargetField::ProvinceId, ["P1"]),
                ]
            }
        );
    }

    #[test]
    fn test_build_predicate_global_allows_all() {
        let perms = vec![
            perm("p1", ScopeKind::Country, Effect::Allow),
            perm("p2", ScopeKind::Global, Effect::Allow),
        ];
        assert_eq!(
            DecisionEngine::build_predicate(None, &perms, &ScopeMemberships::new()),
            Predicate::AllowAll
        );
    }

    #[test]
    fn test_needs_memberships() {
        assert!(!DecisionEngine::needs_memberships(&[]));
        assert!(!DecisionEngine::needs_memberships(&[perm("p", ScopeKind::Global, Effect::Allow)]));
        assert!(!DecisionEngine::needs_memberships(&[perm("p", ScopeKind::SelfOnly, Effect::Allow)]));
        assert!(DecisionEngine::needs_memberships(&[perm("p", ScopeKind::Province, Effect::Allow)]));
        assert!(!DecisionEngine::needs_memberships(&[
            perm("p", ScopeKind::Country, Effect::Allow),
            perm("d", ScopeKind::Country, Effect::Deny),
        ]));
    }
}
