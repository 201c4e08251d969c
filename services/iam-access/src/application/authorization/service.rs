//! 授权检查服务
//!
//! 统一访问控制决策点 (PDP): 单实体决策、列表过滤条件与有效权限自查

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use scopegate_config::RbacConfig;
use serde::Serialize;
use tracing::{debug, instrument};

use super::resolver::PermissionResolver;
use super::scope_evaluator::ScopeEvaluator;
use crate::domain::actor::ActorId;
use crate::domain::authorization::{
    Decision, DecisionEngine, DecisionSource, EffectivePermissions, Evaluation, Predicate,
};
use crate::domain::role::{Permission, PermissionId, RbacStore};
use crate::domain::scope::{ScopeMemberships, TargetDescriptor};
use crate::error::{AccessError, AccessResult};

/// 引擎构造参数
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// 关闭时所有检查直接放行, 过滤条件为 AllowAll
    pub enforce: bool,
    /// 单次存储读取的超时
    pub store_timeout: Duration,
    /// 批量检查的最大并发
    pub batch_concurrency: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            enforce: true,
            store_timeout: Duration::from_secs(2),
            batch_concurrency: 10,
        }
    }
}

impl From<&RbacConfig> for EngineOptions {
    fn from(config: &RbacConfig) -> Self {
        Self {
            enforce: config.enforce,
            store_timeout: config.store_timeout(),
            batch_concurrency: config.batch_concurrency.max(1),
        }
    }
}

/// 授权检查请求
#[derive(Debug, Clone)]
pub struct AuthorizationCheckRequest {
    /// 主体 ID (未解析时为空)
    pub actor_id: Option<ActorId>,
    /// 资源标识
    pub resource: String,
    /// 操作
    pub action: String,
    /// 目标实体 (纯能力检查时为空)
    pub target: Option<TargetDescriptor>,
}

impl AuthorizationCheckRequest {
    pub fn new(
        actor_id: Option<ActorId>,
        resource: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            actor_id,
            resource: resource.into(),
            action: action.into(),
            target: None,
        }
    }

    pub fn with_target(mut self, target: TargetDescriptor) -> Self {
        self.target = Some(target);
        self
    }

    fn validate(&self) -> AccessResult<()> {
        validate_capability(&self.resource, &self.action)
    }
}

/// 资源与操作不能为空
fn validate_capability(resource: &str, action: &str) -> AccessResult<()> {
    if resource.trim().is_empty() || action.trim().is_empty() {
        return Err(AccessError::InvalidRequest(
            "resource and action are required".to_string(),
        ));
    }
    Ok(())
}

/// 授权检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCheckResult {
    /// 是否允许
    pub allowed: bool,
    pub decision: Decision,
    /// 决策来源
    pub decision_source: DecisionSource,
    /// 决定结果的权限
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_permission: Option<PermissionId>,
}

impl From<Evaluation> for AuthorizationCheckResult {
    fn from(evaluation: Evaluation) -> Self {
        Self {
            allowed: evaluation.decision.is_allowed(),
            decision: evaluation.decision,
            decision_source: evaluation.source,
            matched_permission: evaluation.matched_permission,
        }
    }
}

/// 授权服务
///
/// 无状态: 每次调用独立读取存储快照, 可任意并发。
/// 存储不可用时返回 [`AccessError::StoreUnavailable`], 调用方按拒绝处理。
pub struct AuthorizationService<S: RbacStore> {
    resolver: PermissionResolver<S>,
    scope_evaluator: ScopeEvaluator<S>,
    options: EngineOptions,
}

impl<S: RbacStore> AuthorizationService<S> {
    pub fn new(store: Arc<S>, options: EngineOptions) -> Self {
        Self {
            resolver: PermissionResolver::new(store.clone(), options.store_timeout),
            scope_evaluator: ScopeEvaluator::new(store, options.store_timeout),
            options,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// 解析主体在 (resource, action) 上的权限
    pub async fn resolve(
        &self,
        actor: Option<&ActorId>,
        resource: &str,
        action: &str,
    ) -> AccessResult<Vec<Permission>> {
        self.resolver.resolve(actor, resource, action).await
    }

    /// 主体的范围成员关系
    pub async fn scopes_of(&self, actor: Option<&ActorId>) -> AccessResult<ScopeMemberships> {
        self.scope_evaluator.scopes_of(actor).await
    }

    /// 执行授权检查
    #[instrument(
        skip(self, request),
        fields(resource = %request.resource, action = %request.action)
    )]
    pub async fn check(
        &self,
        request: &AuthorizationCheckRequest,
    ) -> AccessResult<AuthorizationCheckResult> {
        let start = Instant::now();

        let result = self.evaluate(request).await.map(AuthorizationCheckResult::from);

        match &result {
            Ok(res) => {
                debug!(
                    actor = ?request.actor_id,
                    allowed = res.allowed,
                    decision_source = %res.decision_source,
                    "Authorization check finished"
                );
                counter!("authorization_checks_total",
                    "source" => res.decision_source.to_string(),
                    "allowed" => res.allowed.to_string()
                )
                .increment(1);
            }
            Err(_) => {
                counter!("authorization_checks_errors_total").increment(1);
            }
        }

        histogram!("authorization_check_duration_ms").record(start.elapsed().as_millis() as f64);

        result
    }

    async fn evaluate(&self, request: &AuthorizationCheckRequest) -> AccessResult<Evaluation> {
        request.validate()?;

        if !self.options.enforce {
            return Ok(Evaluation::enforcement_disabled());
        }

        let actor = request.actor_id.as_ref();
        let permissions = self
            .resolver
            .resolve(actor, &request.resource, &request.action)
            .await?;

        let scopes = if request.target.is_some() && DecisionEngine::needs_memberships(&permissions)
        {
            self.scope_evaluator.scopes_of(actor).await?
        } else {
            ScopeMemberships::new()
        };

        Ok(DecisionEngine::evaluate(
            actor,
            &permissions,
            &scopes,
            request.target.as_ref(),
        ))
    }

    /// 单实体决策 (检查结果的布尔投影)
    pub async fn authorize(
        &self,
        actor: Option<&ActorId>,
        resource: &str,
        action: &str,
        target: Option<&TargetDescriptor>,
    ) -> AccessResult<Decision> {
        let mut request = AuthorizationCheckRequest::new(actor.cloned(), resource, action);
        request.target = target.cloned();
        Ok(self.check(&request).await?.decision)
    }

    /// 批量检查 (并发执行, 结果顺序与请求一致)
    pub async fn batch_check(
        &self,
        requests: &[AuthorizationCheckRequest],
    ) -> AccessResult<Vec<AuthorizationCheckResult>> {
        let checks: Vec<_> = requests.iter().map(|req| self.check(req)).collect();
        let results: Vec<AccessResult<AuthorizationCheckResult>> = stream::iter(checks)
            .buffered(self.options.batch_concurrency.max(1))
            .collect()
            .await;

        results.into_iter().collect()
    }

    /// 构建列表过滤条件, 与逐行调用 [`Self::authorize`] 等价
    #[instrument(skip(self, actor))]
    pub async fn build_filter(
        &self,
        actor: Option<&ActorId>,
        resource: &str,
        action: &str,
    ) -> AccessResult<Predicate> {
        let result = self.predicate_for(actor, resource, action).await;

        match &result {
            Ok(predicate) => {
                debug!(actor = ?actor, kind = predicate.kind(), "Built list filter");
                counter!("authorization_filters_total", "kind" => predicate.kind()).increment(1);
            }
            Err(_) => {
                counter!("authorization_filters_errors_total").increment(1);
            }
        }

        result
    }

    async fn predicate_for(
        &self,
        actor: Option<&ActorId>,
        resource: &str,
        action: &str,
    ) -> AccessResult<Predicate> {
        validate_capability(resource, action)?;

        if !self.options.enforce {
            return Ok(Predicate::AllowAll);
        }

        let permissions = self.resolver.resolve(actor, resource, action).await?;
        let scopes = if DecisionEngine::needs_memberships(&permissions) {
            self.scope_evaluator.scopes_of(actor).await?
        } else {
            ScopeMemberships::new()
        };

        Ok(DecisionEngine::build_predicate(actor, &permissions, &scopes))
    }

    /// 主体的全部有效权限 (不做允许/拒绝判断)
    pub async fn effective_permissions(
        &self,
        actor: Option<&ActorId>,
    ) -> AccessResult<EffectivePermissions> {
        let Some(actor) = actor else {
            return Ok(EffectivePermissions::anonymous());
        };

        let role_ids = self.resolver.role_ids(actor).await?;
        let roles = self.resolver.role_names(&role_ids).await?;
        let permissions = self.resolver.reachable(&role_ids).await?;
        let scopes = if permissions.iter().any(|p| p.scope.is_membership_scoped()) {
            self.scope_evaluator.scopes_of(Some(actor)).await?
        } else {
            ScopeMemberships::new()
        };

        Ok(EffectivePermissions::build(
            actor.clone(),
            roles,
            &permissions,
            &scopes,
        ))
    }
}
