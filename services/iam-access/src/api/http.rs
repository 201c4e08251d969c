//! HTTP 接口
//!
//! 主体 ID 由上游身份层写入 `x-actor-id` 请求头; 缺失或为空视为未解析主体。

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use scopegate_errors::AppError;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::application::{AuthorizationCheckRequest, AuthorizationCheckResult, AuthorizationService};
use crate::domain::actor::ActorId;
use crate::domain::authorization::{EffectivePermissions, Predicate};
use crate::domain::role::RbacStore;
use crate::domain::scope::TargetDescriptor;
use crate::error::AccessError;

pub const ACTOR_HEADER: &str = "x-actor-id";

/// 批量检查的最大条数
const MAX_BATCH_SIZE: usize = 100;

/// 请求主体
#[derive(Debug, Clone)]
pub struct Actor(pub Option<ActorId>);

impl<St> FromRequestParts<St> for Actor
where
    St: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok());
        Ok(Actor(ActorId::parse(raw)))
    }
}

/// 错误响应 (RFC 7807)
#[derive(Debug)]
pub struct ApiError(AppError);

impl From<AppError> for ApiError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

impl From<AccessError> for ApiError {
    fn from(error: AccessError) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (status, Json(self.0.to_problem_details())).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeBody {
    pub resource: String,
    pub action: String,
    #[serde(default)]
    pub target: Option<TargetDescriptor>,
}

impl AuthorizeBody {
    fn into_request(self, actor: Option<ActorId>) -> AuthorizationCheckRequest {
        AuthorizationCheckRequest {
            actor_id: actor,
            resource: self.resource,
            action: self.action,
            target: self.target,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchAuthorizeBody {
    pub checks: Vec<AuthorizeBody>,
}

#[derive(Debug, Serialize)]
pub struct BatchAuthorizeResponse {
    pub results: Vec<AuthorizationCheckResult>,
}

#[derive(Debug, Deserialize)]
pub struct FilterBody {
    pub resource: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn router<S: RbacStore>(service: Arc<AuthorizationService<S>>) -> Router {
    Router::new()
        .route("/api/v1/me/permissions", get(my_permissions::<S>))
        .route("/api/v1/authorize", post(authorize::<S>))
        .route("/api/v1/authorize/batch", post(batch_authorize::<S>))
        .route("/api/v1/filter", post(filter::<S>))
        .with_state(service)
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn my_permissions<S: RbacStore>(
    State(service): State<Arc<AuthorizationService<S>>>,
    Actor(actor): Actor,
) -> ApiResult<EffectivePermissions> {
    let effective = service.effective_permissions(actor.as_ref()).await?;
    Ok(Json(effective))
}

async fn authorize<S: RbacStore>(
    State(service): State<Arc<AuthorizationService<S>>>,
    Actor(actor): Actor,
    Json(body): Json<AuthorizeBody>,
) -> ApiResult<AuthorizationCheckResult> {
    let result = service.check(&body.into_request(actor)).await?;
    Ok(Json(result))
}

async fn batch_authorize<S: RbacStore>(
    State(service): State<Arc<AuthorizationService<S>>>,
    Actor(actor): Actor,
    Json(body): Json<BatchAuthorizeBody>,
) -> ApiResult<BatchAuthorizeResponse> {
    if body.checks.len() > MAX_BATCH_SIZE {
        return Err(AppError::validation(format!(
            "At most {} checks per batch",
            MAX_BATCH_SIZE
        ))
        .into());
    }

    let requests: Vec<AuthorizationCheckRequest> = body
        .checks
        .into_iter()
        .map(|check| check.into_request(actor.clone()))
        .collect();
    let results = service.batch_check(&requests).await?;
    Ok(Json(BatchAuthorizeResponse { results }))
}

async fn filter<S: RbacStore>(
    State(service): State<Arc<AuthorizationService<S>>>,
    Actor(actor): Actor,
    Json(body): Json<FilterBody>,
) -> ApiResult<Predicate> {
    let predicate = service
        .build_filter(actor.as_ref(), &body.resource, &body.action)
        .await?;
    Ok(Json(predicate))
}
