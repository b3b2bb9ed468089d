use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::authz::engine;
use crate::authz::errors::AuthzError;
use crate::authz::gate::AuthorizationGate;
use crate::authz::types::{
    CheckRequest, CheckResponse, Decision, ExpandRequest, ExpandResponse, Permission,
};

/// State for the enforcing middleware: which gate to ask, and for what.
#[derive(Clone)]
struct RequiredPermission {
    gate: AuthorizationGate,
    permission: Permission,
}

/// Put every route of `router` behind `permission`. Denied requests get a
/// bare 403 and never reach the handler.
pub fn protect<S>(router: Router<S>, gate: AuthorizationGate, permission: Permission) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(
        RequiredPermission { gate, permission },
        enforce,
    ))
}

async fn enforce(
    State(required): State<RequiredPermission>,
    request: Request,
    next: Next,
) -> Response {
    match required.gate.authorize(&request, &required.permission) {
        Decision::Allow => next.run(request).await,
        Decision::Deny => forbidden(),
    }
}

/// Generic rejection. Which roles or permission were evaluated stays in the audit log.
pub fn forbidden() -> Response {
    let status = StatusCode::FORBIDDEN;
    (status, status.canonical_reason().unwrap_or("Forbidden")).into_response()
}

/// Routes served on the public listener: `/admin/dashboard` behind
/// `permission`. The check API is never mounted here.
pub fn public_router(gate: AuthorizationGate, permission: Permission) -> Router {
    protect(
        Router::new().route("/admin/dashboard", get(admin_dashboard)),
        gate,
        permission,
    )
}

async fn admin_dashboard() -> &'static str {
    "Admin Dashboard"
}

/// Check API. It answers for any role set without authenticating the caller,
/// so it belongs on a separate, internal listener.
pub fn router(gate: AuthorizationGate) -> Router {
    Router::new()
        .route("/v1/check", post(handle_check))
        .route("/v1/expand", post(handle_expand))
        .route("/healthz", get(health))
        .with_state(gate)
}

async fn handle_check(
    State(gate): State<AuthorizationGate>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, AuthzError> {
    let permission = Permission::parse(&req.permission)?;
    let registry = gate.registry();
    let allowed = engine::check(&registry, req.roles.as_slice(), &permission);
    Ok(Json(CheckResponse { allowed }))
}

async fn handle_expand(
    State(gate): State<AuthorizationGate>,
    Json(req): Json<ExpandRequest>,
) -> impl IntoResponse {
    let registry = gate.registry();
    let permissions = engine::expand(&registry, req.roles.as_slice())
        .into_iter()
        .collect();
    Json(ExpandResponse { permissions })
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
