use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

/// Failure to parse an `action:resource` permission string.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum PermissionError {
    #[error("invalid format")]
    #[diagnostic(
        code(rolegate::permission::malformed),
        help("Permissions are written as \"action:resource\", e.g. \"view:admin.dashboard\"")
    )]
    Malformed,

    #[error("no action specified")]
    #[diagnostic(
        code(rolegate::permission::missing_action),
        help("The part before the first `:` must not be empty")
    )]
    MissingAction,

    #[error("no resource specified")]
    #[diagnostic(
        code(rolegate::permission::missing_resource),
        help("The part after the first `:` must not be empty")
    )]
    MissingResource,
}

#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    #[error("Failed to read role source `{path}`")]
    #[diagnostic(
        code(rolegate::authz::role_source_unreadable),
        help("Check that the roles file exists and is readable")
    )]
    RoleSourceUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed role source: {0}")]
    #[diagnostic(
        code(rolegate::authz::role_source_malformed),
        help("The role source must be a JSON object of role name -> {{ \"permissions\": [...], \"inherits\": [...] }}")
    )]
    RoleSourceMalformed(#[from] serde_json::Error),

    #[error("error loading permission for role {role}: {source}")]
    #[diagnostic(code(rolegate::authz::role_permission_invalid))]
    RolePermissionInvalid {
        role: String,
        #[source]
        #[diagnostic_source]
        source: PermissionError,
    },

    #[error("Invalid permission: {0}")]
    #[diagnostic(code(rolegate::authz::invalid_permission))]
    InvalidPermission(#[from] PermissionError),
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthzError::InvalidPermission(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
