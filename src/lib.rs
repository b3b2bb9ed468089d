//! Rolegate - role-based access control with inherited roles
//!
//! Roles are loaded once from a JSON source into a `RoleRegistry`; the
//! `AuthorizationGate` answers allow/deny per request and the `web` module
//! wires it into axum routers.

pub mod authz;
pub mod settings;
