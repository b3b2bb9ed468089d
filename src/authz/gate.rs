//! Authorization decision point sitting between a request and the handler it
//! protects. The gate only decides; turning a deny into a rejection is the
//! job of the web layer.

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::Request;

use crate::authz::engine;
use crate::authz::types::{Decision, Permission};
use crate::authz::RoleRegistry;

pub const DEFAULT_ROLES_HEADER: &str = "Roles";

/// Maps an inbound request to the ordered role names the caller presents.
pub trait RoleExtractor: Send + Sync {
    fn roles(&self, request: &Request<Body>) -> Vec<String>;
}

impl<F> RoleExtractor for F
where
    F: Fn(&Request<Body>) -> Vec<String> + Send + Sync,
{
    fn roles(&self, request: &Request<Body>) -> Vec<String> {
        self(request)
    }
}

/// Reads a comma separated role list from a single request header.
///
/// Each piece is trimmed and empty pieces are dropped, so `"a, b"` reads as
/// `["a", "b"]` and `"a,,"` as `["a"]`. A missing header yields no roles.
#[derive(Debug, Clone)]
pub struct HeaderRoleExtractor {
    header: String,
}

impl HeaderRoleExtractor {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl Default for HeaderRoleExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_ROLES_HEADER)
    }
}

impl RoleExtractor for HeaderRoleExtractor {
    fn roles(&self, request: &Request<Body>) -> Vec<String> {
        let Some(value) = request
            .headers()
            .get(self.header.as_str())
            .and_then(|v| v.to_str().ok())
        else {
            return Vec::new();
        };

        value
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One authorization decision, as handed to the audit sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub method: String,
    pub target: String,
    pub permission: Permission,
    pub roles: Vec<String>,
    pub decision: Decision,
}

/// Receives allow/deny events. Recording cannot fail a decision.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Default sink: one structured `tracing` event per decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        match event.decision {
            Decision::Allow => tracing::info!(
                method = %event.method,
                uri = %event.target,
                permission = %event.permission,
                roles = ?event.roles,
                "Granting access"
            ),
            Decision::Deny => tracing::warn!(
                method = %event.method,
                uri = %event.target,
                permission = %event.permission,
                roles = ?event.roles,
                "Denied access due to missing permission"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

/// Collaborators the gate delegates to.
#[derive(Clone)]
pub struct GateConfig {
    /// How roles are read off a request. Defaults to the `Roles` header.
    pub extractor: Arc<dyn RoleExtractor>,
    /// Where allow/deny events go. Defaults to `tracing`.
    pub audit: Arc<dyn AuditSink>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            extractor: Arc::new(HeaderRoleExtractor::default()),
            audit: Arc::new(TracingAuditSink),
        }
    }
}

#[derive(Clone)]
pub struct AuthorizationGate {
    registry: Arc<ArcSwap<RoleRegistry>>,
    config: GateConfig,
}

impl AuthorizationGate {
    pub fn new(registry: RoleRegistry, config: GateConfig) -> Self {
        Self {
            registry: Arc::new(ArcSwap::from_pointee(registry)),
            config,
        }
    }

    /// Current registry snapshot.
    pub fn registry(&self) -> Arc<RoleRegistry> {
        self.registry.load_full()
    }

    /// Replace the whole registry. Checks already running keep their snapshot.
    pub fn reload(&self, registry: RoleRegistry) {
        let roles = registry.len();
        self.registry.store(Arc::new(registry));
        tracing::info!(roles, "Role registry reloaded");
    }

    pub fn authorize(&self, request: &Request<Body>, required: &Permission) -> Decision {
        let roles = self.config.extractor.roles(request);
        let registry = self.registry.load();
        let decision = Decision::from(engine::check(&registry, roles.as_slice(), required));

        self.config.audit.record(&AuditEvent {
            method: request.method().to_string(),
            target: request.uri().to_string(),
            permission: required.clone(),
            roles,
            decision,
        });

        decision
    }
}
