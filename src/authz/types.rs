use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::authz::errors::PermissionError;

/// A grantable capability: "action:resource" e.g. "view:admin.dashboard"
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission {
    action: String,
    resource: String,
}

impl Permission {
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Result<Self, PermissionError> {
        let action = action.into();
        let resource = resource.into();
        if action.is_empty() {
            return Err(PermissionError::MissingAction);
        }
        if resource.is_empty() {
            return Err(PermissionError::MissingResource);
        }
        // Only the first `:` separates, so an action must never contain one.
        if action.contains(':') {
            return Err(PermissionError::Malformed);
        }
        Ok(Self { action, resource })
    }

    /// Parse "action:resource", splitting on the first `:`.
    pub fn parse(input: &str) -> Result<Self, PermissionError> {
        let (action, resource) = input.split_once(':').ok_or(PermissionError::Malformed)?;
        Self::new(action, resource)
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action, self.resource)
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        value.to_string()
    }
}

/// A named bundle of permissions plus the roles it inherits grants from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub permissions: HashSet<Permission>,
    /// Names of the roles this role inherits from. May reference unknown roles.
    pub inherits: Vec<String>,
}

impl Role {
    pub fn grants(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }
}

/// One entry of the JSON role source, before its permissions are parsed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleEntry {
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub inherits: Vec<String>,
}

/// Outcome of an authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => f.write_str("allow"),
            Decision::Deny => f.write_str("deny"),
        }
    }
}

// ---------- API request/response types ----------

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    /// e.g. ["hr_manager", "it_manager"]
    #[serde(default)]
    pub roles: Vec<String>,
    /// e.g. "read:admin.settings"
    pub permission: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExpandRequest {
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpandResponse {
    pub permissions: Vec<Permission>,
}
