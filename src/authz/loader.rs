use std::collections::BTreeMap;
use std::path::Path;

use crate::authz::errors::AuthzError;
use crate::authz::types::{Permission, RoleEntry};
use crate::authz::RoleRegistry;

/// Load role definitions from a JSON file into a fresh `RoleRegistry`.
pub fn load_roles_file(path: &Path) -> Result<RoleRegistry, AuthzError> {
    let contents =
        std::fs::read_to_string(path).map_err(|source| AuthzError::RoleSourceUnreadable {
            path: path.display().to_string(),
            source,
        })?;

    let registry = parse_roles(&contents)?;

    tracing::info!(
        path = %path.display(),
        roles = registry.len(),
        "Loaded role definitions"
    );

    Ok(registry)
}

/// Parse a JSON role source: `{ "<role>": { "permissions": [..], "inherits": [..] } }`.
pub fn parse_roles(source: &str) -> Result<RoleRegistry, AuthzError> {
    // A repeated role name keeps the last entry.
    let entries: BTreeMap<String, RoleEntry> = serde_json::from_str(source)?;
    compile_roles(entries)
}

/// Build a registry from raw entries. Nothing is returned unless every
/// permission string parses.
pub fn compile_roles(entries: BTreeMap<String, RoleEntry>) -> Result<RoleRegistry, AuthzError> {
    let mut registry = RoleRegistry::new();

    for (name, entry) in entries {
        let permissions = entry
            .permissions
            .iter()
            .map(|p| Permission::parse(p))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| AuthzError::RolePermissionInvalid {
                role: name.clone(),
                source,
            })?;

        tracing::debug!(
            role = %name,
            permissions = permissions.len(),
            inherits = ?entry.inherits,
            "Registered role"
        );
        registry.register(name, permissions, entry.inherits);
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::engine::check;
    use crate::authz::errors::PermissionError;

    const VALID_ROLES: &str = r#"
{
    "user": {
        "permissions": ["view:user.dashboard"],
        "inherits": []
    },
    "hr_manager": {
        "permissions": ["read:admin.settings", "view:hr.dashboard"],
        "inherits": ["user"]
    },
    "it_manager": {
        "permissions": ["read:admin.settings", "view:it.dashboard"],
        "inherits": ["user"]
    },
    "sysadmin": {
        "permissions": ["view:sysadmin.dashboard"],
        "inherits": ["it_manager"]
    },
    "admin": {
        "permissions": ["view:admin.dashboard"],
        "inherits": ["sysadmin", "hr_manager"]
    }
}
"#;

    fn perm(s: &str) -> Permission {
        Permission::parse(s).unwrap()
    }

    #[test]
    fn test_parse_valid_roles() {
        let registry = parse_roles(VALID_ROLES).unwrap();
        assert_eq!(registry.len(), 5);

        let sysadmin = registry.lookup("sysadmin").unwrap();
        assert_eq!(sysadmin.inherits, vec!["it_manager".to_string()]);
        assert!(sysadmin.grants(&perm("view:sysadmin.dashboard")));

        assert!(check(&registry, &["hr_manager"], &perm("read:admin.settings")));
        assert!(!check(&registry, &["hr_manager"], &perm("read:system.settings")));
        assert!(check(&registry, &["sysadmin"], &perm("read:admin.settings")));
        assert!(check(&registry, &["admin"], &perm("view:hr.dashboard")));
    }

    #[test]
    fn test_invalid_permission_names_role() {
        let source = r#"
{
    "hr_manager": { "permissions": ["read:admin.settings"], "inherits": [] },
    "it_manager": { "permissions": ["read:admin.settings", "invalidblah"], "inherits": [] }
}
"#;
        let err = parse_roles(source).unwrap_err();
        match &err {
            AuthzError::RolePermissionInvalid { role, source } => {
                assert_eq!(role, "it_manager");
                assert_eq!(*source, PermissionError::Malformed);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "error loading permission for role it_manager: invalid format"
        );
    }

    #[test]
    fn test_missing_action_and_resource_attributed() {
        let err = parse_roles(r#"{ "a": { "permissions": [":x"] } }"#).unwrap_err();
        assert!(matches!(
            err,
            AuthzError::RolePermissionInvalid { ref role, source: PermissionError::MissingAction } if role == "a"
        ));

        let err = parse_roles(r#"{ "b": { "permissions": ["x:"] } }"#).unwrap_err();
        assert!(matches!(
            err,
            AuthzError::RolePermissionInvalid { ref role, source: PermissionError::MissingResource } if role == "b"
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_roles("invalid json").unwrap_err();
        match err {
            AuthzError::RoleSourceMalformed(inner) => {
                assert!(inner.is_syntax());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_shape_is_malformed() {
        let err = parse_roles(r#"["admin", "user"]"#).unwrap_err();
        assert!(matches!(err, AuthzError::RoleSourceMalformed(_)));

        let err = parse_roles(r#"{ "admin": { "permissions": "view:admin.dashboard" } }"#)
            .unwrap_err();
        assert!(matches!(err, AuthzError::RoleSourceMalformed(_)));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let registry = parse_roles(r#"{ "guest": {} }"#).unwrap();
        let guest = registry.lookup("guest").unwrap();
        assert!(guest.permissions.is_empty());
        assert!(guest.inherits.is_empty());
    }

    #[test]
    fn test_duplicate_role_last_wins() {
        let source = r#"
{
    "admin": { "permissions": ["view:admin.dashboard"] },
    "admin": { "permissions": ["view:it.dashboard"] }
}
"#;
        let registry = parse_roles(source).unwrap();
        assert_eq!(registry.len(), 1);
        let admin = registry.lookup("admin").unwrap();
        assert!(admin.grants(&perm("view:it.dashboard")));
        assert!(!admin.grants(&perm("view:admin.dashboard")));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.json");
        std::fs::write(&path, VALID_ROLES).unwrap();

        let registry = load_roles_file(&path).unwrap();
        assert_eq!(registry.len(), 5);
        assert_eq!(
            registry.role_names(),
            vec!["admin", "hr_manager", "it_manager", "sysadmin", "user"]
        );
    }

    #[test]
    fn test_load_nonexistent_file() {
        let err = load_roles_file(Path::new("/nonexistent/doesnotexist.json")).unwrap_err();
        match err {
            AuthzError::RoleSourceUnreadable { path, source } => {
                assert_eq!(path, "/nonexistent/doesnotexist.json");
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_invalid_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invalid_json.jsonx");
        std::fs::write(&path, "invalid").unwrap();

        let err = load_roles_file(&path).unwrap_err();
        assert!(matches!(err, AuthzError::RoleSourceMalformed(_)));
    }
}
