pub mod engine;
pub mod errors;
pub mod gate;
pub mod loader;
pub mod types;
pub mod web;

use std::collections::{HashMap, HashSet};
use types::{Permission, Role};

/// Role name -> role definition. Read-only once loading has finished;
/// reloading builds a new registry and swaps it in whole.
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: HashMap<String, Role>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the role stored under `name`. Last write wins.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        permissions: impl IntoIterator<Item = Permission>,
        inherits: impl IntoIterator<Item = impl Into<String>>,
    ) {
        let name = name.into();
        let role = Role {
            name: name.clone(),
            permissions: permissions.into_iter().collect::<HashSet<_>>(),
            inherits: inherits.into_iter().map(Into::into).collect(),
        };
        self.roles.insert(name, role);
    }

    /// Unknown names are `None`, never an error.
    pub fn lookup(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn role_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.roles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
