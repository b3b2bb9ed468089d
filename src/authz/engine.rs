use std::collections::{BTreeSet, HashSet};

use crate::authz::types::Permission;
use crate::authz::RoleRegistry;

/// Check if any of `assigned_roles` grants `required`, directly or through
/// inherited roles. Unknown roles contribute nothing.
///
/// Depth-first over an explicit stack. Each role is visited at most once per
/// check, which bounds the walk on cyclic or diamond graphs and keeps stack
/// usage flat however deep the inheritance chain goes.
pub fn check<S: AsRef<str>>(
    registry: &RoleRegistry,
    assigned_roles: &[S],
    required: &Permission,
) -> bool {
    let mut visited = HashSet::new();
    let mut stack = initial_stack(assigned_roles);

    while let Some(name) = stack.pop() {
        if !visited.insert(name) {
            continue;
        }

        let Some(role) = registry.lookup(name) else {
            continue;
        };

        if role.grants(required) {
            return true;
        }

        push_inherited(&mut stack, &role.inherits);
    }

    false
}

/// Expand: every permission granted to `assigned_roles`, including inherited ones.
pub fn expand<S: AsRef<str>>(registry: &RoleRegistry, assigned_roles: &[S]) -> BTreeSet<Permission> {
    let mut result = BTreeSet::new();
    let mut visited = HashSet::new();
    let mut stack = initial_stack(assigned_roles);

    while let Some(name) = stack.pop() {
        if !visited.insert(name) {
            continue;
        }
        let Some(role) = registry.lookup(name) else {
            continue;
        };
        result.extend(role.permissions.iter().cloned());
        push_inherited(&mut stack, &role.inherits);
    }

    result
}

// Reversed so the first assigned role is popped first.
fn initial_stack<S: AsRef<str>>(assigned_roles: &[S]) -> Vec<&str> {
    assigned_roles.iter().rev().map(|name| name.as_ref()).collect()
}

fn push_inherited<'a>(stack: &mut Vec<&'a str>, inherits: &'a [String]) {
    stack.extend(inherits.iter().rev().map(String::as_str));
}
