//! Roles, permission codes and the permission catalogue.
//!
//! Codes are dotted paths such as `users.list` or `shop.orders.delete`. A
//! role holding `shop.*` or `*` is granted everything below it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

pub trait PermissionChecker {
    fn has_permission(&self, code: &str) -> bool;
}

/// `code` followed by every wildcard ancestor: `a.b.c` gives `a.b.c`,
/// `a.b.*`, `a.*`, `*`.
pub fn permission_candidates(code: &str) -> Vec<String> {
    let mut candidates = vec![code.to_string()];
    let mut items: Vec<&str> = code.split('.').collect();
    while let Some(last) = items.last_mut() {
        *last = "*";
        candidates.push(items.join("."));
        items.pop();
    }
    candidates
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// The signed-in user, as far as authorization is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl PermissionChecker for Principal {
    fn has_permission(&self, code: &str) -> bool {
        let candidates = permission_candidates(code);
        let granted = self
            .roles
            .iter()
            .flat_map(|role| role.permissions.iter())
            .any(|held| candidates.contains(held));
        debug!("Permission '{}' for '{}': {}", code, self.username, granted);
        granted
    }
}

/// Grants everything. For tools that run without a signed-in user.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn has_permission(&self, _code: &str) -> bool {
        true
    }
}

/// A registered admin view, as the catalogue sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub endpoint: String,
    /// The dashboard view only contributes an `index` permission.
    pub is_index: bool,
    pub actions: Vec<String>,
}

impl ViewDescriptor {
    pub fn new(endpoint: &str, actions: &[&str]) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            is_index: false,
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn index(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            is_index: true,
            actions: Vec::new(),
        }
    }
}

/// A sub-admin mounted under its own endpoint prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantDescriptor {
    pub endpoint: String,
    pub views: Vec<ViewDescriptor>,
}

/// `"users_admin.list"` → `"Users Admin.List"`.
pub fn prettify_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.replace('_', " ").chars() {
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

fn push_view(out: &mut Vec<Permission>, prefix: Option<&str>, view: &ViewDescriptor) {
    let code = |suffix: &str| match prefix {
        Some(p) => format!("{p}.{suffix}"),
        None => suffix.to_string(),
    };

    if view.is_index {
        let code = code("index");
        out.push(Permission {
            name: prettify_name(&code),
            code,
        });
        return;
    }

    let mut codes = vec![code(&format!("{}.list", view.endpoint))];
    codes.extend(
        view.actions
            .iter()
            .map(|action| code(&format!("{}.{}", view.endpoint, action))),
    );
    out.extend(codes.into_iter().map(|code| Permission {
        name: prettify_name(&code),
        code,
    }));
}

/// Every permission the registered views can check, tenants first.
pub fn permission_catalogue(
    tenants: &[TenantDescriptor],
    views: &[ViewDescriptor],
) -> Vec<Permission> {
    let mut out = Vec::new();

    for tenant in tenants {
        out.push(Permission {
            code: format!("{}.*", tenant.endpoint),
            name: prettify_name(&format!("{}.all", tenant.endpoint)),
        });
        for view in &tenant.views {
            push_view(&mut out, Some(&tenant.endpoint), view);
        }
    }

    out.push(Permission {
        code: "*".to_string(),
        name: "All".to_string(),
    });
    for view in views {
        push_view(&mut out, None, view);
    }

    out
}

/// What it takes to bring stored permissions in line with a catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    pub create: Vec<Permission>,
    /// Existing codes whose display name changed.
    pub rename: Vec<Permission>,
    /// Stored codes no view checks anymore.
    pub delete: Vec<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.rename.is_empty() && self.delete.is_empty()
    }
}

pub fn sync_plan(catalogue: &[Permission], existing: &[Permission]) -> SyncPlan {
    let stored: HashMap<&str, &str> = existing
        .iter()
        .map(|p| (p.code.as_str(), p.name.as_str()))
        .collect();

    let mut plan = SyncPlan::default();
    for permission in catalogue {
        match stored.get(permission.code.as_str()) {
            None => plan.create.push(permission.clone()),
            Some(name) if *name != permission.name => plan.rename.push(permission.clone()),
            Some(_) => {}
        }
    }
    plan.delete = existing
        .iter()
        .filter(|p| !catalogue.iter().any(|c| c.code == p.code))
        .map(|p| p.code.clone())
        .collect();

    info!(
        "Permission sync: {} to create, {} to rename, {} to delete",
        plan.create.len(),
        plan.rename.len(),
        plan.delete.len()
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(permissions: &[&str]) -> Principal {
        Principal {
            username: "alice".into(),
            roles: vec![Role {
                code: "staff".into(),
                name: "Staff".into(),
                permissions: permissions.iter().map(|p| p.to_string()).collect(),
            }],
        }
    }

    #[test]
    fn test_permission_candidates() {
        assert_eq!(
            permission_candidates("shop.orders.delete"),
            vec!["shop.orders.delete", "shop.orders.*", "shop.*", "*"]
        );
        assert_eq!(permission_candidates("index"), vec!["index", "*"]);
    }

    #[test]
    fn test_wildcard_grants() {
        let user = principal(&["shop.*", "users.list"]);
        assert!(user.has_permission("shop.orders.delete"));
        assert!(user.has_permission("users.list"));
        assert!(!user.has_permission("users.delete"));
        assert!(!user.has_permission("shopping.list"));

        assert!(principal(&["*"]).has_permission("anything.at.all"));
        assert!(!Principal::default().has_permission("index"));
    }

    #[test]
    fn test_prettify_name() {
        assert_eq!(prettify_name("users.list"), "Users.List");
        assert_eq!(prettify_name("shop_admin.all"), "Shop Admin.All");
        assert_eq!(prettify_name("index"), "Index");
    }

    #[test]
    fn test_permission_catalogue() {
        let tenants = vec![TenantDescriptor {
            endpoint: "shop".into(),
            views: vec![
                ViewDescriptor::index("shop"),
                ViewDescriptor::new("orders", &["refund"]),
            ],
        }];
        let views = vec![
            ViewDescriptor::index("admin"),
            ViewDescriptor::new("users", &["delete", "activate"]),
        ];

        let codes: Vec<String> = permission_catalogue(&tenants, &views)
            .into_iter()
            .map(|p| p.code)
            .collect();
        assert_eq!(
            codes,
            vec![
                "shop.*",
                "shop.index",
                "shop.orders.list",
                "shop.orders.refund",
                "*",
                "index",
                "users.list",
                "users.delete",
                "users.activate",
            ]
        );
    }

    #[test]
    fn test_sync_plan() {
        let catalogue = permission_catalogue(&[], &[ViewDescriptor::new("users", &["delete"])]);
        let existing = vec![
            Permission {
                code: "*".into(),
                name: "All".into(),
            },
            Permission {
                code: "users.list".into(),
                name: "old name".into(),
            },
            Permission {
                code: "posts.list".into(),
                name: "Posts.List".into(),
            },
        ];

        let plan = sync_plan(&catalogue, &existing);
        assert_eq!(plan.create.iter().map(|p| p.code.as_str()).collect::<Vec<_>>(), vec!["users.delete"]);
        assert_eq!(plan.rename.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(), vec!["Users.List"]);
        assert_eq!(plan.delete, vec!["posts.list"]);
        assert!(sync_plan(&catalogue, &catalogue).is_empty());
    }
}
