use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EmailAddress, Permission, Role, RoleRegistry};

/// An authenticated principal with its role set and derived permissions.
///
/// The permission set is never mutated directly: it is recomputed as the
/// union of [`RoleRegistry::permissions_for`] over the current roles on every
/// role mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    email: EmailAddress,
    display_name: String,
    provider: String,
    roles: BTreeSet<Role>,
    permissions: BTreeSet<Permission>,
    assigned_by: Option<EmailAddress>,
    assigned_at: Option<DateTime<Utc>>,
    authenticated_at: DateTime<Utc>,
}

impl Identity {
    /// Creates an identity from authentication data.
    ///
    /// When `roles` is `None` or empty, the registry's default role is
    /// assigned so that every identity holds at least one role after
    /// creation.
    #[must_use]
    pub fn new(
        email: EmailAddress,
        display_name: impl Into<String>,
        provider: impl Into<String>,
        roles: Option<BTreeSet<Role>>,
    ) -> Self {
        let roles = match roles {
            Some(roles) if !roles.is_empty() => roles,
            _ => [RoleRegistry::default_role()].into_iter().collect(),
        };

        let mut identity = Self {
            email,
            display_name: display_name.into(),
            provider: provider.into(),
            roles,
            permissions: BTreeSet::new(),
            assigned_by: None,
            assigned_at: None,
            authenticated_at: Utc::now(),
        };
        identity.recompute_permissions();
        identity
    }

    /// Rebuilds an identity from a persisted session representation.
    ///
    /// Unknown or invalid role tokens are dropped silently rather than
    /// failing reconstruction; if no valid token survives, the default role
    /// is assigned.
    #[must_use]
    pub fn from_persisted(
        email: EmailAddress,
        display_name: impl Into<String>,
        provider: impl Into<String>,
        role_tokens: &[String],
        authenticated_at: DateTime<Utc>,
    ) -> Self {
        let roles: BTreeSet<Role> = role_tokens
            .iter()
            .filter_map(|token| Role::from_str(token).ok())
            .collect();

        let mut identity = Self::new(email, display_name, provider, Some(roles));
        identity.authenticated_at = authenticated_at;
        identity
    }

    /// Returns the unique email identifier.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the origin identity-provider tag.
    #[must_use]
    pub fn provider(&self) -> &str {
        self.provider.as_str()
    }

    /// Returns the assigned roles.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    /// Returns the derived permissions.
    #[must_use]
    pub fn permissions(&self) -> &BTreeSet<Permission> {
        &self.permissions
    }

    /// Returns who last changed this identity's roles, if recorded.
    #[must_use]
    pub fn assigned_by(&self) -> Option<&EmailAddress> {
        self.assigned_by.as_ref()
    }

    /// Returns when this identity's roles last changed, if recorded.
    #[must_use]
    pub fn assigned_at(&self) -> Option<DateTime<Utc>> {
        self.assigned_at
    }

    /// Returns the authentication timestamp.
    #[must_use]
    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }

    /// Returns whether the identity holds a specific role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns whether the identity holds a specific permission.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Returns whether the identity holds any of the given roles.
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.roles.contains(role))
    }

    /// Returns whether the identity holds the Administrator role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Administrator)
    }

    /// Adds a role, records provenance, and recomputes permissions.
    pub fn add_role(&mut self, role: Role, assigned_by: EmailAddress) {
        self.roles.insert(role);
        self.assigned_by = Some(assigned_by);
        self.assigned_at = Some(Utc::now());
        self.recompute_permissions();
    }

    /// Removes a role and recomputes permissions.
    ///
    /// Removing a role not currently held is a no-op. The role set may be
    /// transiently empty after this call; the role-assignment service is
    /// responsible for restoring the at-least-one-role invariant before
    /// persisting.
    pub fn remove_role(&mut self, role: Role) {
        self.roles.remove(&role);
        self.recompute_permissions();
    }

    fn recompute_permissions(&mut self) {
        self.permissions = self
            .roles
            .iter()
            .flat_map(|role| RoleRegistry::permissions_for(*role))
            .collect();
    }
}
