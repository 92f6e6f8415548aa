use std::collections::BTreeSet;
use std::str::FromStr;

use bottled_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::EmailAddress;

/// Roles assignable to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages users, roles, and all secret folders.
    Administrator,
    /// Standard user with access to the secrets features.
    RegularUser,
    /// Limited user with no permissions.
    Guest,
}

impl Role {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::RegularUser => "regular_user",
            Self::Guest => "guest",
        }
    }

    /// Returns a human-readable label for this role.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::RegularUser => "Regular User",
            Self::Guest => "Guest User",
        }
    }

    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Role] = &[Role::Administrator, Role::RegularUser, Role::Guest];

        ALL
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "administrator" => Ok(Self::Administrator),
            "regular_user" => Ok(Self::RegularUser),
            "guest" => Ok(Self::Guest),
            _ => Err(AppError::Validation(format!("unknown role value '{value}'"))),
        }
    }
}

/// Atomic permissions enforced by application policy checks.
///
/// Permissions are non-hierarchical; the only way to hold one is through an
/// assigned role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows creating, updating, and deleting users.
    ManageUsers,
    /// Allows administering role assignments.
    ManageRoles,
    /// Allows access to the administration surface.
    ViewAdminPanel,
    /// Allows viewing the list of system users.
    ViewUserList,
    /// Allows reading secret folders and values.
    AccessSecrets,
    /// Allows creating and mutating secrets and folders.
    ManageSecrets,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ManageUsers => "manage_users",
            Self::ManageRoles => "manage_roles",
            Self::ViewAdminPanel => "view_admin_panel",
            Self::ViewUserList => "view_user_list",
            Self::AccessSecrets => "access_secrets",
            Self::ManageSecrets => "manage_secrets",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::ManageUsers,
            Permission::ManageRoles,
            Permission::ViewAdminPanel,
            Permission::ViewUserList,
            Permission::AccessSecrets,
            Permission::ManageSecrets,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "manage_users" => Ok(Self::ManageUsers),
            "manage_roles" => Ok(Self::ManageRoles),
            "view_admin_panel" => Ok(Self::ViewAdminPanel),
            "view_user_list" => Ok(Self::ViewUserList),
            "access_secrets" => Ok(Self::AccessSecrets),
            "manage_secrets" => Ok(Self::ManageSecrets),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

/// Static registry mapping roles to permission sets and validating role
/// assignment.
#[derive(Debug, Clone, Copy)]
pub struct RoleRegistry;

impl RoleRegistry {
    /// Returns the permission set for a role.
    ///
    /// The returned set is a fresh copy; mutating it never affects the
    /// registry's canonical mapping.
    #[must_use]
    pub fn permissions_for(role: Role) -> BTreeSet<Permission> {
        let permissions: &[Permission] = match role {
            Role::Administrator => &[
                Permission::ManageUsers,
                Permission::ManageRoles,
                Permission::ViewAdminPanel,
                Permission::ViewUserList,
                Permission::AccessSecrets,
                Permission::ManageSecrets,
            ],
            Role::RegularUser => &[Permission::AccessSecrets, Permission::ManageSecrets],
            Role::Guest => &[],
        };

        permissions.iter().copied().collect()
    }

    /// Returns the union of permissions over all roles.
    #[must_use]
    pub fn all_permissions() -> BTreeSet<Permission> {
        Role::all()
            .iter()
            .flat_map(|role| Self::permissions_for(*role))
            .collect()
    }

    /// Returns the role granted to newly created identities.
    #[must_use]
    pub fn default_role() -> Role {
        Role::RegularUser
    }

    /// Returns whether an identity holding `assigner_roles` may assign any role.
    ///
    /// Role assignment is gated on holding the Administrator role itself, not
    /// on a permission.
    #[must_use]
    pub fn can_assign(assigner_roles: &BTreeSet<Role>, _target_role: Role) -> bool {
        assigner_roles.contains(&Role::Administrator)
    }

    /// Validates a role assignment between an assigner and a target identity.
    ///
    /// Fails with `InsufficientPermissions` when the assigner does not hold
    /// the Administrator role, and with `SelfElevationDenied` when an
    /// administrator attempts to grant the Administrator role to their own
    /// email address.
    pub fn validate_assignment(
        assigner_email: &EmailAddress,
        assigner_roles: &BTreeSet<Role>,
        target_email: &EmailAddress,
        target_role: Role,
    ) -> AppResult<()> {
        if !Self::can_assign(assigner_roles, target_role) {
            return Err(AppError::InsufficientPermissions(format!(
                "'{assigner_email}' does not hold the administrator role"
            )));
        }

        if assigner_email == target_email && target_role == Role::Administrator {
            return Err(AppError::SelfElevationDenied);
        }

        Ok(())
    }
}
