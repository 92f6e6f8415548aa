use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use bottled_core::{AppError, AppResult};
use bottled_domain::{EmailAddress, Identity, Permission, Role, RoleRegistry};
use tracing::{info, warn};

use crate::IdentityStore;

/// Application service for administrative role assignment and user
/// administration.
///
/// Role grant and revoke are gated on the actor holding the Administrator
/// role (a role check, not a permission check); the listing and user
/// management operations are gated on the corresponding admin permissions.
#[derive(Clone)]
pub struct RoleService {
    identities: Arc<dyn IdentityStore>,
}

impl RoleService {
    /// Creates a new service from an identity store.
    #[must_use]
    pub fn new(identities: Arc<dyn IdentityStore>) -> Self {
        Self { identities }
    }

    /// Assigns a role to a target identity.
    ///
    /// Runs the registry's assignment validation, locates the target, adds
    /// the role with provenance, and persists the updated identity.
    pub async fn assign(
        &self,
        actor: &Identity,
        target_email: &EmailAddress,
        role: Role,
    ) -> AppResult<Identity> {
        if let Err(error) = RoleRegistry::validate_assignment(
            actor.email(),
            actor.roles(),
            target_email,
            role,
        ) {
            warn!(
                assigner = %actor.email(),
                target = %target_email,
                role = role.as_str(),
                "role assignment denied: {error}"
            );
            return Err(error);
        }

        let mut target = self.find_target(target_email).await?;
        target.add_role(role, actor.email().clone());
        self.identities.save(target.clone()).await?;

        info!(
            assigner = %actor.email(),
            target = %target_email,
            role = role.as_str(),
            "role assigned"
        );
        Ok(target)
    }

    /// Removes a role from a target identity.
    ///
    /// Requires the actor to hold the Administrator role and refuses to
    /// remove the actor's own Administrator role. If the removal would leave
    /// the target with no roles, the registry's default role is injected so
    /// every identity keeps at least one role.
    pub async fn remove(
        &self,
        actor: &Identity,
        target_email: &EmailAddress,
        role: Role,
    ) -> AppResult<Identity> {
        if !actor.has_role(Role::Administrator) {
            warn!(
                assigner = %actor.email(),
                target = %target_email,
                role = role.as_str(),
                "role removal denied: actor is not an administrator"
            );
            return Err(AppError::InsufficientPermissions(format!(
                "'{}' does not hold the administrator role",
                actor.email()
            )));
        }

        if actor.email() == target_email && role == Role::Administrator {
            return Err(AppError::SelfDemotionDenied);
        }

        let mut target = self.find_target(target_email).await?;
        target.remove_role(role);

        if target.roles().is_empty() {
            target.add_role(RoleRegistry::default_role(), actor.email().clone());
        }

        self.identities.save(target.clone()).await?;

        info!(
            assigner = %actor.email(),
            target = %target_email,
            role = role.as_str(),
            "role removed"
        );
        Ok(target)
    }

    /// Lists all users for administrative views, sorted by display name.
    pub async fn list_users(&self, actor: &Identity) -> AppResult<Vec<Identity>> {
        self.require_permission(actor, Permission::ViewAdminPanel)?;
        self.require_permission(actor, Permission::ViewUserList)?;

        let mut users = self.identities.list_all().await?;
        users.sort_by(|left, right| left.display_name().cmp(right.display_name()));
        Ok(users)
    }

    /// Returns a single user's identity record.
    pub async fn user(&self, actor: &Identity, email: &EmailAddress) -> AppResult<Identity> {
        self.require_permission(actor, Permission::ViewUserList)?;
        self.find_target(email).await
    }

    /// Returns the roles currently held by a user.
    pub async fn user_roles(
        &self,
        actor: &Identity,
        email: &EmailAddress,
    ) -> AppResult<BTreeSet<Role>> {
        self.require_permission(actor, Permission::ManageRoles)?;
        let target = self.find_target(email).await?;
        Ok(target.roles().clone())
    }

    /// Deletes a user record.
    pub async fn remove_user(&self, actor: &Identity, email: &EmailAddress) -> AppResult<()> {
        self.require_permission(actor, Permission::ManageUsers)?;

        if self.identities.find_by_email(email).await?.is_none() {
            return Err(AppError::TargetNotFound(format!(
                "no identity for '{email}'"
            )));
        }

        self.identities.delete(email).await?;
        info!(actor = %actor.email(), target = %email, "user removed");
        Ok(())
    }

    /// Returns the number of users holding each role.
    pub async fn role_statistics(&self, actor: &Identity) -> AppResult<BTreeMap<Role, usize>> {
        self.require_permission(actor, Permission::ViewAdminPanel)?;

        let mut statistics: BTreeMap<Role, usize> =
            Role::all().iter().map(|role| (*role, 0)).collect();

        for user in self.identities.list_all().await? {
            for role in user.roles() {
                if let Some(count) = statistics.get_mut(role) {
                    *count += 1;
                }
            }
        }

        Ok(statistics)
    }

    async fn find_target(&self, email: &EmailAddress) -> AppResult<Identity> {
        self.identities
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::TargetNotFound(format!("no identity for '{email}'")))
    }

    fn require_permission(&self, actor: &Identity, permission: Permission) -> AppResult<()> {
        if actor.has_permission(permission) {
            return Ok(());
        }

        Err(AppError::InsufficientPermissions(format!(
            "'{}' is missing permission '{}'",
            actor.email(),
            permission.as_str()
        )))
    }
}
