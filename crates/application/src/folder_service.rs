mod secrets;
#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::sync::Arc;

use bottled_core::{AppError, AppResult, NonEmptyString};
use bottled_domain::{
    AccessType, EmailAddress, Folder, FolderId, FolderPermission, Identity, Permission,
};
use tracing::info;

use crate::{FolderStore, SecretEncryptor, SecretStore};

/// Input payload for creating a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateFolderInput {
    /// Folder display name.
    pub name: String,
    /// Full hierarchical path, starting with `/`.
    pub path: String,
    /// Optional parent folder.
    pub parent_id: Option<FolderId>,
}

/// Input payload for creating a secret.
#[derive(Clone, PartialEq, Eq)]
pub struct CreateSecretInput {
    /// Secret name, unique among active secrets in the folder.
    pub name: String,
    /// Plaintext value; encrypted before storage and never logged.
    pub value: String,
}

/// Application service for the folder/secret access-control model.
///
/// Every operation is gated twice: first on the actor's permission
/// (`AccessSecrets` for reads, `ManageSecrets` for mutations), then on the
/// actor's access to the specific folder. Folder access never inherits from
/// ancestor folders.
#[derive(Clone)]
pub struct FolderService {
    folders: Arc<dyn FolderStore>,
    secrets: Arc<dyn SecretStore>,
    encryptor: Arc<dyn SecretEncryptor>,
}

impl FolderService {
    /// Creates a new service from its stores and cipher.
    #[must_use]
    pub fn new(
        folders: Arc<dyn FolderStore>,
        secrets: Arc<dyn SecretStore>,
        encryptor: Arc<dyn SecretEncryptor>,
    ) -> Self {
        Self {
            folders,
            secrets,
            encryptor,
        }
    }

    /// Creates a folder.
    ///
    /// The path must be unused among active folders; soft-deleted folders do
    /// not block path reuse. With a parent, the actor needs Write access to
    /// it.
    pub async fn create_folder(
        &self,
        actor: &Identity,
        input: CreateFolderInput,
    ) -> AppResult<Folder> {
        self.require_permission(actor, Permission::ManageSecrets)?;

        let name = NonEmptyString::new(input.name)?;

        if self
            .folders
            .find_active_by_path(input.path.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::DuplicatePath(input.path));
        }

        if let Some(parent_id) = input.parent_id {
            let parent = self.find_active_folder(parent_id).await?;
            self.require_folder_access(actor, &parent, AccessType::Write)
                .await?;
        }

        let folder = Folder::new(name, input.path, actor.email().clone(), input.parent_id)?;
        self.folders.insert(folder.clone()).await?;

        info!(actor = %actor.email(), path = folder.path(), "folder created");
        Ok(folder)
    }

    /// Returns a folder the actor can read.
    pub async fn folder(&self, actor: &Identity, folder_id: FolderId) -> AppResult<Folder> {
        self.require_permission(actor, Permission::AccessSecrets)?;

        let folder = self.find_active_folder(folder_id).await?;
        self.require_folder_access(actor, &folder, AccessType::Read)
            .await?;
        Ok(folder)
    }

    /// Returns the child folders the actor can read.
    pub async fn list_children(
        &self,
        actor: &Identity,
        folder_id: FolderId,
    ) -> AppResult<Vec<Folder>> {
        self.require_permission(actor, Permission::AccessSecrets)?;

        let folder = self.find_active_folder(folder_id).await?;
        self.require_folder_access(actor, &folder, AccessType::Read)
            .await?;

        let mut readable = Vec::new();
        for child in self.folders.list_active_children(folder_id).await? {
            let grants = self.folders.list_grants(child.id()).await?;
            if child.has_access(&grants, actor.email(), AccessType::Read) {
                readable.push(child);
            }
        }

        Ok(readable)
    }

    /// Returns a folder's grant rows; requires Admin access on the folder.
    pub async fn folder_grants(
        &self,
        actor: &Identity,
        folder_id: FolderId,
    ) -> AppResult<Vec<FolderPermission>> {
        self.require_permission(actor, Permission::AccessSecrets)?;

        let folder = self.find_active_folder(folder_id).await?;
        self.require_folder_access(actor, &folder, AccessType::Admin)
            .await?;
        self.folders.list_grants(folder_id).await
    }

    /// Grants access to a user on a folder, escalating monotonically.
    ///
    /// The single grant row per (folder, grantee) pair is located or created
    /// and escalated; granting a lower access level after a higher one never
    /// downgrades. There is no flag-only revoke through this entry point.
    pub async fn grant_access(
        &self,
        actor: &Identity,
        folder_id: FolderId,
        grantee: EmailAddress,
        access_type: AccessType,
    ) -> AppResult<FolderPermission> {
        self.require_permission(actor, Permission::ManageSecrets)?;

        let folder = self.find_active_folder(folder_id).await?;
        self.require_folder_access(actor, &folder, AccessType::Admin)
            .await?;

        let mut grant = match self.folders.find_grant(folder_id, &grantee).await? {
            Some(existing) => existing,
            None => FolderPermission::new(folder_id, grantee.clone(), actor.email().clone()),
        };
        grant.escalate(access_type);
        self.folders.upsert_grant(grant.clone()).await?;

        info!(
            actor = %actor.email(),
            grantee = %grantee,
            path = folder.path(),
            access = access_type.as_str(),
            "folder access granted"
        );
        Ok(grant)
    }

    /// Returns whether a user holds the requested access on a folder.
    ///
    /// Pure read predicate over supplied state; inactive folders deny all
    /// access.
    pub async fn has_access(
        &self,
        folder_id: FolderId,
        user_email: &EmailAddress,
        access_type: AccessType,
    ) -> AppResult<bool> {
        let Some(folder) = self.folders.find_active(folder_id).await? else {
            return Ok(false);
        };

        let grants = self.folders.list_grants(folder_id).await?;
        Ok(folder.has_access(&grants, user_email, access_type))
    }

    /// Lists the active folders the actor created or was granted, sorted by
    /// path.
    pub async fn list_accessible(&self, actor: &Identity) -> AppResult<Vec<Folder>> {
        self.require_permission(actor, Permission::AccessSecrets)?;

        let granted_ids: BTreeSet<FolderId> = self
            .folders
            .list_grants_for_user(actor.email())
            .await?
            .into_iter()
            .map(|grant| grant.folder_id())
            .collect();

        let mut accessible: Vec<Folder> = self
            .folders
            .list_active()
            .await?
            .into_iter()
            .filter(|folder| {
                folder.created_by() == actor.email() || granted_ids.contains(&folder.id())
            })
            .collect();

        accessible.sort_by(|left, right| left.path().cmp(right.path()));
        Ok(accessible)
    }

    /// Soft-deletes a folder and its active descendants.
    ///
    /// The records remain in storage with the active flag cleared, and the
    /// folder's path becomes reusable.
    pub async fn delete_folder(&self, actor: &Identity, folder_id: FolderId) -> AppResult<()> {
        self.require_permission(actor, Permission::ManageSecrets)?;

        let folder = self.find_active_folder(folder_id).await?;
        self.require_folder_access(actor, &folder, AccessType::Admin)
            .await?;

        let mut pending = vec![folder];
        while let Some(mut current) = pending.pop() {
            pending.extend(self.folders.list_active_children(current.id()).await?);
            current.deactivate();
            let path = current.path().to_owned();
            self.folders.update(current).await?;
            info!(actor = %actor.email(), path = path.as_str(), "folder deactivated");
        }

        Ok(())
    }

    async fn find_active_folder(&self, folder_id: FolderId) -> AppResult<Folder> {
        self.folders
            .find_active(folder_id)
            .await?
            .ok_or_else(|| AppError::TargetNotFound(format!("no active folder '{folder_id}'")))
    }

    async fn require_folder_access(
        &self,
        actor: &Identity,
        folder: &Folder,
        access_type: AccessType,
    ) -> AppResult<()> {
        let grants = self.folders.list_grants(folder.id()).await?;
        if folder.has_access(&grants, actor.email(), access_type) {
            return Ok(());
        }

        Err(AppError::InsufficientPermissions(format!(
            "'{}' lacks {} access to folder '{}'",
            actor.email(),
            access_type.as_str(),
            folder.path()
        )))
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
