use std::collections::HashMap;

use async_trait::async_trait;
use bottled_application::FolderStore;
use bottled_core::{AppError, AppResult};
use bottled_domain::{EmailAddress, Folder, FolderId, FolderPermission};
use tokio::sync::RwLock;

/// In-memory folder store implementation.
///
/// Folders are keyed by id; grant rows by their (folder, grantee) pair. Path
/// uniqueness among active folders is re-checked on insert so the store stays
/// consistent even if a caller skips the service-level check.
#[derive(Debug, Default)]
pub struct InMemoryFolderStore {
    folders: RwLock<HashMap<FolderId, Folder>>,
    grants: RwLock<HashMap<(FolderId, EmailAddress), FolderPermission>>,
}

impl InMemoryFolderStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            folders: RwLock::new(HashMap::new()),
            grants: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl FolderStore for InMemoryFolderStore {
    async fn find_active(&self, folder_id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self
            .folders
            .read()
            .await
            .get(&folder_id)
            .filter(|folder| folder.is_active())
            .cloned())
    }

    async fn find_active_by_path(&self, path: &str) -> AppResult<Option<Folder>> {
        Ok(self
            .folders
            .read()
            .await
            .values()
            .find(|folder| folder.path() == path && folder.is_active())
            .cloned())
    }

    async fn insert(&self, folder: Folder) -> AppResult<()> {
        let mut folders = self.folders.write().await;

        if folder.is_active()
            && folders
                .values()
                .any(|stored| stored.is_active() && stored.path() == folder.path())
        {
            return Err(AppError::DuplicatePath(folder.path().to_owned()));
        }

        folders.insert(folder.id(), folder);
        Ok(())
    }

    async fn update(&self, folder: Folder) -> AppResult<()> {
        let mut folders = self.folders.write().await;

        if !folders.contains_key(&folder.id()) {
            return Err(AppError::TargetNotFound(format!(
                "no folder '{}'",
                folder.id()
            )));
        }

        folders.insert(folder.id(), folder);
        Ok(())
    }

    async fn list_active_children(&self, parent_id: FolderId) -> AppResult<Vec<Folder>> {
        let folders = self.folders.read().await;
        let mut children: Vec<Folder> = folders
            .values()
            .filter(|folder| folder.parent_id() == Some(parent_id) && folder.is_active())
            .cloned()
            .collect();
        children.sort_by(|left, right| left.path().cmp(right.path()));
        Ok(children)
    }

    async fn list_active(&self) -> AppResult<Vec<Folder>> {
        let folders = self.folders.read().await;
        let mut listed: Vec<Folder> = folders
            .values()
            .filter(|folder| folder.is_active())
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.path().cmp(right.path()));
        Ok(listed)
    }

    async fn find_grant(
        &self,
        folder_id: FolderId,
        user_email: &EmailAddress,
    ) -> AppResult<Option<FolderPermission>> {
        Ok(self
            .grants
            .read()
            .await
            .get(&(folder_id, user_email.clone()))
            .cloned())
    }

    async fn list_grants(&self, folder_id: FolderId) -> AppResult<Vec<FolderPermission>> {
        let grants = self.grants.read().await;
        let mut listed: Vec<FolderPermission> = grants
            .iter()
            .filter_map(|((stored_folder_id, _), grant)| {
                (stored_folder_id == &folder_id).then(|| grant.clone())
            })
            .collect();
        listed.sort_by(|left, right| left.user_email().cmp(right.user_email()));
        Ok(listed)
    }

    async fn list_grants_for_user(
        &self,
        user_email: &EmailAddress,
    ) -> AppResult<Vec<FolderPermission>> {
        let grants = self.grants.read().await;
        let mut listed: Vec<FolderPermission> = grants
            .iter()
            .filter_map(|((_, stored_email), grant)| {
                (stored_email == user_email).then(|| grant.clone())
            })
            .collect();
        listed.sort_by_key(|grant| grant.folder_id());
        Ok(listed)
    }

    async fn upsert_grant(&self, grant: FolderPermission) -> AppResult<()> {
        self.grants
            .write()
            .await
            .insert((grant.folder_id(), grant.user_email().clone()), grant);
        Ok(())
    }
}
