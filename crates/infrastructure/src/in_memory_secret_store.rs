use std::collections::HashMap;

use async_trait::async_trait;
use bottled_application::SecretStore;
use bottled_core::{AppError, AppResult};
use bottled_domain::{FolderId, Secret, SecretId};
use tokio::sync::RwLock;

/// In-memory secret store implementation.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<SecretId, Secret>>,
}

impl InMemorySecretStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            secrets: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn find_active(&self, secret_id: SecretId) -> AppResult<Option<Secret>> {
        Ok(self
            .secrets
            .read()
            .await
            .get(&secret_id)
            .filter(|secret| secret.is_active())
            .cloned())
    }

    async fn find_active_by_name(
        &self,
        folder_id: FolderId,
        name: &str,
    ) -> AppResult<Option<Secret>> {
        Ok(self
            .secrets
            .read()
            .await
            .values()
            .find(|secret| {
                secret.folder_id() == folder_id && secret.name() == name && secret.is_active()
            })
            .cloned())
    }

    async fn insert(&self, secret: Secret) -> AppResult<()> {
        self.secrets.write().await.insert(secret.id(), secret);
        Ok(())
    }

    async fn update(&self, secret: Secret) -> AppResult<()> {
        let mut secrets = self.secrets.write().await;

        if !secrets.contains_key(&secret.id()) {
            return Err(AppError::TargetNotFound(format!(
                "no secret '{}'",
                secret.id()
            )));
        }

        secrets.insert(secret.id(), secret);
        Ok(())
    }

    async fn list_active_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<Secret>> {
        let secrets = self.secrets.read().await;
        let mut listed: Vec<Secret> = secrets
            .values()
            .filter(|secret| secret.folder_id() == folder_id && secret.is_active())
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(listed)
    }
}
