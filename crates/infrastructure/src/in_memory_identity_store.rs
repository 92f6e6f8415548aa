use std::collections::HashMap;

use async_trait::async_trait;
use bottled_application::IdentityStore;
use bottled_core::AppResult;
use bottled_domain::{EmailAddress, Identity};
use tokio::sync::RwLock;

/// In-memory identity store implementation.
///
/// Records are keyed by [`EmailAddress`], which normalizes to lowercase, so
/// lookups are case-insensitive without extra folding here.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<EmailAddress, Identity>>,
}

impl InMemoryIdentityStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            identities: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<Identity>> {
        Ok(self.identities.read().await.get(email).cloned())
    }

    async fn save(&self, identity: Identity) -> AppResult<()> {
        self.identities
            .write()
            .await
            .insert(identity.email().clone(), identity);
        Ok(())
    }

    async fn delete(&self, email: &EmailAddress) -> AppResult<()> {
        self.identities.write().await.remove(email);
        Ok(())
    }

    async fn list_all(&self) -> AppResult<Vec<Identity>> {
        let identities = self.identities.read().await;
        let mut listed: Vec<Identity> = identities.values().cloned().collect();
        listed.sort_by(|left, right| left.email().cmp(right.email()));
        Ok(listed)
    }
}
