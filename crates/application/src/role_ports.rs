use async_trait::async_trait;
use bottled_core::AppResult;
use bottled_domain::{EmailAddress, Identity};

/// Repository port for identity persistence.
///
/// Lookups are keyed by email; [`EmailAddress`] normalizes to lowercase, so
/// lookups are case-insensitive without extra folding in implementations.
/// The surrounding persistence layer is responsible for serializing writers
/// per identity.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Finds an identity by its email address.
    async fn find_by_email(&self, email: &EmailAddress) -> AppResult<Option<Identity>>;

    /// Inserts or replaces an identity record.
    async fn save(&self, identity: Identity) -> AppResult<()>;

    /// Deletes an identity record.
    async fn delete(&self, email: &EmailAddress) -> AppResult<()>;

    /// Lists all known identities.
    async fn list_all(&self) -> AppResult<Vec<Identity>>;
}
