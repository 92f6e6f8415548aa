use async_trait::async_trait;
use bottled_core::AppResult;
use bottled_domain::{EmailAddress, Folder, FolderId, FolderPermission, Secret, SecretId};

/// Repository port for folders and their access grants.
///
/// Implementations must uphold two invariants after any write: path
/// uniqueness among active folders, and at most one grant row per
/// (folder, grantee) pair. Writer serialization per folder is the
/// surrounding persistence layer's obligation.
#[async_trait]
pub trait FolderStore: Send + Sync {
    /// Finds an active folder by id.
    async fn find_active(&self, folder_id: FolderId) -> AppResult<Option<Folder>>;

    /// Finds an active folder by its full path.
    async fn find_active_by_path(&self, path: &str) -> AppResult<Option<Folder>>;

    /// Inserts a new folder record.
    async fn insert(&self, folder: Folder) -> AppResult<()>;

    /// Replaces an existing folder record.
    async fn update(&self, folder: Folder) -> AppResult<()>;

    /// Lists active folders whose parent is the given folder.
    async fn list_active_children(&self, parent_id: FolderId) -> AppResult<Vec<Folder>>;

    /// Lists all active folders.
    async fn list_active(&self) -> AppResult<Vec<Folder>>;

    /// Finds the single grant row for a folder and grantee, if present.
    async fn find_grant(
        &self,
        folder_id: FolderId,
        user_email: &EmailAddress,
    ) -> AppResult<Option<FolderPermission>>;

    /// Lists all grant rows for a folder.
    async fn list_grants(&self, folder_id: FolderId) -> AppResult<Vec<FolderPermission>>;

    /// Lists all grant rows naming a grantee, across folders.
    async fn list_grants_for_user(
        &self,
        user_email: &EmailAddress,
    ) -> AppResult<Vec<FolderPermission>>;

    /// Inserts or replaces the grant row for its (folder, grantee) pair.
    async fn upsert_grant(&self, grant: FolderPermission) -> AppResult<()>;
}

/// Repository port for secret records.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Finds an active secret by id.
    async fn find_active(&self, secret_id: SecretId) -> AppResult<Option<Secret>>;

    /// Finds an active secret by name within a folder.
    async fn find_active_by_name(
        &self,
        folder_id: FolderId,
        name: &str,
    ) -> AppResult<Option<Secret>>;

    /// Inserts a new secret record.
    async fn insert(&self, secret: Secret) -> AppResult<()>;

    /// Replaces an existing secret record.
    async fn update(&self, secret: Secret) -> AppResult<()>;

    /// Lists active secrets in a folder.
    async fn list_active_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<Secret>>;
}

/// Port for authenticated symmetric encryption of secret values.
///
/// Implementations provide confidentiality and integrity: a tampered or
/// wrong-key ciphertext must fail decryption rather than return corrupted
/// plaintext.
///
/// Key continuity is the caller's obligation, not something this port can
/// enforce: every ciphertext this port produced can only be decrypted with
/// the key material the encryptor held when it was produced. Callers must
/// resolve the key once at process start from a stable secret and hold it
/// for the process lifetime, never regenerate it per call.
pub trait SecretEncryptor: Send + Sync {
    /// Encrypts a plaintext value.
    fn encrypt(&self, plaintext: &[u8]) -> AppResult<Vec<u8>>;

    /// Decrypts a ciphertext produced by [`SecretEncryptor::encrypt`].
    fn decrypt(&self, ciphertext: &[u8]) -> AppResult<Vec<u8>>;
}
