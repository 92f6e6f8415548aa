use bottled_core::NonEmptyString;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EmailAddress, FolderId};

/// Unique identifier for a secret record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SecretId(Uuid);

impl SecretId {
    /// Creates a new random secret identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a secret identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SecretId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SecretId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// An encrypted secret value stored inside a folder.
///
/// The entity only ever holds ciphertext; encryption and decryption happen at
/// the application boundary through the secret cipher. The name is unique
/// among active secrets within the owning folder.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    id: SecretId,
    name: String,
    encrypted_value: Vec<u8>,
    folder_id: FolderId,
    created_by: EmailAddress,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Secret {
    /// Creates an active secret holding the supplied ciphertext.
    #[must_use]
    pub fn new(
        name: NonEmptyString,
        encrypted_value: Vec<u8>,
        folder_id: FolderId,
        created_by: EmailAddress,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: SecretId::new(),
            name: name.into(),
            encrypted_value,
            folder_id,
            created_by,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the secret identifier.
    #[must_use]
    pub fn id(&self) -> SecretId {
        self.id
    }

    /// Returns the secret name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the stored ciphertext.
    #[must_use]
    pub fn encrypted_value(&self) -> &[u8] {
        self.encrypted_value.as_slice()
    }

    /// Returns the owning folder reference.
    #[must_use]
    pub fn folder_id(&self) -> FolderId {
        self.folder_id
    }

    /// Returns the creator's email.
    #[must_use]
    pub fn created_by(&self) -> &EmailAddress {
        &self.created_by
    }

    /// Returns whether the secret is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-modified timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the stored ciphertext and bumps the modification timestamp.
    pub fn set_encrypted_value(&mut self, encrypted_value: Vec<u8>) {
        self.encrypted_value = encrypted_value;
        self.updated_at = Utc::now();
    }

    /// Marks the secret inactive (soft delete).
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}

impl std::fmt::Debug for Secret {
    // The ciphertext is elided so debug output stays log-safe.
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Secret")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("encrypted_value_len", &self.encrypted_value.len())
            .field("folder_id", &self.folder_id)
            .field("created_by", &self.created_by)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}
