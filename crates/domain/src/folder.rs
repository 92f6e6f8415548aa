use bottled_core::{AppError, AppResult, NonEmptyString};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EmailAddress;

/// Unique identifier for a folder record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FolderId(Uuid);

impl FolderId {
    /// Creates a new random folder identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a folder identifier from an existing UUID value.
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

impl Default for FolderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FolderId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Access levels checkable against a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// View folder contents and secret values.
    Read,
    /// Create and mutate folder contents.
    Write,
    /// Manage the folder's access grants.
    Admin,
}

impl AccessType {
    /// Returns a stable storage value for this access type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for AccessType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!(
                "unknown access type '{value}'"
            ))),
        }
    }
}

/// A folder organizing secrets in a hierarchy.
///
/// Folders are soft-deleted: the active flag is cleared instead of removing
/// the record, and path uniqueness is enforced only among active folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    id: FolderId,
    name: String,
    path: String,
    parent_id: Option<FolderId>,
    created_by: EmailAddress,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Folder {
    /// Creates an active folder, validating that the path starts with `/`.
    pub fn new(
        name: NonEmptyString,
        path: impl Into<String>,
        created_by: EmailAddress,
        parent_id: Option<FolderId>,
    ) -> AppResult<Self> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(AppError::Validation(
                "folder path must start with '/'".to_owned(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: FolderId::new(),
            name: name.into(),
            path,
            parent_id,
            created_by,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the folder identifier.
    #[must_use]
    pub fn id(&self) -> FolderId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the full hierarchical path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Returns the parent folder reference, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<FolderId> {
        self.parent_id
    }

    /// Returns the creator's email.
    #[must_use]
    pub fn created_by(&self) -> &EmailAddress {
        &self.created_by
    }

    /// Returns whether the folder is active.
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

    /// Decides whether a user holds the requested access on this folder.
    ///
    /// The creator always has full access regardless of explicit grants;
    /// otherwise the user's grant row (if any) decides. Grants on ancestor
    /// folders have no effect here: each folder's access list is
    /// authoritative for that folder alone, and adding implicit inheritance
    /// would silently change the meaning of existing grants.
    #[must_use]
    pub fn has_access(
        &self,
        grants: &[FolderPermission],
        user_email: &EmailAddress,
        access_type: AccessType,
    ) -> bool {
        if &self.created_by == user_email {
            return true;
        }

        grants
            .iter()
            .find(|grant| grant.user_email() == user_email)
            .is_some_and(|grant| grant.allows(access_type))
    }

    /// Marks the folder inactive (soft delete).
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}

/// An explicit per-folder, per-user access grant.
///
/// At most one grant row exists per (folder, grantee) pair; repeated grants
/// escalate the existing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderPermission {
    folder_id: FolderId,
    user_email: EmailAddress,
    can_read: bool,
    can_write: bool,
    can_admin: bool,
    granted_by: EmailAddress,
    granted_at: DateTime<Utc>,
}

impl FolderPermission {
    /// Creates a grant row with no access flags set.
    #[must_use]
    pub fn new(folder_id: FolderId, user_email: EmailAddress, granted_by: EmailAddress) -> Self {
        Self {
            folder_id,
            user_email,
            can_read: false,
            can_write: false,
            can_admin: false,
            granted_by,
            granted_at: Utc::now(),
        }
    }

    /// Returns the folder this grant applies to.
    #[must_use]
    pub fn folder_id(&self) -> FolderId {
        self.folder_id
    }

    /// Returns the grantee's email.
    #[must_use]
    pub fn user_email(&self) -> &EmailAddress {
        &self.user_email
    }

    /// Returns whether the grantee can read folder contents.
    #[must_use]
    pub fn can_read(&self) -> bool {
        self.can_read
    }

    /// Returns whether the grantee can modify folder contents.
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.can_write
    }

    /// Returns whether the grantee can manage folder grants.
    #[must_use]
    pub fn can_admin(&self) -> bool {
        self.can_admin
    }

    /// Returns who granted the access.
    #[must_use]
    pub fn granted_by(&self) -> &EmailAddress {
        &self.granted_by
    }

    /// Returns when the grant row was created.
    #[must_use]
    pub fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }

    /// Returns the flag matching the requested access type.
    #[must_use]
    pub fn allows(&self, access_type: AccessType) -> bool {
        match access_type {
            AccessType::Read => self.can_read,
            AccessType::Write => self.can_write,
            AccessType::Admin => self.can_admin,
        }
    }

    /// Escalates the grant to at least the requested access level.
    ///
    /// Escalation is monotonic: Write implies Read, Admin implies Read and
    /// Write, and flags are never cleared. Revoking access means removing or
    /// rewriting the row, not calling this with a lower level.
    pub fn escalate(&mut self, access_type: AccessType) {
        match access_type {
            AccessType::Read => {
                self.can_read = true;
            }
            AccessType::Write => {
                self.can_read = true;
                self.can_write = true;
            }
            AccessType::Admin => {
                self.can_read = true;
                self.can_write = true;
                self.can_admin = true;
            }
        }
    }

    /// Returns a human-readable access level label.
    #[must_use]
    pub fn access_level(&self) -> &'static str {
        if self.can_admin {
            "Admin"
        } else if self.can_write {
            "Read/Write"
        } else if self.can_read {
            "Read Only"
        } else {
            "No Access"
        }
    }
}
