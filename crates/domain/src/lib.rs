//! Domain entities and invariants for the secrets custody core.

#![forbid(unsafe_code)]

mod email;
mod folder;
mod identity;
mod role;
mod secret;

pub use email::EmailAddress;
pub use folder::{AccessType, Folder, FolderId, FolderPermission};
pub use identity::Identity;
pub use role::{Permission, Role, RoleRegistry};
pub use secret::{Secret, SecretId};
