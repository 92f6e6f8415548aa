//! Application services and ports for the secrets custody core.

#![forbid(unsafe_code)]

mod folder_ports;
mod folder_service;
mod role_ports;
mod role_service;

pub use folder_ports::{FolderStore, SecretEncryptor, SecretStore};
pub use folder_service::{CreateFolderInput, CreateSecretInput, FolderService};
pub use role_ports::IdentityStore;
pub use role_service::RoleService;
