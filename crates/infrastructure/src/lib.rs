//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod aes_secret_encryptor;
mod in_memory_folder_store;
mod in_memory_identity_store;
mod in_memory_secret_store;

pub use aes_secret_encryptor::AesSecretEncryptor;
pub use in_memory_folder_store::InMemoryFolderStore;
pub use in_memory_identity_store::InMemoryIdentityStore;
pub use in_memory_secret_store::InMemorySecretStore;
