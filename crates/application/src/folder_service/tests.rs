use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use bottled_core::{AppError, AppResult};
use bottled_domain::{
    AccessType, EmailAddress, Folder, FolderId, FolderPermission, Identity, Role, Secret, SecretId,
};
use tokio::sync::Mutex;

use crate::{FolderStore, SecretEncryptor, SecretStore};

use super::{CreateFolderInput, CreateSecretInput, FolderService};

#[derive(Default)]
struct FakeFolderStore {
    folders: Mutex<Vec<Folder>>,
    grants: Mutex<Vec<FolderPermission>>,
}

#[async_trait]
impl FolderStore for FakeFolderStore {
    async fn find_active(&self, folder_id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self
            .folders
            .lock()
            .await
            .iter()
            .find(|folder| folder.id() == folder_id && folder.is_active())
            .cloned())
    }

    async fn find_active_by_path(&self, path: &str) -> AppResult<Option<Folder>> {
        Ok(self
            .folders
            .lock()
            .await
            .iter()
            .find(|folder| folder.path() == path && folder.is_active())
            .cloned())
    }

    async fn insert(&self, folder: Folder) -> AppResult<()> {
        self.folders.lock().await.push(folder);
        Ok(())
    }

    async fn update(&self, folder: Folder) -> AppResult<()> {
        let mut folders = self.folders.lock().await;
        match folders.iter_mut().find(|stored| stored.id() == folder.id()) {
            Some(stored) => {
                *stored = folder;
                Ok(())
            }
            None => Err(AppError::TargetNotFound(format!(
                "no folder '{}'",
                folder.id()
            ))),
        }
    }

    async fn list_active_children(&self, parent_id: FolderId) -> AppResult<Vec<Folder>> {
        Ok(self
            .folders
            .lock()
            .await
            .iter()
            .filter(|folder| folder.parent_id() == Some(parent_id) && folder.is_active())
            .cloned()
            .collect())
    }

    async fn list_active(&self) -> AppResult<Vec<Folder>> {
        Ok(self
            .folders
            .lock()
            .await
            .iter()
            .filter(|folder| folder.is_active())
            .cloned()
            .collect())
    }

    async fn find_grant(
        &self,
        folder_id: FolderId,
        user_email: &EmailAddress,
    ) -> AppResult<Option<FolderPermission>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .find(|grant| grant.folder_id() == folder_id && grant.user_email() == user_email)
            .cloned())
    }

    async fn list_grants(&self, folder_id: FolderId) -> AppResult<Vec<FolderPermission>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .filter(|grant| grant.folder_id() == folder_id)
            .cloned()
            .collect())
    }

    async fn list_grants_for_user(
        &self,
        user_email: &EmailAddress,
    ) -> AppResult<Vec<FolderPermission>> {
        Ok(self
            .grants
            .lock()
            .await
            .iter()
            .filter(|grant| grant.user_email() == user_email)
            .cloned()
            .collect())
    }

    async fn upsert_grant(&self, grant: FolderPermission) -> AppResult<()> {
        let mut grants = self.grants.lock().await;
        grants.retain(|stored| {
            !(stored.folder_id() == grant.folder_id() && stored.user_email() == grant.user_email())
        });
        grants.push(grant);
        Ok(())
    }
}

#[derive(Default)]
struct FakeSecretStore {
    secrets: Mutex<Vec<Secret>>,
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn find_active(&self, secret_id: SecretId) -> AppResult<Option<Secret>> {
        Ok(self
            .secrets
            .lock()
            .await
            .iter()
            .find(|secret| secret.id() == secret_id && secret.is_active())
            .cloned())
    }

    async fn find_active_by_name(
        &self,
        folder_id: FolderId,
        name: &str,
    ) -> AppResult<Option<Secret>> {
        Ok(self
            .secrets
            .lock()
            .await
            .iter()
            .find(|secret| {
                secret.folder_id() == folder_id && secret.name() == name && secret.is_active()
            })
            .cloned())
    }

    async fn insert(&self, secret: Secret) -> AppResult<()> {
        self.secrets.lock().await.push(secret);
        Ok(())
    }

    async fn update(&self, secret: Secret) -> AppResult<()> {
        let mut secrets = self.secrets.lock().await;
        match secrets.iter_mut().find(|stored| stored.id() == secret.id()) {
            Some(stored) => {
                *stored = secret;
                Ok(())
            }
            None => Err(AppError::TargetNotFound(format!(
                "no secret '{}'",
                secret.id()
            ))),
        }
    }

    async fn list_active_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<Secret>> {
        Ok(self
            .secrets
            .lock()
            .await
            .iter()
            .filter(|secret| secret.folder_id() == folder_id && secret.is_active())
            .cloned()
            .collect())
    }
}

/// Marker-prefix cipher standing in for real encryption in service tests.
struct FakeEncryptor;

const MARKER: &[u8] = b"sealed:";

impl SecretEncryptor for FakeEncryptor {
    fn encrypt(&self, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        let mut ciphertext = MARKER.to_vec();
        ciphertext.extend_from_slice(plaintext);
        Ok(ciphertext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> AppResult<Vec<u8>> {
        ciphertext
            .strip_prefix(MARKER)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| AppError::Decrypt("missing marker".to_owned()))
    }
}

fn email(value: &str) -> EmailAddress {
    EmailAddress::new(value).unwrap_or_else(|_| panic!("test email"))
}

fn regular(value: &str) -> Identity {
    Identity::new(email(value), "User", "google", None)
}

fn guest(value: &str) -> Identity {
    let roles: BTreeSet<Role> = [Role::Guest].into_iter().collect();
    Identity::new(email(value), "Guest", "google", Some(roles))
}

fn service() -> FolderService {
    FolderService::new(
        Arc::new(FakeFolderStore::default()),
        Arc::new(FakeSecretStore::default()),
        Arc::new(FakeEncryptor),
    )
}

async fn create_folder(service: &FolderService, actor: &Identity, path: &str) -> Folder {
    let result = service
        .create_folder(
            actor,
            CreateFolderInput {
                name: "Folder".to_owned(),
                path: path.to_owned(),
                parent_id: None,
            },
        )
        .await;
    match result {
        Ok(folder) => folder,
        Err(error) => panic!("folder creation should succeed: {error}"),
    }
}

#[tokio::test]
async fn guest_cannot_create_folders() {
    let service = service();
    let actor = guest("guest@example.com");

    let result = service
        .create_folder(
            &actor,
            CreateFolderInput {
                name: "Prod".to_owned(),
                path: "/prod".to_owned(),
                parent_id: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::InsufficientPermissions(_))));
}

#[tokio::test]
async fn duplicate_active_path_is_rejected() {
    let service = service();
    let alice = regular("alice@example.com");
    create_folder(&service, &alice, "/prod").await;

    let result = service
        .create_folder(
            &alice,
            CreateFolderInput {
                name: "Prod again".to_owned(),
                path: "/prod".to_owned(),
                parent_id: None,
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::DuplicatePath(_))));
}

#[tokio::test]
async fn soft_deleted_path_may_be_reused() {
    let service = service();
    let alice = regular("alice@example.com");
    let folder = create_folder(&service, &alice, "/prod").await;

    let deleted = service.delete_folder(&alice, folder.id()).await;
    assert!(deleted.is_ok());

    let recreated = service
        .create_folder(
            &alice,
            CreateFolderInput {
                name: "Prod".to_owned(),
                path: "/prod".to_owned(),
                parent_id: None,
            },
        )
        .await;
    assert!(recreated.is_ok());
}

#[tokio::test]
async fn child_creation_requires_write_on_parent() {
    let service = service();
    let alice = regular("alice@example.com");
    let bob = regular("bob@example.com");
    let parent = create_folder(&service, &alice, "/prod").await;

    let denied = service
        .create_folder(
            &bob,
            CreateFolderInput {
                name: "Keys".to_owned(),
                path: "/prod/keys".to_owned(),
                parent_id: Some(parent.id()),
            },
        )
        .await;
    assert!(matches!(denied, Err(AppError::InsufficientPermissions(_))));

    let granted = service
        .grant_access(
            &alice,
            parent.id(),
            email("bob@example.com"),
            AccessType::Write,
        )
        .await;
    assert!(granted.is_ok());

    let allowed = service
        .create_folder(
            &bob,
            CreateFolderInput {
                name: "Keys".to_owned(),
                path: "/prod/keys".to_owned(),
                parent_id: Some(parent.id()),
            },
        )
        .await;
    assert!(allowed.is_ok());
}

#[tokio::test]
async fn write_grant_implies_read_but_not_admin() {
    let service = service();
    let alice = regular("alice@example.com");
    let folder = create_folder(&service, &alice, "/prod").await;

    let granted = service
        .grant_access(
            &alice,
            folder.id(),
            email("bob@example.com"),
            AccessType::Write,
        )
        .await;
    assert!(granted.is_ok());

    let bob = email("bob@example.com");
    assert!(matches!(
        service.has_access(folder.id(), &bob, AccessType::Read).await,
        Ok(true)
    ));
    assert!(matches!(
        service
            .has_access(folder.id(), &bob, AccessType::Admin)
            .await,
        Ok(false)
    ));
}

#[tokio::test]
async fn grants_never_downgrade() {
    let service = service();
    let alice = regular("alice@example.com");
    let folder = create_folder(&service, &alice, "/prod").await;

    let admin_grant = service
        .grant_access(
            &alice,
            folder.id(),
            email("bob@example.com"),
            AccessType::Admin,
        )
        .await;
    assert!(admin_grant.is_ok());

    let read_grant = service
        .grant_access(
            &alice,
            folder.id(),
            email("bob@example.com"),
            AccessType::Read,
        )
        .await;
    assert!(read_grant.is_ok());

    let bob = email("bob@example.com");
    assert!(matches!(
        service
            .has_access(folder.id(), &bob, AccessType::Admin)
            .await,
        Ok(true)
    ));
}

#[tokio::test]
async fn grant_requires_admin_access_on_folder() {
    let service = service();
    let alice = regular("alice@example.com");
    let bob = regular("bob@example.com");
    let folder = create_folder(&service, &alice, "/prod").await;

    let result = service
        .grant_access(
            &bob,
            folder.id(),
            email("carol@example.com"),
            AccessType::Read,
        )
        .await;
    assert!(matches!(result, Err(AppError::InsufficientPermissions(_))));
}

#[tokio::test]
async fn grants_do_not_inherit_to_children() {
    let service = service();
    let alice = regular("alice@example.com");
    let parent = create_folder(&service, &alice, "/prod").await;
    let child = service
        .create_folder(
            &alice,
            CreateFolderInput {
                name: "Keys".to_owned(),
                path: "/prod/keys".to_owned(),
                parent_id: Some(parent.id()),
            },
        )
        .await;
    let child = match child {
        Ok(folder) => folder,
        Err(error) => panic!("child creation should succeed: {error}"),
    };

    let granted = service
        .grant_access(
            &alice,
            parent.id(),
            email("bob@example.com"),
            AccessType::Admin,
        )
        .await;
    assert!(granted.is_ok());

    let bob = email("bob@example.com");
    assert!(matches!(
        service.has_access(child.id(), &bob, AccessType::Read).await,
        Ok(false)
    ));
}

#[tokio::test]
async fn secret_roundtrip_through_cipher() {
    let service = service();
    let alice = regular("alice@example.com");
    let folder = create_folder(&service, &alice, "/prod").await;

    let secret = service
        .create_secret(
            &alice,
            folder.id(),
            CreateSecretInput {
                name: "stripe_key".to_owned(),
                value: "sk_live_123".to_owned(),
            },
        )
        .await;
    let secret = match secret {
        Ok(secret) => secret,
        Err(error) => panic!("secret creation should succeed: {error}"),
    };
    assert_ne!(secret.encrypted_value(), b"sk_live_123");

    let value = service.secret_value(&alice, secret.id()).await;
    assert_eq!(value.ok().as_deref(), Some("sk_live_123"));
}

#[tokio::test]
async fn secret_value_requires_read_access() {
    let service = service();
    let alice = regular("alice@example.com");
    let bob = regular("bob@example.com");
    let folder = create_folder(&service, &alice, "/prod").await;

    let secret = service
        .create_secret(
            &alice,
            folder.id(),
            CreateSecretInput {
                name: "stripe_key".to_owned(),
                value: "sk_live_123".to_owned(),
            },
        )
        .await;
    let secret = match secret {
        Ok(secret) => secret,
        Err(error) => panic!("secret creation should succeed: {error}"),
    };

    let denied = service.secret_value(&bob, secret.id()).await;
    assert!(matches!(denied, Err(AppError::InsufficientPermissions(_))));

    let granted = service
        .grant_access(
            &alice,
            folder.id(),
            email("bob@example.com"),
            AccessType::Read,
        )
        .await;
    assert!(granted.is_ok());

    let value = service.secret_value(&bob, secret.id()).await;
    assert_eq!(value.ok().as_deref(), Some("sk_live_123"));
}

#[tokio::test]
async fn read_grant_does_not_allow_secret_creation() {
    let service = service();
    let alice = regular("alice@example.com");
    let bob = regular("bob@example.com");
    let folder = create_folder(&service, &alice, "/prod").await;

    let granted = service
        .grant_access(
            &alice,
            folder.id(),
            email("bob@example.com"),
            AccessType::Read,
        )
        .await;
    assert!(granted.is_ok());

    let result = service
        .create_secret(
            &bob,
            folder.id(),
            CreateSecretInput {
                name: "stripe_key".to_owned(),
                value: "sk_live_123".to_owned(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::InsufficientPermissions(_))));
}

#[tokio::test]
async fn duplicate_active_secret_name_conflicts() {
    let service = service();
    let alice = regular("alice@example.com");
    let folder = create_folder(&service, &alice, "/prod").await;

    let first = service
        .create_secret(
            &alice,
            folder.id(),
            CreateSecretInput {
                name: "stripe_key".to_owned(),
                value: "one".to_owned(),
            },
        )
        .await;
    assert!(first.is_ok());

    let second = service
        .create_secret(
            &alice,
            folder.id(),
            CreateSecretInput {
                name: "stripe_key".to_owned(),
                value: "two".to_owned(),
            },
        )
        .await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn deleting_folder_hides_its_secrets_and_descendants() {
    let service = service();
    let alice = regular("alice@example.com");
    let parent = create_folder(&service, &alice, "/prod").await;
    let child = service
        .create_folder(
            &alice,
            CreateFolderInput {
                name: "Keys".to_owned(),
                path: "/prod/keys".to_owned(),
                parent_id: Some(parent.id()),
            },
        )
        .await;
    let child = match child {
        Ok(folder) => folder,
        Err(error) => panic!("child creation should succeed: {error}"),
    };

    let secret = service
        .create_secret(
            &alice,
            parent.id(),
            CreateSecretInput {
                name: "stripe_key".to_owned(),
                value: "sk_live_123".to_owned(),
            },
        )
        .await;
    let secret = match secret {
        Ok(secret) => secret,
        Err(error) => panic!("secret creation should succeed: {error}"),
    };

    let deleted = service.delete_folder(&alice, parent.id()).await;
    assert!(deleted.is_ok());

    assert!(matches!(
        service.folder(&alice, child.id()).await,
        Err(AppError::TargetNotFound(_))
    ));
    assert!(matches!(
        service.secret_value(&alice, secret.id()).await,
        Err(AppError::TargetNotFound(_))
    ));
}

#[tokio::test]
async fn update_secret_value_reencrypts() {
    let service = service();
    let alice = regular("alice@example.com");
    let folder = create_folder(&service, &alice, "/prod").await;

    let secret = service
        .create_secret(
            &alice,
            folder.id(),
            CreateSecretInput {
                name: "stripe_key".to_owned(),
                value: "old".to_owned(),
            },
        )
        .await;
    let secret = match secret {
        Ok(secret) => secret,
        Err(error) => panic!("secret creation should succeed: {error}"),
    };

    let updated = service
        .update_secret_value(&alice, secret.id(), "new".to_owned())
        .await;
    assert!(updated.is_ok());

    let value = service.secret_value(&alice, secret.id()).await;
    assert_eq!(value.ok().as_deref(), Some("new"));
}

#[tokio::test]
async fn deleted_secret_is_unreachable() {
    let service = service();
    let alice = regular("alice@example.com");
    let folder = create_folder(&service, &alice, "/prod").await;

    let secret = service
        .create_secret(
            &alice,
            folder.id(),
            CreateSecretInput {
                name: "stripe_key".to_owned(),
                value: "sk_live_123".to_owned(),
            },
        )
        .await;
    let secret = match secret {
        Ok(secret) => secret,
        Err(error) => panic!("secret creation should succeed: {error}"),
    };

    let deleted = service.delete_secret(&alice, secret.id()).await;
    assert!(deleted.is_ok());

    assert!(matches!(
        service.secret_value(&alice, secret.id()).await,
        Err(AppError::TargetNotFound(_))
    ));
}

#[tokio::test]
async fn list_accessible_unions_created_and_granted() {
    let service = service();
    let alice = regular("alice@example.com");
    let bob = regular("bob@example.com");

    let alices = create_folder(&service, &alice, "/alice").await;
    create_folder(&service, &bob, "/bob").await;
    let shared = create_folder(&service, &alice, "/shared").await;

    let granted = service
        .grant_access(
            &alice,
            shared.id(),
            email("bob@example.com"),
            AccessType::Read,
        )
        .await;
    assert!(granted.is_ok());

    let accessible = service.list_accessible(&bob).await;
    let accessible = match accessible {
        Ok(folders) => folders,
        Err(error) => panic!("listing should succeed: {error}"),
    };
    let paths: Vec<&str> = accessible.iter().map(Folder::path).collect();
    assert_eq!(paths, vec!["/bob", "/shared"]);
    assert!(!paths.contains(&alices.path()));
}

#[tokio::test]
async fn list_children_filters_unreadable_folders() {
    let service = service();
    let alice = regular("alice@example.com");
    let bob = regular("bob@example.com");
    let parent = create_folder(&service, &alice, "/prod").await;

    for path in ["/prod/keys", "/prod/tokens"] {
        let child = service
            .create_folder(
                &alice,
                CreateFolderInput {
                    name: "Child".to_owned(),
                    path: path.to_owned(),
                    parent_id: Some(parent.id()),
                },
            )
            .await;
        assert!(child.is_ok());
    }

    let keys = service.folders.find_active_by_path("/prod/keys").await;
    let keys = match keys {
        Ok(Some(folder)) => folder,
        _ => panic!("child folder should exist"),
    };

    for (folder_id, access) in [
        (parent.id(), AccessType::Read),
        (keys.id(), AccessType::Read),
    ] {
        let granted = service
            .grant_access(&alice, folder_id, email("bob@example.com"), access)
            .await;
        assert!(granted.is_ok());
    }

    let children = service.list_children(&bob, parent.id()).await;
    let children = match children {
        Ok(folders) => folders,
        Err(error) => panic!("listing should succeed: {error}"),
    };
    let paths: Vec<&str> = children.iter().map(Folder::path).collect();
    assert_eq!(paths, vec!["/prod/keys"]);
}

#[tokio::test]
async fn folder_grants_require_admin_access() {
    let service = service();
    let alice = regular("alice@example.com");
    let bob = regular("bob@example.com");
    let folder = create_folder(&service, &alice, "/prod").await;

    let granted = service
        .grant_access(
            &alice,
            folder.id(),
            email("bob@example.com"),
            AccessType::Write,
        )
        .await;
    assert!(granted.is_ok());

    let denied = service.folder_grants(&bob, folder.id()).await;
    assert!(matches!(denied, Err(AppError::InsufficientPermissions(_))));

    let listed = service.folder_grants(&alice, folder.id()).await;
    let listed = match listed {
        Ok(grants) => grants,
        Err(error) => panic!("listing should succeed: {error}"),
    };
    assert_eq!(listed.len(), 1);
}
