//! Scripted walkthrough of the secrets custody services.
//!
//! Wires the in-memory stores and the AES cipher into the application
//! services, then plays through the administrative and folder flows: seed an
//! administrator and a regular user, grant folder access, store a secret, and
//! read its value back through the access checks.

#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::env;
use std::sync::Arc;

use bottled_application::{
    CreateFolderInput, CreateSecretInput, FolderService, IdentityStore, RoleService,
};
use bottled_core::AppError;
use bottled_domain::{AccessType, EmailAddress, Identity, Role};
use bottled_infrastructure::{
    AesSecretEncryptor, InMemoryFolderStore, InMemoryIdentityStore, InMemorySecretStore,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let encryption_key = required_env("SECRETS_ENCRYPTION_KEY")?;
    let encryptor = Arc::new(AesSecretEncryptor::from_hex(&encryption_key)?);

    let identity_store = Arc::new(InMemoryIdentityStore::new());
    let folder_store = Arc::new(InMemoryFolderStore::new());
    let secret_store = Arc::new(InMemorySecretStore::new());

    let role_service = RoleService::new(identity_store.clone());
    let folder_service = FolderService::new(folder_store, secret_store, encryptor);

    // Seed an administrator and a regular user, as an identity provider
    // callback would.
    let admin_email = EmailAddress::new("admin@example.com")?;
    let admin_roles: BTreeSet<Role> = [Role::Administrator].into_iter().collect();
    let admin = Identity::new(admin_email.clone(), "Ada Admin", "google", Some(admin_roles));
    identity_store.save(admin.clone()).await?;

    let bob_email = EmailAddress::new("bob@example.com")?;
    let bob = Identity::new(bob_email.clone(), "Bob Builder", "azure", None);
    identity_store.save(bob.clone()).await?;

    for user in role_service.list_users(&admin).await? {
        info!(
            email = %user.email(),
            roles = ?user.roles(),
            "seeded user"
        );
    }

    // The administrator promotes Bob, then the folder flows run as Bob.
    let bob = role_service.assign(&admin, &bob_email, Role::RegularUser).await?;

    let folder = folder_service
        .create_folder(
            &admin,
            CreateFolderInput {
                name: "Production".to_owned(),
                path: "/production".to_owned(),
                parent_id: None,
            },
        )
        .await?;
    info!(path = folder.path(), "folder ready");

    folder_service
        .grant_access(&admin, folder.id(), bob_email.clone(), AccessType::Write)
        .await?;

    let secret = folder_service
        .create_secret(
            &bob,
            folder.id(),
            CreateSecretInput {
                name: "stripe_api_key".to_owned(),
                value: "sk_live_demo_value".to_owned(),
            },
        )
        .await?;

    let value = folder_service.secret_value(&bob, secret.id()).await?;
    info!(
        name = secret.name(),
        recovered = value == "sk_live_demo_value",
        "secret stored and read back"
    );

    for grant in folder_service.folder_grants(&admin, folder.id()).await? {
        info!(
            grantee = %grant.user_email(),
            level = grant.access_level(),
            "folder grant"
        );
    }

    let statistics = role_service.role_statistics(&admin).await?;
    info!(?statistics, "role statistics");

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
