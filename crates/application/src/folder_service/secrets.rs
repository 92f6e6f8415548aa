use bottled_core::{AppError, AppResult, NonEmptyString};
use bottled_domain::{AccessType, FolderId, Identity, Permission, Secret, SecretId};
use tracing::info;

use super::{CreateSecretInput, FolderService};

impl FolderService {
    /// Creates a secret in a folder the actor can write to.
    ///
    /// The plaintext value is encrypted through the secret cipher before it
    /// reaches the store; the name must be unused among the folder's active
    /// secrets.
    pub async fn create_secret(
        &self,
        actor: &Identity,
        folder_id: FolderId,
        input: CreateSecretInput,
    ) -> AppResult<Secret> {
        self.require_permission(actor, Permission::ManageSecrets)?;

        let folder = self.find_active_folder(folder_id).await?;
        self.require_folder_access(actor, &folder, AccessType::Write)
            .await?;

        let name = NonEmptyString::new(input.name)?;
        if input.value.trim().is_empty() {
            return Err(AppError::Validation(
                "secret value must not be empty".to_owned(),
            ));
        }

        if self
            .secrets
            .find_active_by_name(folder_id, name.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "a secret named '{}' already exists in folder '{}'",
                name.as_str(),
                folder.path()
            )));
        }

        let ciphertext = self.encryptor.encrypt(input.value.as_bytes())?;
        let secret = Secret::new(name, ciphertext, folder_id, actor.email().clone());
        self.secrets.insert(secret.clone()).await?;

        info!(
            actor = %actor.email(),
            path = folder.path(),
            name = secret.name(),
            "secret created"
        );
        Ok(secret)
    }

    /// Lists a folder's active secrets (metadata only, values stay encrypted).
    pub async fn list_secrets(
        &self,
        actor: &Identity,
        folder_id: FolderId,
    ) -> AppResult<Vec<Secret>> {
        self.require_permission(actor, Permission::AccessSecrets)?;

        let folder = self.find_active_folder(folder_id).await?;
        self.require_folder_access(actor, &folder, AccessType::Read)
            .await?;
        self.secrets.list_active_in_folder(folder_id).await
    }

    /// Decrypts and returns a secret value for an actor with Read access to
    /// the owning folder.
    pub async fn secret_value(&self, actor: &Identity, secret_id: SecretId) -> AppResult<String> {
        self.require_permission(actor, Permission::AccessSecrets)?;

        let secret = self.find_active_secret(secret_id).await?;
        // Resolving the owning folder also hides secrets whose folder was
        // soft-deleted.
        let folder = self.find_active_folder(secret.folder_id()).await?;
        self.require_folder_access(actor, &folder, AccessType::Read)
            .await?;

        let plaintext = self.encryptor.decrypt(secret.encrypted_value())?;
        String::from_utf8(plaintext)
            .map_err(|_| AppError::Internal("secret value is not valid utf-8".to_owned()))
    }

    /// Replaces a secret's value, re-encrypting the new plaintext.
    pub async fn update_secret_value(
        &self,
        actor: &Identity,
        secret_id: SecretId,
        value: String,
    ) -> AppResult<Secret> {
        self.require_permission(actor, Permission::ManageSecrets)?;

        let mut secret = self.find_active_secret(secret_id).await?;
        let folder = self.find_active_folder(secret.folder_id()).await?;
        self.require_folder_access(actor, &folder, AccessType::Write)
            .await?;

        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "secret value must not be empty".to_owned(),
            ));
        }

        secret.set_encrypted_value(self.encryptor.encrypt(value.as_bytes())?);
        self.secrets.update(secret.clone()).await?;

        info!(
            actor = %actor.email(),
            path = folder.path(),
            name = secret.name(),
            "secret value updated"
        );
        Ok(secret)
    }

    /// Soft-deletes a secret.
    pub async fn delete_secret(&self, actor: &Identity, secret_id: SecretId) -> AppResult<()> {
        self.require_permission(actor, Permission::ManageSecrets)?;

        let mut secret = self.find_active_secret(secret_id).await?;
        let folder = self.find_active_folder(secret.folder_id()).await?;
        self.require_folder_access(actor, &folder, AccessType::Write)
            .await?;

        secret.deactivate();
        let name = secret.name().to_owned();
        self.secrets.update(secret).await?;

        info!(
            actor = %actor.email(),
            path = folder.path(),
            name = name.as_str(),
            "secret deactivated"
        );
        Ok(())
    }

    async fn find_active_secret(&self, secret_id: SecretId) -> AppResult<Secret> {
        self.secrets
            .find_active(secret_id)
            .await?
            .ok_or_else(|| AppError::TargetNotFound(format!("no active secret '{secret_id}'")))
    }
}
