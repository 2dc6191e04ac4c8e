//! Startup provisioning of the first super admin account.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use super::handlers::auth::AuthState;
use crate::auth::{
    identity::NewIdentity,
    store::CreateOutcome,
    validation::{normalize_email, validate_password},
    Role,
};

#[derive(Debug, Clone)]
pub struct SuperAdmin {
    pub email: String,
    pub password: SecretString,
}

/// Create the super admin unless an account with that email already exists.
///
/// # Errors
/// Returns an error for invalid input or a store failure.
pub async fn ensure_super_admin(auth_state: &AuthState, super_admin: &SuperAdmin) -> Result<()> {
    let email = normalize_email(&super_admin.email)
        .map_err(|err| anyhow::anyhow!("super admin email: {err}"))?;
    validate_password(super_admin.password.expose_secret())
        .map_err(|err| anyhow::anyhow!("super admin password: {err}"))?;

    if let Some(existing) = auth_state.store().find_by_email(&email).await? {
        if existing.identity.role == Role::SuperAdmin {
            info!("Super admin {email} already present");
        } else {
            warn!(
                role = %existing.identity.role,
                "Bootstrap email {email} belongs to a non super admin account; leaving it untouched"
            );
        }
        return Ok(());
    }

    let password_hash = auth_state
        .hasher()
        .hash_blocking(super_admin.password.expose_secret().to_string())
        .await
        .context("Failed to hash super admin password")?;
    let outcome = auth_state
        .store()
        .create(NewIdentity {
            email: email.clone(),
            username: None,
            password_hash: Some(password_hash),
            role: Role::SuperAdmin,
        })
        .await?;

    match outcome {
        CreateOutcome::Created(identity) => {
            info!(subject = %identity.id, "Super admin {email} created");
        }
        // Lost a race with another instance.
        CreateOutcome::EmailTaken | CreateOutcome::UsernameTaken => {
            info!("Super admin {email} created concurrently");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::handlers::auth::AuthConfig,
        auth::store::{IdentityStore, MemoryIdentityStore},
    };
    use std::sync::Arc;

    fn state(store: Arc<MemoryIdentityStore>) -> Result<AuthState> {
        AuthState::new(
            AuthConfig::new("http://localhost:3000".to_string()).with_password_hash_cost(1),
            &SecretString::from("0123456789abcdef0123456789abcdef".to_string()),
            store,
        )
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() -> Result<()> {
        let store = Arc::new(MemoryIdentityStore::new());
        let auth_state = state(store.clone())?;
        let super_admin = SuperAdmin {
            email: "Root@BeatCode.com".to_string(),
            password: SecretString::from("root-password".to_string()),
        };

        ensure_super_admin(&auth_state, &super_admin).await?;
        ensure_super_admin(&auth_state, &super_admin).await?;

        let admins = store.list(&[Role::SuperAdmin]).await?;
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].email, "root@beatcode.com");

        let identity = auth_state
            .verifier()
            .verify("root@beatcode.com", "root-password")
            .await?;
        assert_eq!(identity.role, Role::SuperAdmin);
        Ok(())
    }

    #[tokio::test]
    async fn bootstrap_rejects_short_password() -> Result<()> {
        let auth_state = state(Arc::new(MemoryIdentityStore::new()))?;
        let super_admin = SuperAdmin {
            email: "root@beatcode.com".to_string(),
            password: SecretString::from("short".to_string()),
        };
        assert!(ensure_super_admin(&auth_state, &super_admin).await.is_err());
        Ok(())
    }
}
