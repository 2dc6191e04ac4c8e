//! Auth state and configuration shared with handlers.

use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;

use crate::auth::{
    password::{PasswordHasher, DEFAULT_HASH_COST},
    session::{SessionKeys, DEFAULT_SESSION_TTL_SECONDS},
    store::IdentityStore,
    CredentialVerifier,
};

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_ttl_seconds: u64,
    password_hash_cost: u32,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            password_hash_cost: DEFAULT_HASH_COST,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.password_hash_cost = cost;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn password_hash_cost(&self) -> u32 {
        self.password_hash_cost
    }

    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    keys: SessionKeys,
    hasher: PasswordHasher,
    store: Arc<dyn IdentityStore>,
    verifier: CredentialVerifier,
}

impl AuthState {
    /// # Errors
    /// Returns an error if the session secret or hashing cost is rejected.
    pub fn new(
        config: AuthConfig,
        session_secret: &SecretString,
        store: Arc<dyn IdentityStore>,
    ) -> Result<Self> {
        let keys = SessionKeys::new(session_secret, config.session_ttl_seconds())
            .context("Invalid session configuration")?;
        let hasher = PasswordHasher::new(config.password_hash_cost())
            .context("Invalid password hash cost")?;
        let verifier = CredentialVerifier::new(store.clone(), hasher.clone())
            .context("Failed to prepare credential verifier")?;
        Ok(Self {
            config,
            keys,
            hasher,
            store,
            verifier,
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    #[must_use]
    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    #[must_use]
    pub fn store(&self) -> &dyn IdentityStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn verifier(&self) -> &CredentialVerifier {
        &self.verifier
    }
}
