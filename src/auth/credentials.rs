//! Credential Verifier: resolve a login identifier and check its password.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{
    identity::Identity,
    password::{PasswordError, PasswordHasher},
    store::IdentityStore,
};

/// Why a login attempt was rejected.
///
/// The credential kinds are for logs only; the HTTP boundary renders all of
/// them identically.
#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("identity not found")]
    IdentityNotFound,

    #[error("no password credentials set")]
    NoCredentialsSet,

    #[error("invalid password")]
    InvalidPassword,

    #[error("identity store failure: {0:#}")]
    Store(anyhow::Error),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl AuthFailure {
    /// Stable name of the failure kind, used as a log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "MissingCredentials",
            Self::IdentityNotFound => "IdentityNotFound",
            Self::NoCredentialsSet => "NoCredentialsSet",
            Self::InvalidPassword => "InvalidPassword",
            Self::Store(_) => "Store",
            Self::Password(_) => "Password",
        }
    }

    /// True for rejections caused by what the caller submitted, as opposed to
    /// infrastructure failures.
    #[must_use]
    pub const fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials
                | Self::IdentityNotFound
                | Self::NoCredentialsSet
                | Self::InvalidPassword
        )
    }
}

/// Which column a login identifier is matched against.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginIdentifier {
    Email(String),
    Username(String),
}

impl LoginIdentifier {
    /// Classify and normalize a raw identifier. Anything containing `@` is an
    /// email; everything else is a username. Both are lowercased.
    ///
    /// Returns `None` when the identifier is blank.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let normalized = trimmed.to_lowercase();
        if normalized.contains('@') {
            Some(Self::Email(normalized))
        } else {
            Some(Self::Username(normalized))
        }
    }
}

#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn IdentityStore>,
    hasher: PasswordHasher,
    // Digest of a password no account holds, with the same parameters as
    // real digests.
    dummy_digest: String,
}

impl CredentialVerifier {
    /// # Errors
    /// Returns `PasswordError::HashingFailed` if the dummy digest cannot be built.
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: PasswordHasher,
    ) -> Result<Self, PasswordError> {
        let dummy_digest = hasher.hash(&Uuid::new_v4().to_string())?;
        Ok(Self {
            store,
            hasher,
            dummy_digest,
        })
    }

    /// Spend one digest comparison on an account that cannot log in, so
    /// every rejected attempt with a non-blank identifier costs the same.
    async fn verify_dummy(&self, password: &str) -> Result<(), PasswordError> {
        self.hasher
            .verify_blocking(password.to_string(), self.dummy_digest.clone())
            .await
            .map(|_| ())
    }

    /// Resolve `identifier` and check `password` against the stored digest.
    ///
    /// Performs at most one store read; blank input performs none.
    ///
    /// # Errors
    /// Returns an `AuthFailure` describing why the attempt was rejected.
    #[instrument(skip_all)]
    pub async fn verify(&self, identifier: &str, password: &str) -> Result<Identity, AuthFailure> {
        if password.is_empty() {
            return Err(AuthFailure::MissingCredentials);
        }
        let Some(identifier) = LoginIdentifier::parse(identifier) else {
            return Err(AuthFailure::MissingCredentials);
        };

        let found = match &identifier {
            LoginIdentifier::Email(email) => self.store.find_by_email(email).await,
            LoginIdentifier::Username(username) => self.store.find_by_username(username).await,
        }
        .map_err(AuthFailure::Store)?;

        let Some(stored) = found else {
            self.verify_dummy(password).await?;
            return Err(AuthFailure::IdentityNotFound);
        };
        let Some(digest) = stored.password_hash.clone() else {
            self.verify_dummy(password).await?;
            return Err(AuthFailure::NoCredentialsSet);
        };

        if self
            .hasher
            .verify_blocking(password.to_string(), digest)
            .await?
        {
            debug!(subject = %stored.identity.id, "credentials verified");
            Ok(stored.into_identity())
        } else {
            Err(AuthFailure::InvalidPassword)
        }
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier").finish_non_exhaustive()
    }
}
