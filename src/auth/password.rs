//! Password hashing and verification using Argon2id.
//!
//! The time cost is configuration (`--password-hash-cost`), not a constant,
//! so it can be raised without a release. Digests are PHC strings and carry
//! their own parameters, so raising the cost never invalidates old hashes.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use thiserror::Error;

pub const DEFAULT_HASH_COST: u32 = 2;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid hashing cost: {0}")]
    InvalidCost(String),

    #[error("password hashing failed")]
    HashingFailed,

    #[error("stored password hash is malformed")]
    MalformedHash,

    #[error("password worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Argon2id hasher. Clones share one verification counter.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    verifications: Arc<AtomicUsize>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("verifications", &self.verifications())
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// Build a hasher with the given Argon2 time cost (iterations).
    ///
    /// # Errors
    /// Returns `PasswordError::InvalidCost` if Argon2 rejects the parameters.
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        let params = Params::new(
            Params::DEFAULT_M_COST,
            cost,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| PasswordError::InvalidCost(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            verifications: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Number of digest comparisons run so far, across clones.
    #[must_use]
    pub fn verifications(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }

    /// Hash a plaintext password into a PHC string.
    ///
    /// # Errors
    /// Returns `PasswordError::HashingFailed` if Argon2 fails.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|_| PasswordError::HashingFailed)
    }

    /// Compare a plaintext password against a stored digest.
    ///
    /// # Errors
    /// Returns `PasswordError::MalformedHash` if `digest` is not a PHC string.
    pub fn verify(&self, password: &str, digest: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(digest).map_err(|_| PasswordError::MalformedHash)?;
        self.verifications.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// [`Self::hash`] on the blocking pool.
    ///
    /// # Errors
    /// Same as [`Self::hash`], plus `PasswordError::Worker` if the task panics.
    pub async fn hash_blocking(&self, password: String) -> Result<String, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }

    /// [`Self::verify`] on the blocking pool.
    ///
    /// # Errors
    /// Same as [`Self::verify`], plus `PasswordError::Worker` if the task panics.
    pub async fn verify_blocking(
        &self,
        password: String,
        digest: String,
    ) -> Result<bool, PasswordError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Result<PasswordHasher, PasswordError> {
        PasswordHasher::new(1)
    }

    #[test]
    fn hash_and_verify() -> anyhow::Result<()> {
        let hasher = hasher()?;
        let digest = hasher.hash("correct horse battery")?;
        assert!(digest.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse battery", &digest)?);
        assert!(!hasher.verify("wrong horse battery", &digest)?);
        Ok(())
    }

    #[test]
    fn salts_differ_per_hash() -> anyhow::Result<()> {
        let hasher = hasher()?;
        let first = hasher.hash("password123")?;
        let second = hasher.hash("password123")?;
        assert_ne!(first, second);
        assert!(hasher.verify("password123", &second)?);
        Ok(())
    }

    #[test]
    fn malformed_digest_is_an_error() -> anyhow::Result<()> {
        let hasher = hasher()?;
        assert!(matches!(
            hasher.verify("password123", "plaintext"),
            Err(PasswordError::MalformedHash)
        ));
        Ok(())
    }

    #[test]
    fn digest_from_other_cost_still_verifies() -> anyhow::Result<()> {
        let cheap = PasswordHasher::new(1)?;
        let digest = cheap.hash("password123")?;
        let costly = PasswordHasher::new(3)?;
        assert!(costly.verify("password123", &digest)?);
        Ok(())
    }

    #[test]
    fn zero_cost_rejected() {
        assert!(matches!(
            PasswordHasher::new(0),
            Err(PasswordError::InvalidCost(_))
        ));
    }

    #[test]
    fn clones_share_verification_count() -> anyhow::Result<()> {
        let hasher = hasher()?;
        let clone = hasher.clone();
        let digest = hasher.hash("password123")?;
        assert_eq!(hasher.verifications(), 0);

        clone.verify("password123", &digest)?;
        hasher.verify("nope", &digest)?;
        assert_eq!(hasher.verifications(), 2);
        assert_eq!(clone.verifications(), 2);

        // Malformed digests never reach Argon2.
        let _ = hasher.verify("password123", "plaintext");
        assert_eq!(hasher.verifications(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn blocking_variants_round_trip() -> anyhow::Result<()> {
        let hasher = hasher()?;
        let digest = hasher.hash_blocking("password123".to_string()).await?;
        assert!(
            hasher
                .verify_blocking("password123".to_string(), digest)
                .await?
        );
        Ok(())
    }
}
