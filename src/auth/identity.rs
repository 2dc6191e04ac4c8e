//! Identity records as seen by the auth core.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::role::Role;

/// Public identity fields. Never carries the password hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub role: Role,
}

/// Identity as stored, including the credential digest.
///
/// `password_hash` is `None` for federated (OAuth-only) accounts; that is a
/// valid state, not a corrupt record.
#[derive(Clone)]
pub struct StoredIdentity {
    pub identity: Identity,
    pub password_hash: Option<String>,
}

impl StoredIdentity {
    /// Drop the credential digest.
    #[must_use]
    pub fn into_identity(self) -> Identity {
        self.identity
    }
}

impl std::fmt::Debug for StoredIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredIdentity")
            .field("identity", &self.identity)
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

/// Already normalized and validated fields for a new identity.
#[derive(Clone, Debug)]
pub struct NewIdentity {
    pub email: String,
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Role,
}

/// Partial update applied by account management. `None` leaves a field as is.
#[derive(Clone, Debug, Default)]
pub struct IdentityChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
}

impl IdentityChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.role.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_masks_password_hash() {
        let stored = StoredIdentity {
            identity: Identity {
                id: Uuid::nil(),
                email: "alice@beatcode.com".to_string(),
                username: Some("alice".to_string()),
                role: Role::User,
            },
            password_hash: Some("$argon2id$secret".to_string()),
        };
        let rendered = format!("{stored:?}");
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn identity_serializes_without_hash() -> anyhow::Result<()> {
        let identity = Identity {
            id: Uuid::nil(),
            email: "bob@beatcode.com".to_string(),
            username: None,
            role: Role::Admin,
        };
        let value = serde_json::to_value(&identity)?;
        assert_eq!(value["role"], "ADMIN");
        assert!(value.get("password_hash").is_none());
        Ok(())
    }

    #[test]
    fn identity_changes_empty() {
        assert!(IdentityChanges::default().is_empty());
        let changes = IdentityChanges {
            role: Some(Role::Admin),
            ..IdentityChanges::default()
        };
        assert!(!changes.is_empty());
    }
}
