//! In-process identity store used by tests and local tooling.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CreateOutcome, IdentityStore, UpdateOutcome};
use crate::auth::{
    identity::{Identity, IdentityChanges, NewIdentity, StoredIdentity},
    role::Role,
};

/// Identity store backed by a `Vec`, newest entries last.
///
/// Every credential lookup (`find_by_email`, `find_by_username`) bumps a
/// counter so callers can assert whether the store was consulted at all.
#[derive(Default)]
pub struct MemoryIdentityStore {
    records: RwLock<Vec<StoredIdentity>>,
    credential_reads: AtomicUsize,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as-is, bypassing uniqueness checks.
    pub async fn insert(&self, record: StoredIdentity) {
        self.records.write().await.push(record);
    }

    /// Number of credential lookups served so far.
    #[must_use]
    pub fn credential_reads(&self) -> usize {
        self.credential_reads.load(Ordering::SeqCst)
    }
}

fn conflict(
    records: &[StoredIdentity],
    skip: Option<Uuid>,
    email: &str,
    username: Option<&str>,
) -> Option<UpdateOutcome> {
    let others = records
        .iter()
        .filter(|record| Some(record.identity.id) != skip);
    for record in others {
        if record.identity.email == email {
            return Some(UpdateOutcome::EmailTaken);
        }
        if username.is_some() && record.identity.username.as_deref() == username {
            return Some(UpdateOutcome::UsernameTaken);
        }
    }
    None
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredIdentity>> {
        self.credential_reads.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|record| record.identity.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<StoredIdentity>> {
        self.credential_reads.fetch_add(1, Ordering::SeqCst);
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|record| record.identity.username.as_deref() == Some(username))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|record| record.identity.id == id)
            .map(|record| record.identity.clone()))
    }

    async fn list(&self, roles: &[Role]) -> Result<Vec<Identity>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|record| roles.contains(&record.identity.role))
            .map(|record| record.identity.clone())
            .collect())
    }

    async fn create(&self, new: NewIdentity) -> Result<CreateOutcome> {
        let mut records = self.records.write().await;
        match conflict(&records, None, &new.email, new.username.as_deref()) {
            Some(UpdateOutcome::EmailTaken) => return Ok(CreateOutcome::EmailTaken),
            Some(_) => return Ok(CreateOutcome::UsernameTaken),
            None => {}
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            email: new.email,
            username: new.username,
            role: new.role,
        };
        records.push(StoredIdentity {
            identity: identity.clone(),
            password_hash: new.password_hash,
        });
        Ok(CreateOutcome::Created(identity))
    }

    async fn update(&self, id: Uuid, changes: IdentityChanges) -> Result<UpdateOutcome> {
        let mut records = self.records.write().await;
        let Some(index) = records.iter().position(|record| record.identity.id == id) else {
            return Ok(UpdateOutcome::NotFound);
        };

        let current = &records[index].identity;
        let email = changes.email.unwrap_or_else(|| current.email.clone());
        let username = changes.username.or_else(|| current.username.clone());
        let role = changes.role.unwrap_or(current.role);

        if let Some(outcome) = conflict(&records, Some(id), &email, username.as_deref()) {
            return Ok(outcome);
        }

        let record = &mut records[index];
        record.identity.email = email;
        record.identity.username = username;
        record.identity.role = role;
        Ok(UpdateOutcome::Updated(record.identity.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.identity.id != id);
        Ok(records.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_identity(email: &str, username: Option<&str>, role: Role) -> NewIdentity {
        NewIdentity {
            email: email.to_string(),
            username: username.map(str::to_string),
            password_hash: None,
            role,
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicates() -> Result<()> {
        let store = MemoryIdentityStore::new();
        let first = store
            .create(new_identity("a@beatcode.com", Some("alice"), Role::User))
            .await?;
        assert!(matches!(first, CreateOutcome::Created(_)));

        let same_email = store
            .create(new_identity("a@beatcode.com", Some("other"), Role::User))
            .await?;
        assert!(matches!(same_email, CreateOutcome::EmailTaken));

        let same_username = store
            .create(new_identity("b@beatcode.com", Some("alice"), Role::User))
            .await?;
        assert!(matches!(same_username, CreateOutcome::UsernameTaken));

        // Several accounts without a username must coexist.
        store
            .create(new_identity("c@beatcode.com", None, Role::User))
            .await?;
        let no_username = store
            .create(new_identity("d@beatcode.com", None, Role::User))
            .await?;
        assert!(matches!(no_username, CreateOutcome::Created(_)));
        Ok(())
    }

    #[tokio::test]
    async fn credential_reads_are_counted() -> Result<()> {
        let store = MemoryIdentityStore::new();
        assert_eq!(store.credential_reads(), 0);
        store.find_by_email("x@beatcode.com").await?;
        store.find_by_username("x").await?;
        assert_eq!(store.credential_reads(), 2);
        store.list(&Role::ALL).await?;
        assert_eq!(store.credential_reads(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete() -> Result<()> {
        let store = MemoryIdentityStore::new();
        let CreateOutcome::Created(alice) = store
            .create(new_identity("a@beatcode.com", Some("alice"), Role::User))
            .await?
        else {
            anyhow::bail!("expected created");
        };
        store
            .create(new_identity("b@beatcode.com", Some("bob"), Role::User))
            .await?;

        let changes = IdentityChanges {
            username: Some("bob".to_string()),
            ..IdentityChanges::default()
        };
        assert!(matches!(
            store.update(alice.id, changes).await?,
            UpdateOutcome::UsernameTaken
        ));

        let changes = IdentityChanges {
            role: Some(Role::Admin),
            ..IdentityChanges::default()
        };
        let UpdateOutcome::Updated(updated) = store.update(alice.id, changes).await? else {
            anyhow::bail!("expected updated");
        };
        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.username.as_deref(), Some("alice"));

        assert_eq!(store.list(&[Role::Admin]).await?.len(), 1);
        assert!(store.delete(alice.id).await?);
        assert!(!store.delete(alice.id).await?);
        assert!(matches!(
            store.update(alice.id, IdentityChanges::default()).await?,
            UpdateOutcome::NotFound
        ));
        Ok(())
    }
}
