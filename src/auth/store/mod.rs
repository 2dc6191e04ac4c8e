//! Identity Store boundary.
//!
//! The auth core only reads identities to verify credentials; account
//! management (registration, admin user operations) writes through the same
//! trait so both sides agree on normalization and uniqueness.
//!
//! Lookups expect values already normalized to lowercase and match exactly.

mod memory;
mod postgres;

pub use memory::MemoryIdentityStore;
pub use postgres::PgIdentityStore;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use super::{
    identity::{Identity, IdentityChanges, NewIdentity, StoredIdentity},
    role::Role,
};

/// Outcome of inserting a new identity.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Identity),
    EmailTaken,
    UsernameTaken,
}

/// Outcome of updating an existing identity.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(Identity),
    NotFound,
    EmailTaken,
    UsernameTaken,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<StoredIdentity>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<StoredIdentity>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>>;

    /// List identities holding one of `roles`, newest first.
    async fn list(&self, roles: &[Role]) -> Result<Vec<Identity>>;

    async fn create(&self, identity: NewIdentity) -> Result<CreateOutcome>;

    async fn update(&self, id: Uuid, changes: IdentityChanges) -> Result<UpdateOutcome>;

    /// Returns `false` when no identity had that id.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}
