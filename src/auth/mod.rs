//! Authentication and role-based authorization.
//!
//! Flow Overview: `credentials` resolves a login identifier and checks the
//! password, `session` snapshots the identity into signed claims and reads
//! them back on later requests, and `guard` decides each request from those
//! claims alone. `landing` maps a role to its dashboard area.

pub mod credentials;
pub mod guard;
pub mod identity;
pub mod landing;
pub mod password;
pub mod role;
pub mod session;
pub mod store;
pub mod validation;

pub use credentials::{AuthFailure, CredentialVerifier};
pub use guard::{authorize, Decision, Denial};
pub use identity::Identity;
pub use role::Role;
pub use session::{SessionClaims, SessionKeys};
