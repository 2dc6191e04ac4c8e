//! Login, registration and session endpoints plus the shared auth state.

pub mod login;
pub mod principal;
pub mod register;
pub mod session;
mod state;

pub use state::{AuthConfig, AuthState};
