//! Normalization rules shared by registration and account management.
//!
//! Everything written to the identity store goes through here so stored
//! values match what the credential verifier looks up: lowercase email,
//! lowercase `[A-Za-z0-9_]+` username.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Field-level validation messages, keyed by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, &'static str>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }

    /// Record the error of `result` under `field`, returning its value if any.
    pub fn check<T>(&mut self, field: &'static str, result: Result<T, &'static str>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }
}

/// Trim, lowercase and shape-check an email.
///
/// # Errors
/// Returns a message when the value is blank or not an email address.
pub fn normalize_email(raw: &str) -> Result<String, &'static str> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err("Email is required");
    }
    if Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(&email)) {
        Ok(email)
    } else {
        Err("Invalid email address")
    }
}

/// Trim and lowercase an optional username. Blank means "no username".
///
/// # Errors
/// Returns a message when the value holds characters outside `[A-Za-z0-9_]`.
pub fn normalize_username(raw: Option<&str>) -> Result<Option<String>, &'static str> {
    let Some(username) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    if Regex::new(r"^[A-Za-z0-9_]+$").is_ok_and(|re| re.is_match(username)) {
        Ok(Some(username.to_lowercase()))
    } else {
        Err("Username may only contain letters, numbers and underscores")
    }
}

/// # Errors
/// Returns a message when the password is shorter than `MIN_PASSWORD_LEN`.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err("Password must be at least 8 characters")
    }
}
