//! Session, password hashing and bootstrap arguments.

use anyhow::{anyhow, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::api::SuperAdmin;

pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_PASSWORD_HASH_COST: &str = "password-hash-cost";
pub const ARG_SUPER_ADMIN_EMAIL: &str = "super-admin-email";
pub const ARG_SUPER_ADMIN_PASSWORD: &str = "super-admin-password";

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_bootstrap_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL, used for CORS and the cookie Secure flag")
                .env("BEATCODE_FRONTEND_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("HMAC secret for session tokens (at least 32 bytes)")
                .env("BEATCODE_SESSION_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session lifetime in seconds")
                .env("BEATCODE_SESSION_TTL_SECONDS")
                .default_value("43200")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_PASSWORD_HASH_COST)
                .long(ARG_PASSWORD_HASH_COST)
                .help("Argon2id iteration count")
                .env("BEATCODE_PASSWORD_HASH_COST")
                .default_value("2")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
}

fn with_bootstrap_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SUPER_ADMIN_EMAIL)
                .long(ARG_SUPER_ADMIN_EMAIL)
                .help("Create this super admin at startup if missing")
                .env("BEATCODE_SUPER_ADMIN_EMAIL")
                .requires(ARG_SUPER_ADMIN_PASSWORD),
        )
        .arg(
            Arg::new(ARG_SUPER_ADMIN_PASSWORD)
                .long(ARG_SUPER_ADMIN_PASSWORD)
                .help("Password for the bootstrap super admin")
                .env("BEATCODE_SUPER_ADMIN_PASSWORD")
                .hide_env_values(true)
                .requires(ARG_SUPER_ADMIN_EMAIL),
        )
}

#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub session_secret: SecretString,
    pub session_ttl_seconds: u64,
    pub password_hash_cost: u32,
    pub super_admin: Option<SuperAdmin>,
}

impl Options {
    /// Read the auth options from validated matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let read_required = |id: &str| -> Result<String> {
            matches
                .get_one::<String>(id)
                .cloned()
                .ok_or_else(|| anyhow!("missing required argument: --{id}"))
        };
        let read_number = |id: &str| -> Result<u64> {
            matches
                .get_one::<u64>(id)
                .copied()
                .ok_or_else(|| anyhow!("missing required argument: --{id}"))
        };

        let super_admin = match (
            matches.get_one::<String>(ARG_SUPER_ADMIN_EMAIL),
            matches.get_one::<String>(ARG_SUPER_ADMIN_PASSWORD),
        ) {
            (Some(email), Some(password)) => Some(SuperAdmin {
                email: email.clone(),
                password: SecretString::from(password.clone()),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(anyhow!(
                    "missing required argument: --{ARG_SUPER_ADMIN_PASSWORD}"
                ))
            }
            (None, Some(_)) => {
                return Err(anyhow!(
                    "missing required argument: --{ARG_SUPER_ADMIN_EMAIL}"
                ))
            }
        };

        Ok(Self {
            frontend_base_url: read_required(ARG_FRONTEND_BASE_URL)?,
            session_secret: SecretString::from(read_required(ARG_SESSION_SECRET)?),
            session_ttl_seconds: read_number(ARG_SESSION_TTL_SECONDS)?,
            password_hash_cost: matches
                .get_one::<u32>(ARG_PASSWORD_HASH_COST)
                .copied()
                .ok_or_else(|| anyhow!("missing required argument: --{ARG_PASSWORD_HASH_COST}"))?,
            super_admin,
        })
    }
}
