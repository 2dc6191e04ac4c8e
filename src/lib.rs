//! # BeatCode (interview practice tracker)
//!
//! `beatcode` serves a curated bank of coding-interview questions. End users
//! track progress, favorites and personal remarks and exchange feedback with
//! administrators; administrators curate the question bank, accounts and
//! feedback.
//!
//! ## Roles
//!
//! Every identity carries exactly one role: `USER`, `ADMIN` or `SUPER_ADMIN`.
//! Privilege grows in that order, but it is never inherited implicitly: each
//! operation lists the exact set of roles it accepts (see [`auth::guard`]).
//!
//! ## Sessions
//!
//! A successful login mints a signed session token carrying a snapshot of the
//! identity (`sub`, `role`, `username`). Requests present it as the
//! `beatcode_session` cookie or a bearer token. Claims are trusted until the
//! token expires; they are not re-read from the database per request, so role
//! changes take effect at the next login.
//!
//! ## Login failures
//!
//! Unknown identifiers, password-less (federated) accounts and wrong passwords
//! all produce the same `401` response. The distinct kinds only reach the logs.

pub mod api;
pub mod auth;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
