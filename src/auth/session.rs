//! Session Issuer and Session Reader.
//!
//! Flow Overview: a verified identity is snapshotted into `SessionClaims`,
//! signed as an HS256 token and handed to the client (cookie or bearer). On
//! every later request the token is read back into claims without touching the
//! identity store. A role change therefore reaches a session only at the next
//! login, which is why the token lifetime is kept short.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use utoipa::ToSchema;

use super::{identity::Identity, role::Role};

pub const SESSION_COOKIE_NAME: &str = "beatcode_session";
pub const MIN_SECRET_LEN: usize = 32;
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 12 * 60 * 60;

/// Identity snapshot carried by a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionClaims {
    pub subject_id: String,
    pub role: Role,
    pub username: Option<String>,
}

impl SessionClaims {
    /// Copy the identity fields a session carries.
    #[must_use]
    pub fn issue(identity: &Identity) -> Self {
        Self {
            subject_id: identity.id.to_string(),
            role: identity.role,
            username: identity.username.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session secret must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("session ttl must be greater than zero")]
    ZeroTtl,

    #[error("failed to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Signed token payload.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    username: Option<String>,
    iat: u64,
    exp: u64,
}

/// Signing and verification keys plus the token lifetime.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_seconds: u64,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    /// # Errors
    /// Returns `SessionError` when the secret is too short or the ttl is zero.
    pub fn new(secret: &SecretString, ttl_seconds: u64) -> Result<Self, SessionError> {
        let secret = secret.expose_secret().as_bytes();
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionError::WeakSecret);
        }
        if ttl_seconds == 0 {
            return Err(SessionError::ZeroTtl);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl_seconds,
        })
    }

    #[must_use]
    pub const fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Sign `claims` into a token that expires after the configured ttl.
    ///
    /// # Errors
    /// Returns `SessionError::Signing` if encoding fails.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        let now = get_current_timestamp();
        let payload = TokenClaims {
            sub: claims.subject_id.clone(),
            role: Some(claims.role),
            username: claims.username.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)?)
    }

    /// Decode a token. Expired, tampered or foreign tokens read as `None`.
    #[must_use]
    pub fn decode(&self, token: &str) -> Option<SessionClaims> {
        match decode::<TokenClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(SessionClaims {
                subject_id: data.claims.sub,
                role: data.claims.role.unwrap_or(Role::User),
                username: data.claims.username,
            }),
            Err(err) => {
                debug!("Discarding session token: {err}");
                None
            }
        }
    }

    /// Recover claims from a request, or `None` for anonymous traffic.
    #[must_use]
    pub fn read(&self, headers: &HeaderMap) -> Option<SessionClaims> {
        extract_session_token(headers).and_then(|token| self.decode(&token))
    }
}

/// Session token from the `Authorization` bearer header, else the session cookie.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let value = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    value.split(';').find_map(|pair| {
        let (key, val) = pair.trim().split_once('=')?;
        (key.trim() == SESSION_COOKIE_NAME && !val.trim().is_empty())
            .then(|| val.trim().to_string())
    })
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};
    use uuid::Uuid;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn keys(secret: &str) -> Result<SessionKeys, SessionError> {
        SessionKeys::new(&SecretString::from(secret.to_string()), 60)
    }

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "alice@beatcode.com".to_string(),
            username: Some("alice".to_string()),
            role: Role::Admin,
        }
    }

    #[test]
    fn issue_copies_snapshot_fields() {
        let identity = identity();
        let claims = SessionClaims::issue(&identity);
        assert_eq!(claims.subject_id, identity.id.to_string());
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.username.as_deref(), Some("alice"));
    }

    #[test]
    fn weak_secret_and_zero_ttl_rejected() {
        assert!(matches!(keys("short"), Err(SessionError::WeakSecret)));
        assert!(matches!(
            SessionKeys::new(&SecretString::from(SECRET.to_string()), 0),
            Err(SessionError::ZeroTtl)
        ));
    }

    #[test]
    fn issue_then_read_round_trip_via_cookie() -> anyhow::Result<()> {
        let keys = keys(SECRET)?;
        let identity = identity();
        let token = keys.sign(&SessionClaims::issue(&identity))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE_NAME}={token}"))?,
        );
        let claims = keys.read(&headers);
        assert_eq!(
            claims,
            Some(SessionClaims {
                subject_id: identity.id.to_string(),
                role: identity.role,
                username: identity.username,
            })
        );
        Ok(())
    }

    #[test]
    fn bearer_wins_over_cookie() -> anyhow::Result<()> {
        let keys = keys(SECRET)?;
        let mut admin = identity();
        admin.role = Role::SuperAdmin;
        let bearer = keys.sign(&SessionClaims::issue(&admin))?;
        let cookie = keys.sign(&SessionClaims::issue(&identity()))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {bearer}"))?);
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE_NAME}={cookie}"))?,
        );
        assert_eq!(keys.read(&headers).map(|c| c.role), Some(Role::SuperAdmin));
        Ok(())
    }

    #[test]
    fn foreign_or_garbage_tokens_read_as_absent() -> anyhow::Result<()> {
        let keys_a = keys(SECRET)?;
        let keys_b = keys("fedcba9876543210fedcba9876543210")?;
        let token = keys_a.sign(&SessionClaims::issue(&identity()))?;
        assert!(keys_b.decode(&token).is_none());
        assert!(keys_a.decode("not-a-token").is_none());
        assert!(keys_a.read(&HeaderMap::new()).is_none());
        Ok(())
    }

    #[test]
    fn expired_token_reads_as_absent() -> anyhow::Result<()> {
        let keys = keys(SECRET)?;
        let now = get_current_timestamp();
        let stale = TokenClaims {
            sub: Uuid::new_v4().to_string(),
            role: Some(Role::User),
            username: None,
            iat: now - 120,
            exp: now - 60,
        };
        let token = encode(&Header::new(Algorithm::HS256), &stale, &keys.encoding)?;
        assert!(keys.decode(&token).is_none());
        Ok(())
    }

    #[test]
    fn missing_role_defaults_to_user() -> anyhow::Result<()> {
        let keys = keys(SECRET)?;
        let now = get_current_timestamp();
        let payload = TokenClaims {
            sub: Uuid::new_v4().to_string(),
            role: None,
            username: None,
            iat: now,
            exp: now + 60,
        };
        let token = encode(&Header::new(Algorithm::HS256), &payload, &keys.encoding)?;
        assert_eq!(keys.decode(&token).map(|c| c.role), Some(Role::User));
        Ok(())
    }

    #[test]
    fn extract_ignores_empty_values() -> anyhow::Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("{SESSION_COOKIE_NAME}=; other=1"))?,
        );
        assert_eq!(extract_session_token(&headers), None);
        Ok(())
    }
}
