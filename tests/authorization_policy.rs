//! End-to-end checks of the auth core through its public API:
//! credentials are verified against an in-memory store, a session token is
//! minted and read back from request headers, and the resulting claims are
//! run through the role guard and the dashboard resolver.

use anyhow::{Context, Result};
use axum::http::{header::AUTHORIZATION, header::COOKIE, HeaderMap, HeaderValue};
use beatcode::auth::{
    authorize,
    guard::{ensure_can_delete, ensure_owner, ADMIN_ROLES, ANY_ROLE, SUPER_ADMIN_ONLY},
    identity::StoredIdentity,
    landing::{dashboard_redirect, default_landing_path},
    password::PasswordHasher,
    session::SESSION_COOKIE_NAME,
    store::MemoryIdentityStore,
    AuthFailure, CredentialVerifier, Decision, Denial, Identity, Role, SessionClaims, SessionKeys,
};
use secrecy::SecretString;
use std::sync::Arc;
use uuid::Uuid;

const SECRET: &str = "integration-session-secret-32-bytes!";

struct Fixture {
    verifier: CredentialVerifier,
    keys: SessionKeys,
    store: Arc<MemoryIdentityStore>,
}

async fn fixture(accounts: &[(&str, Option<&str>, Role)]) -> Result<Fixture> {
    let hasher = PasswordHasher::new(1)?;
    let store = Arc::new(MemoryIdentityStore::new());
    for (email, username, role) in accounts {
        store
            .insert(StoredIdentity {
                identity: Identity {
                    id: Uuid::new_v4(),
                    email: (*email).to_string(),
                    username: username.map(str::to_string),
                    role: *role,
                },
                password_hash: Some(hasher.hash("practice-makes-perfect")?),
            })
            .await;
    }
    Ok(Fixture {
        verifier: CredentialVerifier::new(store.clone(), hasher)?,
        keys: SessionKeys::new(&SecretString::from(SECRET.to_string()), 3600)?,
        store,
    })
}

fn bearer(token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
    Ok(headers)
}

async fn login(fixture: &Fixture, identifier: &str) -> Result<SessionClaims> {
    let identity = fixture
        .verifier
        .verify(identifier, "practice-makes-perfect")
        .await?;
    let token = fixture.keys.sign(&SessionClaims::issue(&identity))?;
    fixture
        .keys
        .read(&bearer(&token)?)
        .context("freshly signed token must decode")
}

#[tokio::test]
async fn each_role_lands_on_its_own_dashboard() -> Result<()> {
    let fixture = fixture(&[
        ("root@beatcode.com", None, Role::SuperAdmin),
        ("curator@beatcode.com", Some("curator"), Role::Admin),
        ("learner@beatcode.com", Some("learner"), Role::User),
    ])
    .await?;

    for (identifier, role, home) in [
        ("ROOT@beatcode.com", Role::SuperAdmin, "/dashboard/super-admin"),
        ("Curator", Role::Admin, "/dashboard/admin"),
        ("learner@BEATCODE.com", Role::User, "/dashboard/user"),
    ] {
        let claims = login(&fixture, identifier).await?;
        assert_eq!(claims.role, role);
        assert_eq!(default_landing_path(Some(claims.role)), home);
        assert_eq!(dashboard_redirect(Some(claims.role), home), None);
        assert_eq!(
            dashboard_redirect(Some(claims.role), &format!("{home}/settings")),
            None
        );
    }
    Ok(())
}

#[tokio::test]
async fn guard_matrix_follows_session_role() -> Result<()> {
    let fixture = fixture(&[
        ("root@beatcode.com", None, Role::SuperAdmin),
        ("curator@beatcode.com", None, Role::Admin),
        ("learner@beatcode.com", None, Role::User),
    ])
    .await?;

    let root = login(&fixture, "root@beatcode.com").await?;
    let admin = login(&fixture, "curator@beatcode.com").await?;
    let user = login(&fixture, "learner@beatcode.com").await?;

    let forbidden = Decision::Denied(Denial::Forbidden);
    let expectations = [
        (&root, [Decision::Allowed, Decision::Allowed, Decision::Allowed]),
        (&admin, [Decision::Allowed, Decision::Allowed, forbidden]),
        (&user, [Decision::Allowed, forbidden, forbidden]),
    ];
    for (claims, expected) in expectations {
        let actual = [ANY_ROLE, ADMIN_ROLES, SUPER_ADMIN_ONLY]
            .map(|required| authorize(Some(claims), required));
        assert_eq!(actual, expected, "{:?}", claims.role);
    }

    for required in [ANY_ROLE, ADMIN_ROLES, SUPER_ADMIN_ONLY] {
        assert_eq!(
            authorize(None, required),
            Decision::Denied(Denial::Unauthenticated)
        );
    }

    assert!(ensure_owner(&user, &user.subject_id).is_ok());
    assert_eq!(
        ensure_owner(&root, &user.subject_id),
        Err(Denial::Forbidden)
    );
    assert_eq!(
        ensure_can_delete(&root, Role::SuperAdmin),
        Err(Denial::Forbidden)
    );
    assert!(ensure_can_delete(&admin, Role::User).is_ok());
    Ok(())
}

#[tokio::test]
async fn cookie_session_is_read_like_bearer() -> Result<()> {
    let fixture = fixture(&[("learner@beatcode.com", None, Role::User)]).await?;
    let identity = fixture
        .verifier
        .verify("learner@beatcode.com", "practice-makes-perfect")
        .await?;
    let token = fixture.keys.sign(&SessionClaims::issue(&identity))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        COOKIE,
        HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE_NAME}={token}"))?,
    );
    let claims = fixture.keys.read(&headers).context("cookie session")?;
    assert_eq!(claims.subject_id, identity.id.to_string());
    assert_eq!(claims.role, Role::User);
    Ok(())
}

#[tokio::test]
async fn rejected_logins_never_mint_sessions() -> Result<()> {
    let fixture = fixture(&[("learner@beatcode.com", None, Role::User)]).await?;

    let wrong = fixture
        .verifier
        .verify("learner@beatcode.com", "not-the-password")
        .await;
    assert!(matches!(wrong, Err(AuthFailure::InvalidPassword)));

    let unknown = fixture
        .verifier
        .verify("ghost@beatcode.com", "practice-makes-perfect")
        .await;
    assert!(matches!(unknown, Err(AuthFailure::IdentityNotFound)));

    let reads_before = fixture.store.credential_reads();
    let blank = fixture.verifier.verify("   ", "practice-makes-perfect").await;
    assert!(matches!(blank, Err(AuthFailure::MissingCredentials)));
    assert_eq!(fixture.store.credential_reads(), reads_before);
    Ok(())
}

#[tokio::test]
async fn sessions_from_another_deployment_are_ignored() -> Result<()> {
    let fixture = fixture(&[("learner@beatcode.com", None, Role::User)]).await?;
    let claims = login(&fixture, "learner@beatcode.com").await?;

    let foreign = SessionKeys::new(
        &SecretString::from("another-deployment-secret-32-bytes".to_string()),
        3600,
    )?;
    let token = foreign.sign(&claims)?;
    assert!(fixture.keys.read(&bearer(&token)?).is_none());
    Ok(())
}
