use super::handlers::{auth, feedback, health, progress, questions, stats, users};
use utoipa::{
    openapi::{Contact, InfoBuilder, License},
    OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register::register,
        auth::login::login,
        auth::session::logout,
        auth::session::session,
        questions::list_questions,
        questions::create_question,
        questions::update_question,
        questions::delete_question,
        progress::list_progress,
        progress::put_progress,
        feedback::submit_feedback,
        feedback::list_own_feedback,
        feedback::list_feedback,
        feedback::reply_feedback,
        users::list_users,
        users::create_user,
        users::patch_user,
        users::delete_user,
        users::list_admins,
        stats::admin_stats,
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Registration, login and sessions"),
        (name = "questions", description = "Question bank"),
        (name = "progress", description = "Per-user progress, favorites and remarks"),
        (name = "feedback", description = "Feedback between users and administrators"),
        (name = "users", description = "Account management"),
        (name = "admin", description = "Super admin statistics"),
    )
)]
struct ApiDoc;

/// The `OpenAPI` document, with info taken from Cargo metadata.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();

    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();
    info.contact = cargo_contact();
    info.license = cargo_license();
    doc.info = info;

    doc
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    fn non_empty(value: &str) -> Option<&str> {
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }

    match author.split_once('<') {
        Some((name, email)) => (
            non_empty(name),
            non_empty(email.trim().trim_end_matches('>')),
        ),
        None => (non_empty(author), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let doc = openapi();
        assert_eq!(doc.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(doc.info.version, env!("CARGO_PKG_VERSION"));

        let contact = doc.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Team BeatCode"));
            assert_eq!(contact.email.as_deref(), Some("team@beatcode.com"));
        }

        let license = doc.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.identifier.as_deref(), Some("BSD-3-Clause"));
        }
    }

    #[test]
    fn openapi_tags_and_paths() {
        let doc = openapi();
        let tags = doc.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "users"));
        for path in [
            "/health",
            "/v1/auth/login",
            "/v1/auth/session",
            "/v1/questions/{id}",
            "/v1/users/{id}/progress/{question_id}",
            "/v1/feedback/{id}/reply",
            "/v1/admin/stats",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn parse_author_variants() {
        assert_eq!(
            parse_author("Team BeatCode <team@beatcode.com>"),
            (Some("Team BeatCode"), Some("team@beatcode.com"))
        );
        assert_eq!(parse_author("Solo"), (Some("Solo"), None));
        assert_eq!(parse_author("<x@y.z>"), (None, Some("x@y.z")));
        assert_eq!(
            parse_author("  Padded Name  <  pad@beatcode.com > "),
            (Some("Padded Name"), Some("pad@beatcode.com"))
        );
        assert_eq!(parse_author("   "), (None, None));
    }
}
