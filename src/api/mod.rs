use crate::{
    api::handlers::{
        auth::{self, AuthConfig, AuthState},
        dashboard, feedback, health, progress, questions, stats, users,
    },
    auth::store::{IdentityStore, PgIdentityStore},
};
use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, patch, post, put},
    Extension, Router,
};
use secrecy::SecretString;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa_swagger_ui::SwaggerUi;

pub mod bootstrap;
pub mod error;
pub mod handlers;
mod openapi;

pub use bootstrap::SuperAdmin;
pub use openapi::openapi;

/// Build the application router with every route and middleware layer.
///
/// # Errors
/// Returns an error if the frontend base URL cannot be turned into an origin.
pub fn router(auth_state: Arc<AuthState>, pool: PgPool) -> Result<Router> {
    let frontend_origin = frontend_origin(auth_state.config().frontend_base_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let app = Router::new()
        .route("/health", get(health::health).options(health::health))
        .route("/v1/auth/register", post(auth::register::register))
        .route("/v1/auth/login", post(auth::login::login))
        .route("/v1/auth/logout", post(auth::session::logout))
        .route("/v1/auth/session", get(auth::session::session))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/dashboard/*area", get(dashboard::dashboard))
        .route(
            "/v1/questions",
            get(questions::list_questions).post(questions::create_question),
        )
        .route(
            "/v1/questions/:id",
            put(questions::update_question).delete(questions::delete_question),
        )
        .route("/v1/users", get(users::list_users).post(users::create_user))
        .route(
            "/v1/users/:id",
            patch(users::patch_user).delete(users::delete_user),
        )
        .route("/v1/users/:id/progress", get(progress::list_progress))
        .route(
            "/v1/users/:id/progress/:question_id",
            put(progress::put_progress),
        )
        .route(
            "/v1/users/:id/feedback",
            get(feedback::list_own_feedback).post(feedback::submit_feedback),
        )
        .route("/v1/feedback", get(feedback::list_feedback))
        .route("/v1/feedback/:id/reply", post(feedback::reply_feedback))
        .route("/v1/admins", get(users::list_admins))
        .route("/v1/admin/stats", get(stats::admin_stats))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state))
                .layer(Extension(pool)),
        );

    Ok(app)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    auth_config: AuthConfig,
    session_secret: SecretString,
    super_admin: Option<SuperAdmin>,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let store: Arc<dyn IdentityStore> = Arc::new(PgIdentityStore::new(pool.clone()));
    let auth_state = Arc::new(AuthState::new(auth_config, &session_secret, store)?);

    if let Some(super_admin) = &super_admin {
        bootstrap::ensure_super_admin(&auth_state, super_admin).await?;
    }

    let app = router(auth_state, pool)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_base_url)
        .with_context(|| format!("Invalid frontend base URL: {frontend_base_url}"))?;
    let host = parsed.host_str().ok_or_else(|| {
        anyhow!("Frontend base URL must include a valid host: {frontend_base_url}")
    })?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}
