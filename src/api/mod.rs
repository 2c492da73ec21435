//! HTTP surface for the recovery workflows.
//!
//! Routes:
//! - `POST /v1/password-reset`: self-serve reset link.
//! - `POST /v1/admin/password-reset`: admin reset by link or temporary password.
//! - `GET /health`: build info and database status.
//! - `/swagger-ui` with the document at `/api-docs/openapi.json`.

use anyhow::Result;
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
};
use sqlx::PgPool;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, error, info, info_span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

use crate::reset::RecoveryWorkflows;

mod error;
pub mod handlers;
mod openapi;

pub use handlers::caller::RequestTrust;
pub use openapi::{ApiDoc, openapi};

/// Build the application router.
///
/// `pool` is only used by the health check; `None` reports the in-memory backend.
/// `trust` decides which caller and client address headers are honored.
#[must_use]
pub fn router(
    workflows: Arc<RecoveryWorkflows>,
    pool: Option<PgPool>,
    trust: RequestTrust,
) -> Router {
    Router::new()
        .route("/v1/password-reset", post(handlers::password_reset))
        .route(
            "/v1/admin/password-reset",
            post(handlers::admin_password_reset),
        )
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
                .layer(Extension(workflows))
                .layer(Extension(Arc::new(trust))),
        )
        .route("/health", get(handlers::health).options(handlers::health))
        .layer(Extension(pool))
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(
    port: u16,
    workflows: RecoveryWorkflows,
    pool: Option<PgPool>,
    trust: RequestTrust,
) -> Result<()> {
    let app = router(Arc::new(workflows), pool, trust);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
    }
    info!("Gracefully shutdown");
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
