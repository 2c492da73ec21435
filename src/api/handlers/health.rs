use crate::GIT_COMMIT_HASH;
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use sqlx::{Connection, PgPool};
use tracing::{Instrument, debug, error, info_span};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    /// `ok`, `error`, or `memory` when running without a database.
    database: String,
}

async fn ping(pool: &PgPool) -> Result<(), StatusCode> {
    let acquire_span = info_span!(
        "db.acquire",
        db.system = "postgresql",
        db.operation = "ACQUIRE"
    );
    let mut conn = pool
        .acquire()
        .instrument(acquire_span)
        .await
        .map_err(|error| {
            error!("Failed to acquire database connection: {}", error);
            StatusCode::SERVICE_UNAVAILABLE
        })?;

    let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
    conn.ping().instrument(ping_span).await.map_err(|error| {
        error!("Failed to ping database: {}", error);
        StatusCode::SERVICE_UNAVAILABLE
    })
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "Service and database are healthy", body = Health),
        (status = 503, description = "Database is unhealthy", body = Health)
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(method: Method, pool: Extension<Option<PgPool>>) -> impl IntoResponse {
    let (result, database) = match pool.0.as_ref() {
        Some(pool) => {
            let result = ping(pool).await;
            let database = if result.is_ok() { "ok" } else { "error" };
            (result, database)
        }
        None => (Ok(()), "memory"),
    };

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = health.commit.get(0..7).unwrap_or("");

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();
            headers.insert("X-App", x_app_header_value);
            headers
        })
        .unwrap_or_else(|err| {
            error!("Failed to parse X-App header: {}", err);
            HeaderMap::new()
        });

    match result {
        Ok(()) => {
            debug!(database, "health check passed");
            (StatusCode::OK, headers, body)
        }
        Err(status) => (status, headers, body),
    }
}
