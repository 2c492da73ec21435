use axum::{
    extract::{ConnectInfo, Extension},
    http::HeaderMap,
    response::Json,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::debug;

use super::caller::RequestTrust;
use crate::reset::{
    error::RecoveryError,
    types::{
        AdminResetRequest, AdminResetResponse, ErrorResponse, PasswordResetRequest,
        PasswordResetResponse,
    },
    workflows::RecoveryWorkflows,
};

fn missing_payload() -> RecoveryError {
    RecoveryError::invalid("Missing or invalid JSON payload.")
}

#[utoipa::path(
    post,
    path= "/v1/password-reset",
    request_body = PasswordResetRequest,
    responses (
        (status = 200, description = "Reset requested; the link is included only when no email channel is configured", body = PasswordResetResponse),
        (status = 400, description = "Missing appId or invalid email", body = ErrorResponse),
        (status = 429, description = "Too many reset requests for this email and client", body = ErrorResponse),
        (status = 500, description = "Identity provider failure", body = ErrorResponse),
    ),
    tag= "recovery"
)]
// axum handler for self-serve password reset
pub async fn password_reset(
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    workflows: Extension<Arc<RecoveryWorkflows>>,
    trust: Extension<Arc<RequestTrust>>,
    payload: Option<Json<PasswordResetRequest>>,
) -> Result<Json<PasswordResetResponse>, RecoveryError> {
    let Some(Json(request)) = payload else {
        return Err(missing_payload());
    };
    let ip = trust.client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    debug!(client_ip = ip.as_deref(), "self-serve password reset");

    workflows
        .request_password_reset(&request, ip.as_deref())
        .await
        .map(Json)
}

#[utoipa::path(
    post,
    path= "/v1/admin/password-reset",
    request_body = AdminResetRequest,
    params(
        ("x-authenticated-uid" = Option<String>, Header, description = "Caller id set by the authenticating gateway"),
        ("x-authenticated-claims" = Option<String>, Header, description = "Trusted claims JSON, e.g. {\"admin\":true}"),
        ("x-authenticated-timestamp" = Option<i64>, Header, description = "Unix seconds when the gateway signed the caller headers"),
        ("x-authenticated-signature" = Option<String>, Header, description = "Hex HMAC-SHA256 of {timestamp}.{uid}.{claims} with the gateway secret"),
    ),
    responses (
        (status = 200, description = "Reset link issued or temporary password set", body = AdminResetResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin of the app", body = ErrorResponse),
        (status = 404, description = "No account matches the email", body = ErrorResponse),
        (status = 500, description = "Identity provider failure", body = ErrorResponse),
        (status = 502, description = "Email delivery failed after the reset was applied", body = ErrorResponse),
        (status = 503, description = "Role store unavailable", body = ErrorResponse),
    ),
    tag= "recovery"
)]
// axum handler for admin-initiated password reset
pub async fn admin_password_reset(
    headers: HeaderMap,
    workflows: Extension<Arc<RecoveryWorkflows>>,
    trust: Extension<Arc<RequestTrust>>,
    payload: Option<Json<AdminResetRequest>>,
) -> Result<Json<AdminResetResponse>, RecoveryError> {
    let caller = trust.caller(&headers)?;
    let Some(Json(request)) = payload else {
        return Err(missing_payload());
    };

    workflows
        .admin_reset_password(&request, caller.as_ref())
        .await
        .map(Json)
}
