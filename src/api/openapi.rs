#![allow(clippy::needless_for_each)]

use utoipa::OpenApi;

use super::handlers::{health, password_reset};
use crate::reset::types::{
    AdminResetRequest, AdminResetResponse, ErrorResponse, PasswordResetRequest,
    PasswordResetResponse, ResetMode,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        password_reset::password_reset,
        password_reset::admin_password_reset
    ),
    components(
        schemas(
            health::Health,
            PasswordResetRequest,
            PasswordResetResponse,
            AdminResetRequest,
            AdminResetResponse,
            ResetMode,
            ErrorResponse
        )
    ),
    tags(
        (name = "recovery", description = "Self-serve and admin-initiated password reset"),
        (name = "health", description = "Liveness and database status"),
    )
)]
pub struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
