//! Tenant admin authorization.
//!
//! Flow Overview:
//! 1) Unauthenticated callers are never admins (no backend call).
//! 2) A trusted `admin` claim wins immediately.
//! 3) Otherwise read the caller's role for the requested tenant; only `"admin"` passes.
//!
//! Security boundaries: the role lookup is keyed by `(app_id, user_id)` so a role
//! granted in one tenant never leaks into another. Backend failures surface as errors
//! instead of a silent "not admin".

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

use super::error::RecoveryError;

pub const ADMIN_ROLE: &str = "admin";

/// Claims asserted by the authentication layer (signed token or trusted gateway).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TrustedClaims {
    #[serde(default)]
    pub admin: bool,
}

/// Authenticated subject of a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallerIdentity {
    pub uid: String,
    pub claims: Option<TrustedClaims>,
}

impl CallerIdentity {
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            claims: None,
        }
    }

    #[must_use]
    pub fn with_claims(mut self, claims: TrustedClaims) -> Self {
        self.claims = Some(claims);
        self
    }

    fn admin_claim(&self) -> bool {
        self.claims.as_ref().is_some_and(|claims| claims.admin)
    }
}

/// Read-only access to tenant-scoped role records.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// # Errors
    /// Returns an error if the backend cannot be read.
    async fn role(&self, app_id: &str, user_id: &str) -> anyhow::Result<Option<String>>;
}

/// In-process role records, keyed by `(app_id, user_id)`.
#[derive(Debug, Default)]
pub struct MemoryRoleStore {
    roles: RwLock<HashMap<(String, String), String>>,
}

impl MemoryRoleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_role(&self, app_id: &str, user_id: &str, role: &str) {
        self.roles.write().await.insert(
            (app_id.to_string(), user_id.to_string()),
            role.to_string(),
        );
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn role(&self, app_id: &str, user_id: &str) -> anyhow::Result<Option<String>> {
        Ok(self
            .roles
            .read()
            .await
            .get(&(app_id.to_string(), user_id.to_string()))
            .cloned())
    }
}

#[derive(Clone)]
pub struct AuthorizationGate {
    roles: Arc<dyn RoleStore>,
}

impl AuthorizationGate {
    #[must_use]
    pub fn new(roles: Arc<dyn RoleStore>) -> Self {
        Self { roles }
    }

    /// Decide whether `caller` administers tenant `app_id`.
    ///
    /// # Errors
    /// Returns `Unavailable` if the role record cannot be read.
    pub async fn is_admin(
        &self,
        caller: Option<&CallerIdentity>,
        app_id: &str,
    ) -> Result<bool, RecoveryError> {
        let Some(caller) = caller else {
            return Ok(false);
        };

        if caller.admin_claim() {
            debug!(uid = %caller.uid, "admin granted by trusted claim");
            return Ok(true);
        }

        let role = self
            .roles
            .role(app_id, &caller.uid)
            .await
            .map_err(|err| {
                error!(uid = %caller.uid, "Failed to lookup app role: {err:#}");
                RecoveryError::Unavailable(format!("role store: {err:#}"))
            })?;

        Ok(role.as_deref() == Some(ADMIN_ROLE))
    }
}

impl std::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGate").finish_non_exhaustive()
    }
}
