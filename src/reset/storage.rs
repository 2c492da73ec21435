//! `PostgreSQL` persistence for throttle records and tenant roles.
//!
//! Flow Overview:
//! 1) Throttle: ensure the key's row exists, lock it with `FOR UPDATE`, apply the
//!    window, then update (allow) or roll back (deny).
//! 2) Roles: read-only lookup of `(app_id, user_id)` in `app_user_roles`.
//!
//! Scaling: the row lock serializes every instance of the service on the same key,
//! including the very first attempt (the insert blocks on the primary key).

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{Instrument, info_span};

use super::{
    authz::RoleStore,
    rate_limit::{RateLimitDecision, ThrottleStore, ThrottleWindow},
};

#[derive(Clone, Debug)]
pub struct PgThrottleStore {
    pool: PgPool,
}

impl PgThrottleStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThrottleStore for PgThrottleStore {
    async fn record_attempt(
        &self,
        key: &str,
        now_ms: i64,
        window: ThrottleWindow,
    ) -> Result<RateLimitDecision> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin throttle transaction")?;

        let ensure_query = r"
            INSERT INTO password_reset_throttle (key, hits)
            VALUES ($1, '{}')
            ON CONFLICT (key) DO NOTHING
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = ensure_query
        );
        sqlx::query(ensure_query)
            .bind(key)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to ensure throttle record")?;

        let select_query = r"
            SELECT hits
            FROM password_reset_throttle
            WHERE key = $1
            FOR UPDATE
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = select_query
        );
        let hits: Vec<i64> = sqlx::query_scalar(select_query)
            .bind(key)
            .fetch_one(&mut *tx)
            .instrument(span)
            .await
            .context("failed to lock throttle record")?;

        let Some(fresh) = window.admit(&hits, now_ms) else {
            tx.rollback()
                .await
                .context("failed to roll back throttle transaction")?;
            return Ok(RateLimitDecision::Limited);
        };

        let update_query = r"
            UPDATE password_reset_throttle
            SET hits = $2,
                updated_at = NOW()
            WHERE key = $1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = update_query
        );
        sqlx::query(update_query)
            .bind(key)
            .bind(&fresh)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to update throttle record")?;

        tx.commit()
            .await
            .context("failed to commit throttle transaction")?;

        Ok(RateLimitDecision::Allowed)
    }
}

#[derive(Clone, Debug)]
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn role(&self, app_id: &str, user_id: &str) -> Result<Option<String>> {
        let query = r"
            SELECT role
            FROM app_user_roles
            WHERE app_id = $1
              AND user_id = $2
            LIMIT 1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        sqlx::query_scalar(query)
            .bind(app_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup app role")
    }
}
