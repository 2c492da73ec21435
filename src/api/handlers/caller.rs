//! Request context forwarded by the infrastructure in front of the service.
//!
//! Caller identity comes from the authenticating gateway, which signs what it forwards:
//! - `x-authenticated-uid`: subject id.
//! - `x-authenticated-claims`: optional JSON object of trusted claims, e.g. `{"admin":true}`.
//! - `x-authenticated-timestamp`: unix seconds at signing time.
//! - `x-authenticated-signature`: hex HMAC-SHA256 over `{timestamp}.{uid}.{claims}` keyed with
//!   the shared gateway secret.
//!
//! Without a configured secret, or with a missing, stale or wrong signature, the caller is
//! unauthenticated. Forwarded client addresses are only read from configured proxies.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use std::net::{IpAddr, SocketAddr};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::reset::{
    authz::{CallerIdentity, TrustedClaims},
    error::RecoveryError,
};

type HmacSha256 = Hmac<Sha256>;

pub const AUTHENTICATED_UID_HEADER: &str = "x-authenticated-uid";
pub const AUTHENTICATED_CLAIMS_HEADER: &str = "x-authenticated-claims";
pub const AUTHENTICATED_TIMESTAMP_HEADER: &str = "x-authenticated-timestamp";
pub const AUTHENTICATED_SIGNATURE_HEADER: &str = "x-authenticated-signature";

/// Maximum age (and clock skew) accepted for a gateway signature.
pub const MAX_ASSERTION_AGE_SECONDS: i64 = 300;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn assertion_mac(
    secret: &SecretString,
    timestamp: i64,
    uid: &str,
    claims: &str,
) -> Option<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.expose_secret().as_bytes()).ok()?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(uid.as_bytes());
    mac.update(b".");
    mac.update(claims.as_bytes());
    Some(mac)
}

/// Signature the gateway sends in `x-authenticated-signature`.
///
/// `claims` is the exact `x-authenticated-claims` header value, or `""` when absent.
#[must_use]
pub fn sign_assertion(
    secret: &SecretString,
    timestamp: i64,
    uid: &str,
    claims: &str,
) -> Option<String> {
    assertion_mac(secret, timestamp, uid, claims)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX)
        })
}

/// What the service accepts from the network in front of it.
#[derive(Clone, Debug, Default)]
pub struct RequestTrust {
    gateway_secret: Option<SecretString>,
    trusted_proxies: Vec<IpAddr>,
}

impl RequestTrust {
    #[must_use]
    pub fn new(gateway_secret: Option<SecretString>, trusted_proxies: Vec<IpAddr>) -> Self {
        Self {
            gateway_secret,
            trusted_proxies,
        }
    }

    #[must_use]
    pub fn gateway_configured(&self) -> bool {
        self.gateway_secret.is_some()
    }

    /// Verified caller of the request, `None` when unauthenticated.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if a correctly signed claims header is not a JSON object.
    pub fn caller(&self, headers: &HeaderMap) -> Result<Option<CallerIdentity>, RecoveryError> {
        self.caller_at(headers, unix_now())
    }

    fn caller_at(
        &self,
        headers: &HeaderMap,
        now: i64,
    ) -> Result<Option<CallerIdentity>, RecoveryError> {
        let Some(uid) = header_str(headers, AUTHENTICATED_UID_HEADER) else {
            return Ok(None);
        };
        let Some(secret) = &self.gateway_secret else {
            warn!("Ignoring caller headers: no gateway secret configured");
            return Ok(None);
        };
        let claims = header_str(headers, AUTHENTICATED_CLAIMS_HEADER);

        let timestamp = header_str(headers, AUTHENTICATED_TIMESTAMP_HEADER)
            .and_then(|value| value.parse::<i64>().ok());
        let Some(timestamp) = timestamp else {
            warn!(uid, "Ignoring caller headers: missing or invalid timestamp");
            return Ok(None);
        };
        if (now - timestamp).abs() > MAX_ASSERTION_AGE_SECONDS {
            warn!(uid, timestamp, "Ignoring caller headers: stale signature");
            return Ok(None);
        }

        let signature = header_str(headers, AUTHENTICATED_SIGNATURE_HEADER)
            .and_then(|value| hex::decode(value).ok());
        let verified = signature
            .zip(assertion_mac(secret, timestamp, uid, claims.unwrap_or_default()))
            .is_some_and(|(signature, mac)| mac.verify_slice(&signature).is_ok());
        if !verified {
            warn!(uid, "Ignoring caller headers: bad signature");
            return Ok(None);
        }

        let caller = CallerIdentity::new(uid);
        match claims {
            Some(raw) => {
                let claims: TrustedClaims = serde_json::from_str(raw).map_err(|_| {
                    RecoveryError::invalid(format!(
                        "{AUTHENTICATED_CLAIMS_HEADER} must be a JSON object"
                    ))
                })?;
                Ok(Some(caller.with_claims(claims)))
            }
            None => Ok(Some(caller)),
        }
    }

    /// Client address for throttling.
    ///
    /// The socket peer, unless the peer is a trusted proxy: then the first hop of
    /// `x-forwarded-for`, then `x-real-ip`, then the peer.
    #[must_use]
    pub fn client_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
        let peer = peer.map(|addr| addr.ip().to_canonical())?;
        if !self.trusted_proxies.contains(&peer) {
            return Some(peer.to_string());
        }

        let forwarded = header_str(headers, "x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .or_else(|| header_str(headers, "x-real-ip"));
        Some(forwarded.map_or_else(|| peer.to_string(), str::to_string))
    }
}
