//! Request and response shapes for the two recovery operations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::RecoveryError;

#[derive(ToSchema, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub email: String,
    /// Where the reset link lands; the configured default when omitted.
    #[serde(default)]
    pub continue_url: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetResponse {
    pub ok: bool,
    /// Present only when no email channel is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl PasswordResetResponse {
    #[must_use]
    pub fn sent() -> Self {
        Self { ok: true, link: None }
    }

    #[must_use]
    pub fn with_link(link: String) -> Self {
        Self {
            ok: true,
            link: Some(link),
        }
    }
}

#[derive(ToSchema, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdminResetRequest {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub email: String,
    /// `"link"` (default) or `"temp"`.
    #[serde(default)]
    pub mode: Option<String>,
    /// Required for `"temp"`, at least eight characters.
    #[serde(default)]
    pub temp_password: Option<String>,
    #[serde(default)]
    pub continue_url: Option<String>,
}

impl std::fmt::Debug for AdminResetRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminResetRequest")
            .field("app_id", &self.app_id)
            .field("email", &self.email)
            .field("mode", &self.mode)
            .field("temp_password", &self.temp_password.as_ref().map(|_| "***"))
            .field("continue_url", &self.continue_url)
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResetMode {
    #[default]
    Link,
    Temp,
}

impl ResetMode {
    /// # Errors
    /// Returns `InvalidArgument` for anything other than `link` or `temp`.
    pub fn parse(mode: Option<&str>) -> Result<Self, RecoveryError> {
        match mode.map(str::trim) {
            None | Some("" | "link") => Ok(Self::Link),
            Some("temp") => Ok(Self::Temp),
            Some(other) => Err(RecoveryError::invalid(format!(
                "Unknown mode '{other}', expected 'link' or 'temp'."
            ))),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AdminResetResponse {
    pub ok: bool,
    pub mode: ResetMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Error body for every failed request.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<&RecoveryError> for ErrorResponse {
    fn from(err: &RecoveryError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn requests_use_camel_case() -> Result<()> {
        let request: AdminResetRequest = serde_json::from_value(json!({
            "appId": "a1",
            "email": "u@x.com",
            "mode": "temp",
            "tempPassword": "Sup3rSecr3t",
            "continueUrl": "https://app.example.com/done",
        }))?;
        assert_eq!(request.app_id, "a1");
        assert_eq!(request.temp_password.as_deref(), Some("Sup3rSecr3t"));
        assert_eq!(
            request.continue_url.as_deref(),
            Some("https://app.example.com/done")
        );
        Ok(())
    }

    #[test]
    fn missing_fields_default_to_empty() -> Result<()> {
        let request: PasswordResetRequest = serde_json::from_value(json!({}))?;
        assert_eq!(request, PasswordResetRequest::default());
        Ok(())
    }

    #[test]
    fn response_omits_absent_link() -> Result<()> {
        assert_eq!(
            serde_json::to_value(PasswordResetResponse::sent())?,
            json!({ "ok": true })
        );
        let response = AdminResetResponse {
            ok: true,
            mode: ResetMode::Temp,
            link: None,
        };
        assert_eq!(
            serde_json::to_value(response)?,
            json!({ "ok": true, "mode": "temp" })
        );
        Ok(())
    }

    #[test]
    fn mode_parsing() {
        assert_eq!(ResetMode::parse(None), Ok(ResetMode::Link));
        assert_eq!(ResetMode::parse(Some("")), Ok(ResetMode::Link));
        assert_eq!(ResetMode::parse(Some("link")), Ok(ResetMode::Link));
        assert_eq!(ResetMode::parse(Some("temp")), Ok(ResetMode::Temp));
        assert!(matches!(
            ResetMode::parse(Some("sms")),
            Err(RecoveryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn admin_request_debug_hides_password() {
        let request = AdminResetRequest {
            temp_password: Some("Sup3rSecr3t".to_string()),
            ..AdminResetRequest::default()
        };
        assert!(!format!("{request:?}").contains("Sup3rSecr3t"));
    }
}
