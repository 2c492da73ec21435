use crate::cli::{
    actions::{Action, server::Args},
    commands::{self, email, gateway, identity},
};
use anyhow::{Context, Result, anyhow};
use secrecy::SecretString;
use std::net::IpAddr;
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let dsn = matches.get_one::<String>(commands::ARG_DSN).cloned();

    let identity_url = matches
        .get_one::<String>(identity::ARG_IDENTITY_URL)
        .context("missing required argument: --identity-url")?;
    let identity_url = Url::parse(identity_url).context("invalid RECOVERY_IDENTITY_URL")?;
    let identity_token = matches
        .get_one::<String>(identity::ARG_IDENTITY_TOKEN)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --identity-token")?;

    let default_redirect_url = matches
        .get_one::<String>(commands::ARG_DEFAULT_REDIRECT_URL)
        .cloned()
        .context("missing required argument: --default-redirect-url")?;
    let parsed = Url::parse(&default_redirect_url)
        .with_context(|| format!("invalid default redirect URL: {default_redirect_url}"))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(anyhow!(
            "default redirect URL must be an absolute http(s) URL: {default_redirect_url}"
        ));
    }

    let from_email = matches.get_one::<String>(email::ARG_FROM_EMAIL).cloned();
    let email_api_key = matches
        .get_one::<String>(email::ARG_EMAIL_API_KEY)
        .cloned()
        .map(SecretString::from);

    let gateway_secret = matches
        .get_one::<String>(gateway::ARG_GATEWAY_SECRET)
        .cloned()
        .map(SecretString::from);
    let trusted_proxies: Vec<IpAddr> = matches
        .get_many::<IpAddr>(gateway::ARG_TRUSTED_PROXY)
        .into_iter()
        .flatten()
        .copied()
        .collect();

    Ok(Action::Server(Args {
        port,
        dsn,
        identity_url,
        identity_token,
        from_email,
        email_api_key,
        default_redirect_url,
        gateway_secret,
        trusted_proxies,
    }))
}
