use clap::{Arg, Command};

pub const ARG_FROM_EMAIL: &str = "from-email";
pub const ARG_EMAIL_API_KEY: &str = "email-api-key";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FROM_EMAIL)
                .long(ARG_FROM_EMAIL)
                .help("Sender address for reset emails")
                .env("RECOVERY_FROM_EMAIL"),
        )
        .arg(
            Arg::new(ARG_EMAIL_API_KEY)
                .long(ARG_EMAIL_API_KEY)
                .help("SendGrid API key; without it reset links are returned in API responses")
                .long_help(
                    "SendGrid API key. When unset no email is sent and reset links are returned directly in API responses, which is meant for local and headless deployments only.",
                )
                .env("RECOVERY_EMAIL_API_KEY")
                .hide_env_values(true)
                .requires(ARG_FROM_EMAIL),
        )
}
