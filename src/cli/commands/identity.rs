use clap::{Arg, Command};

pub const ARG_IDENTITY_URL: &str = "identity-url";
pub const ARG_IDENTITY_TOKEN: &str = "identity-token";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_IDENTITY_URL)
                .long(ARG_IDENTITY_URL)
                .help("Identity provider base URL, example: https://idp.tld/api")
                .env("RECOVERY_IDENTITY_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_IDENTITY_TOKEN)
                .long(ARG_IDENTITY_TOKEN)
                .help("Service token sent as bearer credential to the identity provider")
                .env("RECOVERY_IDENTITY_TOKEN")
                .hide_env_values(true)
                .required(true),
        )
}
