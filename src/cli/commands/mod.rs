pub mod email;
pub mod gateway;
pub mod identity;
pub mod logging;

use clap::{
    Arg, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

use crate::reset::config::DEFAULT_REDIRECT_URL;

pub const ARG_PORT: &str = "port";
pub const ARG_DSN: &str = "dsn";
pub const ARG_DEFAULT_REDIRECT_URL: &str = "default-redirect-url";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("recovery")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("RECOVERY_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Database connection string")
                .long_help(
                    "Database connection string. Without it throttle records and roles are kept in memory, which only works for a single instance.",
                )
                .env("RECOVERY_DSN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_DEFAULT_REDIRECT_URL)
                .long(ARG_DEFAULT_REDIRECT_URL)
                .help("Where reset links land when the request has no continueUrl")
                .default_value(DEFAULT_REDIRECT_URL)
                .env("RECOVERY_DEFAULT_REDIRECT_URL"),
        );

    let command = identity::with_args(command);
    let command = email::with_args(command);
    let command = gateway::with_args(command);
    logging::with_args(command)
}
