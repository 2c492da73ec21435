use clap::{Arg, ArgAction, Command};
use std::net::IpAddr;

pub const ARG_GATEWAY_SECRET: &str = "gateway-secret";
pub const ARG_TRUSTED_PROXY: &str = "trusted-proxy";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GATEWAY_SECRET)
                .long(ARG_GATEWAY_SECRET)
                .help("Shared secret the authenticating gateway signs caller headers with")
                .long_help(
                    "Shared secret the authenticating gateway signs caller headers with (HMAC-SHA256). Without it caller headers are ignored and every admin request is rejected.",
                )
                .env("RECOVERY_GATEWAY_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_TRUSTED_PROXY)
                .long(ARG_TRUSTED_PROXY)
                .help("Proxy address allowed to set x-forwarded-for / x-real-ip, repeatable")
                .env("RECOVERY_TRUSTED_PROXIES")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(IpAddr)),
        )
}
