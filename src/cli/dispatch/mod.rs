//! Maps validated CLI arguments to the action the binary runs.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{otp, smtp, ARG_FRONTEND_BASE_URL, ARG_PORT};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let frontend_base_url = matches
        .get_one::<String>(ARG_FRONTEND_BASE_URL)
        .cloned()
        .context("missing required argument: --frontend-base-url")?;

    let otp_opts = otp::Options::parse(matches)?;
    let smtp_opts = smtp::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        frontend_base_url,
        otp_ttl_seconds: otp_opts.ttl_seconds,
        otp_max_attempts: otp_opts.max_attempts,
        otp_sweep_seconds: otp_opts.sweep_seconds,
        delivery_policy: otp_opts.delivery_policy,
        debug_echo_otp: otp_opts.debug_echo_otp,
        smtp_host: smtp_opts.host,
        smtp_port: smtp_opts.port,
        smtp_user: smtp_opts.user,
        smtp_password: smtp_opts.password,
        smtp_from_name: smtp_opts.from_name,
        support_email: smtp_opts.support_email,
    }))
}
