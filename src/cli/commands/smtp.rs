use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::mail::{DEFAULT_PRODUCT_NAME, DEFAULT_SMTP_HOST, DEFAULT_SUPPORT_EMAIL};

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USER: &str = "smtp-user";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_SMTP_FROM_NAME: &str = "smtp-from-name";
pub const ARG_SUPPORT_EMAIL: &str = "support-email";

#[derive(Debug, Clone)]
pub struct Options {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<SecretString>,
    pub from_name: String,
    pub support_email: String,
}

impl Options {
    /// Parse SMTP arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow absent.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        // Env vars set to "" count as unset
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };
        let get_required = |id: &str| {
            get_non_empty(id).ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            host: get_required(ARG_SMTP_HOST)?,
            port: matches
                .get_one::<u16>(ARG_SMTP_PORT)
                .copied()
                .unwrap_or(587),
            user: get_non_empty(ARG_SMTP_USER),
            password: get_non_empty(ARG_SMTP_PASSWORD).map(SecretString::from),
            from_name: get_required(ARG_SMTP_FROM_NAME)?,
            support_email: get_required(ARG_SUPPORT_EMAIL)?,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host (STARTTLS)")
                .env("LOOMA_SMTP_HOST")
                .default_value(DEFAULT_SMTP_HOST),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP relay port")
                .env("LOOMA_SMTP_PORT")
                .default_value("587")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USER)
                .long(ARG_SMTP_USER)
                .help("SMTP username, also used as the sender address")
                .long_help(
                    "SMTP username, also used as the sender address.\n\nWithout both a user and a password no email is sent and issued codes count as undelivered.",
                )
                .env("LOOMA_SMTP_USER"),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password or app password")
                .env("LOOMA_SMTP_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SMTP_FROM_NAME)
                .long(ARG_SMTP_FROM_NAME)
                .help("Display name of the sender")
                .env("LOOMA_SMTP_FROM_NAME")
                .default_value(DEFAULT_PRODUCT_NAME),
        )
        .arg(
            Arg::new(ARG_SUPPORT_EMAIL)
                .long(ARG_SUPPORT_EMAIL)
                .help("Support address shown in verification emails")
                .env("LOOMA_SUPPORT_EMAIL")
                .default_value(DEFAULT_SUPPORT_EMAIL),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use secrecy::ExposeSecret;

    const SMTP_VARS: [&str; 6] = [
        "LOOMA_SMTP_HOST",
        "LOOMA_SMTP_PORT",
        "LOOMA_SMTP_USER",
        "LOOMA_SMTP_PASSWORD",
        "LOOMA_SMTP_FROM_NAME",
        "LOOMA_SUPPORT_EMAIL",
    ];

    fn parse(args: &[&str]) -> Result<Options> {
        let mut argv = vec!["looma"];
        argv.extend_from_slice(args);
        let matches = with_args(Command::new("looma")).try_get_matches_from(argv)?;
        Options::parse(&matches)
    }

    #[test]
    fn defaults_leave_smtp_unconfigured() -> Result<()> {
        temp_env::with_vars_unset(SMTP_VARS, || {
            let options = parse(&[])?;
            assert_eq!(options.host, "smtp.gmail.com");
            assert_eq!(options.port, 587);
            assert_eq!(options.from_name, "Looma");
            assert_eq!(options.support_email, "support@looma.com");
            assert!(options.user.is_none());
            assert!(options.password.is_none());
            Ok(())
        })
    }

    #[test]
    fn credentials_from_env() -> Result<()> {
        temp_env::with_vars(
            [
                ("LOOMA_SMTP_HOST", Some("smtp.looma.com")),
                ("LOOMA_SMTP_PORT", Some("2525")),
                ("LOOMA_SMTP_USER", Some("noreply@looma.com")),
                ("LOOMA_SMTP_PASSWORD", Some("app-password")),
                ("LOOMA_SMTP_FROM_NAME", None),
                ("LOOMA_SUPPORT_EMAIL", None),
            ],
            || {
                let options = parse(&[])?;
                assert_eq!(options.host, "smtp.looma.com");
                assert_eq!(options.port, 2525);
                let password = options
                    .password
                    .ok_or_else(|| anyhow::anyhow!("password missing"))?;
                assert_eq!(options.user.as_deref(), Some("noreply@looma.com"));
                assert_eq!(password.expose_secret(), "app-password");
                Ok(())
            },
        )
    }

    #[test]
    fn empty_password_means_unconfigured() -> Result<()> {
        temp_env::with_vars(
            [
                ("LOOMA_SMTP_USER", Some("noreply@looma.com")),
                ("LOOMA_SMTP_PASSWORD", Some("")),
            ],
            || {
                let options = parse(&[])?;
                assert_eq!(options.user.as_deref(), Some("noreply@looma.com"));
                assert!(options.password.is_none());
                Ok(())
            },
        )
    }
}
