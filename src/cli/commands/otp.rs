use clap::{builder::BoolishValueParser, Arg, ArgAction, ArgMatches, Command};

use crate::otp::DeliveryPolicy;

pub const ARG_OTP_TTL_SECONDS: &str = "otp-ttl-seconds";
pub const ARG_OTP_MAX_ATTEMPTS: &str = "otp-max-attempts";
pub const ARG_OTP_SWEEP_SECONDS: &str = "otp-sweep-seconds";
pub const ARG_DELIVERY_POLICY: &str = "delivery-policy";
pub const ARG_DEBUG_ECHO_OTP: &str = "debug-echo-otp";

#[derive(Debug, Clone)]
pub struct Options {
    pub ttl_seconds: u64,
    pub max_attempts: u32,
    pub sweep_seconds: u64,
    pub delivery_policy: DeliveryPolicy,
    pub debug_echo_otp: bool,
}

impl Options {
    /// Parse OTP policy arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a defaulted argument is somehow absent.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get_u64 = |id: &str| {
            matches
                .get_one::<u64>(id)
                .copied()
                .ok_or_else(|| anyhow::anyhow!("missing required argument: --{id}"))
        };

        Ok(Self {
            ttl_seconds: get_u64(ARG_OTP_TTL_SECONDS)?,
            max_attempts: matches
                .get_one::<u32>(ARG_OTP_MAX_ATTEMPTS)
                .copied()
                .ok_or_else(|| {
                    anyhow::anyhow!("missing required argument: --{ARG_OTP_MAX_ATTEMPTS}")
                })?,
            sweep_seconds: get_u64(ARG_OTP_SWEEP_SECONDS)?,
            delivery_policy: matches
                .get_one::<DeliveryPolicy>(ARG_DELIVERY_POLICY)
                .copied()
                .unwrap_or_default(),
            debug_echo_otp: matches.get_flag(ARG_DEBUG_ECHO_OTP),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_OTP_TTL_SECONDS)
                .long(ARG_OTP_TTL_SECONDS)
                .help("Lifetime of an issued code in seconds")
                .env("LOOMA_OTP_TTL_SECONDS")
                .default_value("600")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_OTP_MAX_ATTEMPTS)
                .long(ARG_OTP_MAX_ATTEMPTS)
                .help("Failed verifications allowed before a code is discarded")
                .env("LOOMA_OTP_MAX_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new(ARG_OTP_SWEEP_SECONDS)
                .long(ARG_OTP_SWEEP_SECONDS)
                .help("Interval for purging expired codes from memory")
                .env("LOOMA_OTP_SWEEP_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_DELIVERY_POLICY)
                .long(ARG_DELIVERY_POLICY)
                .help("What to do when the email cannot be sent: degrade or strict")
                .long_help(
                    "What to do when the email cannot be sent.\n\n`degrade` keeps the issued code and answers 200 with delivered=false.\n`strict` discards the code and answers 502.",
                )
                .env("LOOMA_DELIVERY_POLICY")
                .default_value("degrade")
                .value_parser(|value: &str| value.parse::<DeliveryPolicy>()),
        )
        .arg(
            Arg::new(ARG_DEBUG_ECHO_OTP)
                .long(ARG_DEBUG_ECHO_OTP)
                .help("Return undelivered codes in the response (development only)")
                .env("LOOMA_DEBUG_ECHO_OTP")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
}
