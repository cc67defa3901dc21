use crate::{
    api::{self, SmtpProbe},
    cli::telemetry,
    mail::{Branding, EmailSender, LogEmailSender, SmtpConfig, SmtpEmailSender},
    otp::{self, DeliveryPolicy, MemoryOtpStore, OtpPolicy, OtpService, SystemClock},
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub frontend_base_url: String,
    pub otp_ttl_seconds: u64,
    pub otp_max_attempts: u32,
    pub otp_sweep_seconds: u64,
    pub delivery_policy: DeliveryPolicy,
    pub debug_echo_otp: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<SecretString>,
    pub smtp_from_name: String,
    pub support_email: String,
}

impl Args {
    fn smtp_config(&self) -> Option<SmtpConfig> {
        Some(SmtpConfig {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            user: self.smtp_user.clone()?,
            password: self.smtp_password.clone()?,
            from_name: self.smtp_from_name.clone(),
        })
    }

    fn otp_policy(&self) -> OtpPolicy {
        OtpPolicy::new()
            .with_ttl_seconds(self.otp_ttl_seconds)
            .with_max_attempts(self.otp_max_attempts)
            .with_delivery(self.delivery_policy)
            .with_expose_code(self.debug_echo_otp)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the SMTP settings are invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let smtp_sender = args
        .smtp_config()
        .map(|config| SmtpEmailSender::new(&config).map(Arc::new))
        .transpose()
        .context("Failed to configure SMTP transport")?;

    let service = Arc::new(OtpService::new(
        Arc::new(MemoryOtpStore::new()),
        email_sender(smtp_sender.as_ref()),
        Arc::new(SystemClock),
        args.otp_policy(),
        Branding::new(args.smtp_from_name.clone(), args.support_email.clone()),
    ));

    let sweeper = otp::spawn_sweeper(
        service.clone(),
        Duration::from_secs(args.otp_sweep_seconds),
    );

    let probe = Arc::new(SmtpProbe::new(smtp_sender, &args.smtp_host, args.smtp_port));

    let result = api::new(args.port, &args.frontend_base_url, service, probe).await;

    sweeper.abort();
    telemetry::shutdown_tracer();

    result
}

fn email_sender(smtp: Option<&Arc<SmtpEmailSender>>) -> Arc<dyn EmailSender> {
    match smtp {
        Some(smtp) => smtp.clone(),
        None => {
            warn!("SMTP credentials not configured, verification emails will not be sent");
            Arc::new(LogEmailSender)
        }
    }
}

fn log_startup_args(args: &Args) {
    let smtp_user = if args.smtp_user.is_some() {
        "Configured"
    } else {
        "Missing"
    };
    info!(
        port = args.port,
        frontend_base_url = %args.frontend_base_url,
        otp_ttl_seconds = args.otp_ttl_seconds,
        otp_max_attempts = args.otp_max_attempts,
        delivery_policy = %args.delivery_policy,
        smtp_host = %args.smtp_host,
        smtp_port = args.smtp_port,
        smtp_user,
        "starting looma"
    );

    if args.debug_echo_otp {
        warn!("undelivered OTP codes will be returned in API responses");
    }
}
