use chrono::{DateTime, TimeDelta, Utc};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{debug, error, info, instrument, warn};

use super::{
    clock::Clock,
    code::{codes_match, generate_code},
    error::OtpError,
    models::OtpRecord,
    store::OtpStore,
};
use crate::mail::{Branding, EmailSender};

const DEFAULT_TTL_SECONDS: i64 = 10 * 60;
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// What `issue` does when the email transport fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// Keep the stored code and report success with `delivered = false`.
    #[default]
    Degrade,
    /// Drop the stored code and fail with [`OtpError::DeliveryFailure`].
    Strict,
}

impl DeliveryPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Degrade => "degrade",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for DeliveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "invalid delivery policy '{other}', expected 'degrade' or 'strict'"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OtpPolicy {
    ttl: TimeDelta,
    max_attempts: u32,
    delivery: DeliveryPolicy,
    expose_code: bool,
}

impl OtpPolicy {
    /// Defaults: 10 minute TTL, 5 attempts, degrade on delivery failure, never
    /// echo the code.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ttl: TimeDelta::seconds(DEFAULT_TTL_SECONDS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delivery: DeliveryPolicy::Degrade,
            expose_code: false,
        }
    }

    #[must_use]
    pub fn with_ttl_seconds(mut self, seconds: u64) -> Self {
        let seconds = i64::try_from(seconds).unwrap_or(i64::MAX).max(1);
        self.ttl = TimeDelta::try_seconds(seconds).unwrap_or(TimeDelta::MAX);
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_delivery(mut self, delivery: DeliveryPolicy) -> Self {
        self.delivery = delivery;
        self
    }

    /// Return the code in the issue outcome when delivery failed under
    /// [`DeliveryPolicy::Degrade`]. Development only.
    #[must_use]
    pub fn with_expose_code(mut self, expose_code: bool) -> Self {
        self.expose_code = expose_code;
        self
    }

    #[must_use]
    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn delivery(&self) -> DeliveryPolicy {
        self.delivery
    }

    #[must_use]
    pub fn expose_code(&self) -> bool {
        self.expose_code
    }
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful `issue`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueOutcome {
    pub delivered: bool,
    pub delivery_id: Option<String>,
    pub expires_at: DateTime<Utc>,
    /// Only set when delivery failed and the policy exposes codes.
    pub code: Option<String>,
}

pub struct OtpService {
    store: Arc<dyn OtpStore>,
    sender: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
    policy: OtpPolicy,
    branding: Branding,
}

impl OtpService {
    #[must_use]
    pub fn new(
        store: Arc<dyn OtpStore>,
        sender: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        policy: OtpPolicy,
        branding: Branding,
    ) -> Self {
        Self {
            store,
            sender,
            clock,
            policy,
            branding,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &OtpPolicy {
        &self.policy
    }

    /// Generate and store a fresh code for `email`, then hand it to the sender.
    ///
    /// Any earlier record for the same email is overwritten, which resets the
    /// attempt counter and invalidates the previous code.
    ///
    /// # Errors
    /// - [`OtpError::InvalidInput`] for an empty email.
    /// - [`OtpError::DeliveryFailure`] when delivery fails under
    ///   [`DeliveryPolicy::Strict`].
    /// - [`OtpError::Store`] when the store fails.
    #[instrument(skip(self))]
    pub async fn issue(&self, email: &str) -> Result<IssueOutcome, OtpError> {
        if email.trim().is_empty() {
            return Err(OtpError::InvalidInput("Email is required"));
        }

        let code = generate_code();
        let record = OtpRecord::new(email, code.clone(), self.clock.now(), self.policy.ttl());
        let expires_at = record.expires_at;
        self.store.put(record).await?;
        debug!(%expires_at, "OTP stored");

        let message = self
            .branding
            .verification_email(email, &code, self.policy.ttl());

        match self.sender.send(&message).await {
            Ok(delivery_id) => {
                info!(%delivery_id, "OTP email sent");
                Ok(IssueOutcome {
                    delivered: true,
                    delivery_id: Some(delivery_id),
                    expires_at,
                    code: None,
                })
            }
            Err(err) => match self.policy.delivery() {
                DeliveryPolicy::Degrade => {
                    warn!("OTP email delivery failed, code kept for degraded issuance: {err}");
                    Ok(IssueOutcome {
                        delivered: false,
                        delivery_id: None,
                        expires_at,
                        code: self.policy.expose_code().then_some(code),
                    })
                }
                DeliveryPolicy::Strict => {
                    error!("OTP email delivery failed: {err}");
                    self.store.remove(email).await?;
                    Err(OtpError::DeliveryFailure(err))
                }
            },
        }
    }

    /// Check `code` against the pending record for `email`.
    ///
    /// Success consumes the record. Expiry and attempt exhaustion delete it.
    /// A mismatch counts one failed attempt; the attempt that reaches the
    /// ceiling deletes the record and reports [`OtpError::TooManyAttempts`].
    ///
    /// # Errors
    /// Returns the [`OtpError`] kind describing why the code was not accepted.
    #[instrument(skip(self, code))]
    pub async fn verify(&self, email: &str, code: &str) -> Result<(), OtpError> {
        if email.trim().is_empty() || code.trim().is_empty() {
            return Err(OtpError::InvalidInput("Email and OTP are required"));
        }

        let Some(mut record) = self.store.get(email).await? else {
            debug!("no pending OTP");
            return Err(OtpError::NotFound);
        };

        let max_attempts = self.policy.max_attempts();

        if record.is_expired(self.clock.now()) {
            self.store.remove(email).await?;
            info!(expires_at = %record.expires_at, "OTP expired");
            return Err(OtpError::Expired);
        }

        if record.attempts_exhausted(max_attempts) {
            self.store.remove(email).await?;
            warn!(attempts = record.attempts, "OTP attempts already exhausted");
            return Err(OtpError::TooManyAttempts);
        }

        if codes_match(&record.code, code) {
            self.store.remove(email).await?;
            info!("OTP verified");
            return Ok(());
        }

        record.attempts = record.attempts.saturating_add(1);
        if record.attempts_exhausted(max_attempts) {
            self.store.remove(email).await?;
            warn!(attempts = record.attempts, "OTP attempt ceiling reached");
            return Err(OtpError::TooManyAttempts);
        }

        let remaining_attempts = max_attempts - record.attempts;
        debug!(attempts = record.attempts, remaining_attempts, "OTP mismatch");
        self.store.put(record).await?;
        Err(OtpError::InvalidCode { remaining_attempts })
    }

    /// Remove every record that has passed its expiry.
    ///
    /// # Errors
    /// Returns [`OtpError::Store`] when the store fails.
    pub async fn purge_expired(&self) -> Result<usize, OtpError> {
        Ok(self.store.purge_expired(self.clock.now()).await?)
    }

    /// Number of codes currently pending.
    ///
    /// # Errors
    /// Returns [`OtpError::Store`] when the store fails.
    pub async fn pending(&self) -> Result<usize, OtpError> {
        Ok(self.store.len().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::{DeliveryError, EmailMessage};
    use crate::otp::{ManualClock, MemoryOtpStore};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Captures sent messages, or fails every send when `fail` is set.
    #[derive(Default)]
    struct RecordingSender {
        fail: bool,
        sent: Mutex<Vec<EmailMessage>>,
    }

    impl RecordingSender {
        fn failing() -> Self {
            Self {
                fail: true,
                sent: Mutex::default(),
            }
        }

        fn last_code(&self) -> Option<String> {
            let sent = self.sent.lock().ok()?;
            let text = &sent.last()?.text;
            text.lines()
                .find_map(|line| line.strip_prefix("Verification Code: "))
                .map(str::to_string)
        }

        fn count(&self) -> usize {
            self.sent.lock().map(|sent| sent.len()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send(&self, message: &EmailMessage) -> Result<String, DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Transport("connection refused".to_string()));
            }
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(message.clone());
            }
            Ok(format!("msg-{}", self.count()))
        }
    }

    struct Harness {
        service: OtpService,
        store: Arc<MemoryOtpStore>,
        sender: Arc<RecordingSender>,
        clock: Arc<ManualClock>,
    }

    fn harness_with(sender: RecordingSender, policy: OtpPolicy) -> Harness {
        let store = Arc::new(MemoryOtpStore::new());
        let sender = Arc::new(sender);
        let clock = Arc::new(ManualClock::default());
        let service = OtpService::new(
            store.clone(),
            sender.clone(),
            clock.clone(),
            policy,
            Branding::default(),
        );
        Harness {
            service,
            store,
            sender,
            clock,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingSender::default(), OtpPolicy::new())
    }

    async fn issue_and_read_code(h: &Harness, email: &str) -> Result<String> {
        h.service.issue(email).await?;
        h.sender.last_code().ok_or_else(|| anyhow!("no code sent"))
    }

    fn wrong_code(code: &str) -> String {
        if code == "999999" {
            "100000".to_string()
        } else {
            "999999".to_string()
        }
    }

    #[tokio::test]
    async fn issue_stores_one_fresh_record() -> Result<()> {
        let h = harness();
        let outcome = h.service.issue("alice@example.com").await?;

        let record = h
            .store
            .get("alice@example.com")
            .await?
            .ok_or_else(|| anyhow!("record missing"))?;
        assert_eq!(h.store.len().await?, 1);
        assert_eq!(record.attempts, 0);
        assert_eq!(record.expires_at, h.clock.now() + TimeDelta::minutes(10));
        assert_eq!(outcome.expires_at, record.expires_at);
        assert!(outcome.delivered);
        assert_eq!(outcome.delivery_id.as_deref(), Some("msg-1"));
        assert_eq!(outcome.code, None);
        assert_eq!(h.sender.last_code(), Some(record.code));
        Ok(())
    }

    #[tokio::test]
    async fn issue_rejects_empty_email() {
        let h = harness();
        let result = h.service.issue("  ").await;
        assert!(matches!(result, Err(OtpError::InvalidInput(_))));
        assert_eq!(h.sender.count(), 0);
    }

    #[tokio::test]
    async fn correct_code_succeeds_exactly_once() -> Result<()> {
        let h = harness();
        let code = issue_and_read_code(&h, "alice@example.com").await?;

        h.service.verify("alice@example.com", &code).await?;
        let second = h.service.verify("alice@example.com", &code).await;
        assert!(matches!(second, Err(OtpError::NotFound)));
        assert_eq!(h.store.len().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn fifth_wrong_code_exhausts_attempts() -> Result<()> {
        let h = harness();
        let code = issue_and_read_code(&h, "alice@example.com").await?;
        let wrong = wrong_code(&code);

        for expected_remaining in (1..=4).rev() {
            let result = h.service.verify("alice@example.com", &wrong).await;
            match result {
                Err(OtpError::InvalidCode { remaining_attempts }) => {
                    assert_eq!(remaining_attempts, expected_remaining);
                }
                other => return Err(anyhow!("expected InvalidCode, got {other:?}")),
            }
        }

        let fifth = h.service.verify("alice@example.com", &wrong).await;
        assert!(matches!(fifth, Err(OtpError::TooManyAttempts)));
        assert!(h.store.get("alice@example.com").await?.is_none());

        // The right code is no use once the record is gone.
        let after = h.service.verify("alice@example.com", &code).await;
        assert!(matches!(after, Err(OtpError::NotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn mismatch_increments_attempts_in_store() -> Result<()> {
        let h = harness();
        let code = issue_and_read_code(&h, "alice@example.com").await?;
        let _ = h.service.verify("alice@example.com", &wrong_code(&code)).await;
        let _ = h.service.verify("alice@example.com", &wrong_code(&code)).await;

        let record = h.store.get("alice@example.com").await?;
        assert_eq!(record.map(|r| r.attempts), Some(2));

        // A later match still succeeds.
        h.service.verify("alice@example.com", &code).await?;
        Ok(())
    }

    #[tokio::test]
    async fn exhausted_record_is_rejected_before_comparison() -> Result<()> {
        let h = harness();
        let code = issue_and_read_code(&h, "alice@example.com").await?;
        if let Some(mut record) = h.store.get("alice@example.com").await? {
            record.attempts = 5;
            h.store.put(record).await?;
        }

        let result = h.service.verify("alice@example.com", &code).await;
        assert!(matches!(result, Err(OtpError::TooManyAttempts)));
        assert_eq!(h.store.len().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn expired_code_fails_even_when_correct() -> Result<()> {
        let h = harness();
        let code = issue_and_read_code(&h, "alice@example.com").await?;
        h.clock.advance(TimeDelta::minutes(10));

        let result = h.service.verify("alice@example.com", &code).await;
        assert!(matches!(result, Err(OtpError::Expired)));
        assert!(h.store.get("alice@example.com").await?.is_none());

        let again = h.service.verify("alice@example.com", &code).await;
        assert!(matches!(again, Err(OtpError::NotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn code_just_before_expiry_is_accepted() -> Result<()> {
        let h = harness();
        let code = issue_and_read_code(&h, "alice@example.com").await?;
        h.clock.advance(TimeDelta::minutes(10) - TimeDelta::seconds(1));
        h.service.verify("alice@example.com", &code).await?;
        Ok(())
    }

    #[tokio::test]
    async fn reissue_resets_attempts_and_invalidates_old_code() -> Result<()> {
        let h = harness();
        let first = issue_and_read_code(&h, "alice@example.com").await?;
        let _ = h.service.verify("alice@example.com", &wrong_code(&first)).await;

        let mut second = issue_and_read_code(&h, "alice@example.com").await?;
        // Codes are random; force a distinct one so the old code must mismatch.
        if second == first {
            second = wrong_code(&first);
            if let Some(mut record) = h.store.get("alice@example.com").await? {
                record.code.clone_from(&second);
                h.store.put(record).await?;
            }
        }

        let record = h.store.get("alice@example.com").await?;
        assert_eq!(record.map(|r| r.attempts), Some(0));

        let old = h.service.verify("alice@example.com", &first).await;
        assert!(matches!(old, Err(OtpError::InvalidCode { .. })));
        h.service.verify("alice@example.com", &second).await?;
        Ok(())
    }

    #[tokio::test]
    async fn never_issued_email_is_not_found() {
        let h = harness();
        let result = h.service.verify("ghost@example.com", "123456").await;
        assert!(matches!(result, Err(OtpError::NotFound)));
    }

    #[tokio::test]
    async fn emails_are_not_normalized() -> Result<()> {
        let h = harness();
        let code = issue_and_read_code(&h, "Alice@Example.com").await?;
        let result = h.service.verify("alice@example.com", &code).await;
        assert!(matches!(result, Err(OtpError::NotFound)));
        h.service.verify("Alice@Example.com", &code).await?;
        Ok(())
    }

    #[tokio::test]
    async fn verify_requires_email_and_code() {
        let h = harness();
        assert!(matches!(
            h.service.verify("", "123456").await,
            Err(OtpError::InvalidInput(_))
        ));
        assert!(matches!(
            h.service.verify("alice@example.com", "").await,
            Err(OtpError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn whitespace_only_input_is_rejected_like_on_issue() {
        let h = harness();
        assert!(matches!(
            h.service.verify("   ", "123456").await,
            Err(OtpError::InvalidInput(_))
        ));
        assert!(matches!(
            h.service.verify("alice@example.com", " \t").await,
            Err(OtpError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn degrade_policy_keeps_code_when_delivery_fails() -> Result<()> {
        let h = harness_with(RecordingSender::failing(), OtpPolicy::new());
        let outcome = h.service.issue("alice@example.com").await?;

        assert!(!outcome.delivered);
        assert_eq!(outcome.delivery_id, None);
        assert_eq!(outcome.code, None);
        assert!(h.store.get("alice@example.com").await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn degrade_policy_can_expose_code_for_development() -> Result<()> {
        let policy = OtpPolicy::new().with_expose_code(true);
        let h = harness_with(RecordingSender::failing(), policy);
        let outcome = h.service.issue("alice@example.com").await?;

        let code = outcome.code.ok_or_else(|| anyhow!("code not exposed"))?;
        h.service.verify("alice@example.com", &code).await?;
        Ok(())
    }

    #[tokio::test]
    async fn strict_policy_drops_code_when_delivery_fails() -> Result<()> {
        let policy = OtpPolicy::new().with_delivery(DeliveryPolicy::Strict);
        let h = harness_with(RecordingSender::failing(), policy);

        let result = h.service.issue("alice@example.com").await;
        assert!(matches!(result, Err(OtpError::DeliveryFailure(_))));
        assert!(h.store.get("alice@example.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn exposed_code_is_never_returned_after_delivery() -> Result<()> {
        let policy = OtpPolicy::new().with_expose_code(true);
        let h = harness_with(RecordingSender::default(), policy);
        let outcome = h.service.issue("alice@example.com").await?;
        assert_eq!(outcome.code, None);
        Ok(())
    }

    #[tokio::test]
    async fn custom_attempt_ceiling_and_ttl() -> Result<()> {
        let policy = OtpPolicy::new().with_max_attempts(2).with_ttl_seconds(60);
        let h = harness_with(RecordingSender::default(), policy);
        let code = issue_and_read_code(&h, "alice@example.com").await?;

        let record = h.store.get("alice@example.com").await?;
        assert_eq!(
            record.map(|r| r.expires_at),
            Some(h.clock.now() + TimeDelta::seconds(60))
        );

        let wrong = wrong_code(&code);
        assert!(matches!(
            h.service.verify("alice@example.com", &wrong).await,
            Err(OtpError::InvalidCode {
                remaining_attempts: 1
            })
        ));
        assert!(matches!(
            h.service.verify("alice@example.com", &wrong).await,
            Err(OtpError::TooManyAttempts)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn purge_expired_sweeps_old_records() -> Result<()> {
        let h = harness();
        h.service.issue("old@example.com").await?;
        h.clock.advance(TimeDelta::minutes(5));
        h.service.issue("new@example.com").await?;
        h.clock.advance(TimeDelta::minutes(5));

        assert_eq!(h.service.purge_expired().await?, 1);
        assert_eq!(h.service.pending().await?, 1);
        Ok(())
    }

    #[test]
    fn policy_clamps_degenerate_values() {
        let policy = OtpPolicy::new().with_max_attempts(0).with_ttl_seconds(0);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.ttl(), TimeDelta::seconds(1));

        let policy = OtpPolicy::new().with_ttl_seconds(u64::MAX);
        assert_eq!(policy.ttl(), TimeDelta::MAX);
    }

    #[test]
    fn delivery_policy_parses() {
        assert_eq!("degrade".parse::<DeliveryPolicy>(), Ok(DeliveryPolicy::Degrade));
        assert_eq!(" Strict ".parse::<DeliveryPolicy>(), Ok(DeliveryPolicy::Strict));
        assert!("lenient".parse::<DeliveryPolicy>().is_err());
        assert_eq!(DeliveryPolicy::default(), DeliveryPolicy::Degrade);
        assert_eq!(DeliveryPolicy::Strict.to_string(), "strict");
    }
}
