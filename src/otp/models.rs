use chrono::{DateTime, TimeDelta, Utc};

/// Pending passcode for one email address.
///
/// `email` is the store key and is kept exactly as submitted (no case folding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: u32,
}

impl OtpRecord {
    #[must_use]
    pub fn new(email: &str, code: String, issued_at: DateTime<Utc>, ttl: TimeDelta) -> Self {
        Self {
            email: email.to_string(),
            code,
            expires_at: issued_at
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            attempts: 0,
        }
    }

    /// A record is dead from `expires_at` onwards.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[must_use]
    pub fn attempts_exhausted(&self, max_attempts: u32) -> bool {
        self.attempts >= max_attempts
    }
}
