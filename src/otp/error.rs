use crate::mail::DeliveryError;

/// Failures surfaced by the OTP service.
///
/// Display strings are user facing and returned verbatim by the HTTP API,
/// except for [`OtpError::Store`] which is logged and masked.
#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("OTP not found or expired")]
    NotFound,
    #[error("OTP has expired")]
    Expired,
    #[error("Too many attempts")]
    TooManyAttempts,
    #[error("Invalid OTP")]
    InvalidCode { remaining_attempts: u32 },
    #[error("Failed to send verification email: {0}")]
    DeliveryFailure(#[source] DeliveryError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl OtpError {
    /// Stable machine-readable identifier for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound => "not_found",
            Self::Expired => "expired",
            Self::TooManyAttempts => "too_many_attempts",
            Self::InvalidCode { .. } => "invalid_code",
            Self::DeliveryFailure(_) => "delivery_failure",
            Self::Store(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_distinct() {
        let errors = [
            OtpError::InvalidInput("Email is required"),
            OtpError::NotFound,
            OtpError::Expired,
            OtpError::TooManyAttempts,
            OtpError::InvalidCode {
                remaining_attempts: 2,
            },
            OtpError::DeliveryFailure(DeliveryError::Transport("down".to_string())),
            OtpError::Store(anyhow::anyhow!("boom")),
        ];
        let mut kinds: Vec<&str> = errors.iter().map(OtpError::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn messages_match_the_signup_form_copy() {
        assert_eq!(OtpError::NotFound.to_string(), "OTP not found or expired");
        assert_eq!(OtpError::Expired.to_string(), "OTP has expired");
        assert_eq!(OtpError::TooManyAttempts.to_string(), "Too many attempts");
        assert_eq!(
            OtpError::InvalidCode {
                remaining_attempts: 1
            }
            .to_string(),
            "Invalid OTP"
        );
        assert_eq!(
            OtpError::InvalidInput("Email and OTP are required").to_string(),
            "Email and OTP are required"
        );
    }
}
