use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use super::handlers::types::ErrorResponse;
use crate::otp::OtpError;

/// Error half of every JSON handler: a status plus `{success: false, error, code}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: &'static str,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            code: "invalid_input",
        }
    }

    #[must_use]
    pub fn missing_payload() -> Self {
        Self::bad_request("Missing payload")
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<OtpError> for ApiError {
    fn from(err: OtpError) -> Self {
        let status = match &err {
            OtpError::InvalidInput(_)
            | OtpError::Expired
            | OtpError::TooManyAttempts
            | OtpError::InvalidCode { .. } => StatusCode::BAD_REQUEST,
            OtpError::NotFound => StatusCode::NOT_FOUND,
            OtpError::DeliveryFailure(_) => StatusCode::BAD_GATEWAY,
            OtpError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Transport and store details stay in the logs.
        let message = match &err {
            OtpError::DeliveryFailure(source) => {
                error!("OTP delivery failed: {source}");
                "Failed to send verification email".to_string()
            }
            OtpError::Store(source) => {
                error!("OTP store failure: {source:#}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        Self {
            status,
            message,
            code: err.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.message,
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}
