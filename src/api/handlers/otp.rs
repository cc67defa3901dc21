use axum::{extract::Extension, Json};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    types::{ErrorResponse, SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse},
    valid_email,
};
use crate::{api::error::ApiError, otp::OtpService};

#[utoipa::path(
    post,
    path = "/api/send-otp",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "Code issued", body = SendOtpResponse),
        (status = 400, description = "Missing or malformed email", body = ErrorResponse),
        (status = 502, description = "Email delivery failed under the strict policy", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "otp"
)]
#[instrument(skip(service, payload))]
pub async fn send_otp(
    service: Extension<Arc<OtpService>>,
    payload: Option<Json<SendOtpRequest>>,
) -> Result<Json<SendOtpResponse>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::missing_payload());
    };

    let email = request.email.trim();
    if email.is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }

    if !valid_email(email) {
        return Err(ApiError::bad_request("Invalid email"));
    }

    let outcome = service.issue(email).await?;
    debug!(delivered = outcome.delivered, "OTP issued");

    let response = if outcome.delivered {
        SendOtpResponse {
            success: true,
            message: "OTP sent successfully".to_string(),
            delivered: true,
            debug: service.policy().expose_code(),
            otp: None,
        }
    } else {
        SendOtpResponse {
            success: true,
            message: "OTP generated successfully (email may not have been sent)".to_string(),
            delivered: false,
            debug: true,
            otp: outcome.code,
        }
    };

    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/send-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "Code accepted and consumed", body = VerifyOtpResponse),
        (status = 400, description = "Missing input, expired code, wrong code or too many attempts", body = ErrorResponse),
        (status = 404, description = "No pending code for this email", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "otp"
)]
#[instrument(skip(service, payload))]
pub async fn verify_otp(
    service: Extension<Arc<OtpService>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> Result<Json<VerifyOtpResponse>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::missing_payload());
    };

    service
        .verify(request.email.trim(), request.otp.trim())
        .await?;

    Ok(Json(VerifyOtpResponse {
        success: true,
        message: "OTP verified successfully".to_string(),
    }))
}
