use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SendOtpResponse {
    pub success: bool,
    pub message: String,
    /// False when the code was stored but the email could not be sent.
    pub delivered: bool,
    /// True on the degraded path, or when the service runs with
    /// `--debug-echo-otp`.
    pub debug: bool,
    /// Present only in development setups that echo undelivered codes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyOtpResponse {
    pub success: bool,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    /// Machine readable kind, e.g. `invalid_code` or `expired`.
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfigSummary {
    pub host: String,
    /// `Configured` or `Missing`.
    pub user: String,
    pub port: u16,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SmtpTestResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub config: SmtpConfigSummary,
}
