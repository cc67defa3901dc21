use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{error, instrument};

use super::types::{ErrorResponse, SmtpConfigSummary, SmtpTestResponse};
use crate::mail::SmtpEmailSender;

/// What `/api/test-smtp` reports on and, when credentials exist, probes.
#[derive(Clone)]
pub struct SmtpProbe {
    sender: Option<Arc<SmtpEmailSender>>,
    summary: SmtpConfigSummary,
}

impl SmtpProbe {
    #[must_use]
    pub fn new(sender: Option<Arc<SmtpEmailSender>>, host: &str, port: u16) -> Self {
        let user = if sender.is_some() {
            "Configured"
        } else {
            "Missing"
        };
        Self {
            sender,
            summary: SmtpConfigSummary {
                host: host.to_string(),
                user: user.to_string(),
                port,
            },
        }
    }

    #[must_use]
    pub fn summary(&self) -> &SmtpConfigSummary {
        &self.summary
    }
}

#[utoipa::path(
    get,
    path = "/api/test-smtp",
    responses(
        (status = 200, description = "SMTP relay accepted a connection", body = SmtpTestResponse),
        (status = 500, description = "SMTP relay unreachable or rejected the handshake", body = SmtpTestResponse),
        (status = 503, description = "No SMTP credentials configured", body = ErrorResponse),
    ),
    tag = "smtp"
)]
#[instrument(skip(probe))]
pub async fn test_smtp(probe: Extension<Arc<SmtpProbe>>) -> impl IntoResponse {
    let Some(sender) = probe.sender.as_ref() else {
        let body = ErrorResponse {
            success: false,
            error: "SMTP is not configured".to_string(),
            code: "smtp_not_configured".to_string(),
        };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    };

    match sender.check().await {
        Ok(()) => {
            let body = SmtpTestResponse {
                success: true,
                message: "SMTP connection successful".to_string(),
                error: None,
                config: probe.summary.clone(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            error!("SMTP test error: {err}");
            let body = SmtpTestResponse {
                success: false,
                message: "SMTP connection failed".to_string(),
                error: Some(err.to_string()),
                config: probe.summary.clone(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
