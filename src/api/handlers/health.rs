use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

use crate::{otp::OtpService, GIT_COMMIT_HASH};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    otp_store: String,
    pending_codes: usize,
}

#[utoipa::path(
    get,
    path= "/health",
    responses (
        (status = 200, description = "OTP store is reachable", body = [Health]),
        (status = 503, description = "OTP store is unhealthy", body = [Health])
    ),
    tag= "health"
)]
// axum handler for health
pub async fn health(method: Method, service: Extension<Arc<OtpService>>) -> impl IntoResponse {
    let pending = service.pending().await;

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        otp_store: if pending.is_ok() {
            "ok".to_string()
        } else {
            "error".to_string()
        },
        pending_codes: pending.as_ref().copied().unwrap_or_default(),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    match pending {
        Ok(count) => {
            debug!(pending_codes = count, "OTP store is healthy");
            (StatusCode::OK, headers, body)
        }
        Err(err) => {
            error!("OTP store health check failed: {err}");
            (StatusCode::SERVICE_UNAVAILABLE, headers, body)
        }
    }
}
