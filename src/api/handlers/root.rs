use axum::response::IntoResponse;

use crate::APP_USER_AGENT;

// axum handler for root
pub async fn root() -> impl IntoResponse {
    format!("{APP_USER_AGENT}\n")
}
