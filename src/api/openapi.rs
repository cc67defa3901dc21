#![allow(clippy::needless_for_each)]

use utoipa::{
    openapi::{Contact, License},
    OpenApi,
};

use super::handlers::{health, otp, smtp, types};

#[derive(OpenApi)]
#[openapi(
    paths(otp::send_otp, otp::verify_otp, smtp::test_smtp, health::health),
    components(schemas(
        types::SendOtpRequest,
        types::SendOtpResponse,
        types::VerifyOtpRequest,
        types::VerifyOtpResponse,
        types::ErrorResponse,
        types::SmtpConfigSummary,
        types::SmtpTestResponse,
        health::Health
    )),
    tags(
        (name = "otp", description = "Issue and verify email one-time passcodes"),
        (name = "smtp", description = "Email relay diagnostics"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

/// `OpenAPI` document served at `/api-docs/openapi.json` and printed by the
/// `openapi` binary.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = env!("CARGO_PKG_NAME").to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.info.description = optional_str(env!("CARGO_PKG_DESCRIPTION")).map(str::to_string);
    doc.info.contact = cargo_contact();
    doc.info.license = optional_str(env!("CARGO_PKG_LICENSE")).map(|identifier| {
        let mut license = License::new(identifier);
        license.identifier = Some(identifier.to_string());
        license
    });
    doc
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `:` separated and may include "Name <email>".
    let primary = env!("CARGO_PKG_AUTHORS").split(':').next().map(str::trim)?;
    let (name, email) = match primary.find('<') {
        Some(start) => (
            primary[..start].trim(),
            primary[start + 1..].trim_end_matches('>').trim(),
        ),
        None => (primary, ""),
    };

    if name.is_empty() && email.is_empty() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = optional_str(name).map(str::to_string);
    contact.email = optional_str(email).map(str::to_string);
    Some(contact)
}

fn optional_str(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
