//! # Looma (Email OTP Gate)
//!
//! `looma` gates signups behind a one-time passcode sent by email. A client
//! asks for a code, the user reads it from their inbox, and the client submits
//! it back. Only after a successful verification does the caller go on to
//! create the account with the identity platform.
//!
//! ## Codes
//!
//! - 6 decimal digits, valid for 10 minutes, 5 attempts.
//! - One pending code per email address. Re-issuing overwrites the previous
//!   code and resets the attempt counter.
//! - A code is consumed by the first successful verification.
//!
//! ## Delivery
//!
//! Codes go out over an authenticated SMTP relay. Without SMTP credentials
//! nothing is sent and every issue counts as a failed delivery. When delivery
//! fails the configured [`otp::DeliveryPolicy`] decides whether the issued
//! code stays usable.
//!
//! ## Storage
//!
//! Pending codes are held in process memory and are lost on restart. Running
//! more than one replica breaks verification unless requests are pinned.

pub mod api;
pub mod cli;
pub mod mail;
pub mod otp;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
