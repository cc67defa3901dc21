//! Route handlers and shared request validation.

pub mod health;
pub mod otp;
pub mod root;
pub mod smtp;
pub mod types;

use regex::Regex;

/// Basic `local@domain.tld` shape check applied before issuing a code.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}
