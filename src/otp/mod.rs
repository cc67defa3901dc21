//! Email one-time passcode (OTP) lifecycle.
//!
//! A code is issued per email address, delivered out of band, and consumed by
//! a single successful verification. Every record follows:
//!
//! ```text
//! absent -> pending -> { consumed | expired | attempts-exhausted }
//! ```
//!
//! All terminal transitions remove the record from the store.
//!
//! ## Storage
//!
//! Records live behind the [`OtpStore`] trait. The default [`MemoryOtpStore`]
//! is process local: codes do not survive a restart and are not shared across
//! instances, so a code issued on one replica cannot be verified on another.
//!
//! ## Concurrency
//!
//! Each store call is atomic, but `verify` is a read-modify-write over several
//! calls. An `issue` racing a `verify` for the same email may overwrite the
//! record in between; for a human-driven, attempt-limited, 10-minute window
//! this is accepted.

pub mod clock;
pub mod code;
mod error;
pub mod models;
pub mod service;
pub mod store;
mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::OtpError;
pub use models::OtpRecord;
pub use service::{DeliveryPolicy, IssueOutcome, OtpPolicy, OtpService};
pub use store::{MemoryOtpStore, OtpStore};
pub use sweeper::spawn_sweeper;
