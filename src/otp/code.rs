//! Passcode generation and comparison.

use rand::Rng;

pub const CODE_LENGTH: usize = 6;
const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// Draw a fresh 6-digit code uniformly from `[100000, 999999]`.
#[must_use]
pub fn generate_code() -> String {
    let code = rand::thread_rng().gen_range(CODE_MIN..=CODE_MAX);
    format!("{code:0width$}", width = CODE_LENGTH)
}

/// Compare a stored code with a submitted one without short-circuiting on the
/// first differing byte.
#[must_use]
pub fn codes_match(expected: &str, supplied: &str) -> bool {
    if expected.len() != supplied.len() {
        return false;
    }
    expected
        .bytes()
        .zip(supplied.bytes())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
