//! Verification code generation

use rand::Rng;

/// Smallest and largest codes; every code has exactly six digits
const CODE_RANGE: std::ops::RangeInclusive<u32> = 100_000..=999_999;

/// Generate a uniformly random 6-digit verification code
pub fn generate_verification_code() -> String {
    rand::thread_rng().gen_range(CODE_RANGE).to_string()
}
