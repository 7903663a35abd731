use crate::error::AppError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Fingerprints a refresh token with HMAC-SHA256 keyed by the signing
/// secret. Only the fingerprint is ever persisted.
pub fn fingerprint_token(secret: &str, raw_token: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Failed to create HMAC: {}", e)))?;

    mac.update(raw_token.as_bytes());

    let result = mac.finalize();
    Ok(hex::encode(result.into_bytes()))
}

/// Compares two fingerprints in constant time.
pub fn constant_time_equal(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a-test-secret-of-at-least-32-bytes!";

    #[test]
    fn fingerprint_is_stable_and_hex() {
        let a = fingerprint_token(SECRET, "some.jwt.token").unwrap();
        let b = fingerprint_token(SECRET, "some.jwt.token").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_depends_on_secret_and_input() {
        let base = fingerprint_token(SECRET, "some.jwt.token").unwrap();

        let other_input = fingerprint_token(SECRET, "other.jwt.token").unwrap();
        assert_ne!(base, other_input);

        let other_secret =
            fingerprint_token("another-secret-that-is-32-bytes-long!", "some.jwt.token").unwrap();
        assert_ne!(base, other_secret);
    }

    #[test]
    fn constant_time_equal_matches_exactly() {
        assert!(constant_time_equal("abc123", "abc123"));
        assert!(!constant_time_equal("abc123", "abc124"));
        assert!(!constant_time_equal("abc", "abc123"));
        assert!(constant_time_equal("", ""));
    }
}
