use rand::Rng;
use subtle::ConstantTimeEq;

/// Generates a cryptographically random CSRF `state` parameter for `OAuth2`.
///
/// Returns a 32-character lowercase hex string (16 random bytes).
#[must_use]
pub fn generate_state() -> String {
    let random_bytes: [u8; 16] = rand::rng().random();
    hex::encode(random_bytes)
}

/// Compares a callback `state` against the stored one in constant time.
#[must_use]
pub fn state_matches(expected: &str, received: &str) -> bool {
    let expected = expected.as_bytes();
    let received = received.as_bytes();

    if expected.len() == received.len() {
        expected.ct_eq(received).into()
    } else {
        // Same amount of work on a length mismatch.
        let _ = expected.ct_eq(expected);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_length() {
        let state = generate_state();
        assert_eq!(state.len(), 32);
    }

    #[test]
    fn test_state_is_hex() {
        let state = generate_state();
        assert!(
            state.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()),
            "state should be lowercase hex: {state}"
        );
    }

    #[test]
    fn test_state_uniqueness() {
        let s1 = generate_state();
        let s2 = generate_state();
        assert_ne!(s1, s2, "states should be unique");
    }

    #[test]
    fn test_state_matches() {
        assert!(state_matches("abc123", "abc123"));
        assert!(!state_matches("abc123", "abc124"));
        assert!(!state_matches("abc123", "abc12"));
        assert!(!state_matches("", "a"));
        assert!(state_matches("", ""));
    }

    #[test]
    fn test_state_matches_generated() {
        let state = generate_state();
        assert!(state_matches(&state, &state));
        assert!(!state_matches(&state, &generate_state()));
    }
}
