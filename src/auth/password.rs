use bcrypt::{hash, verify, DEFAULT_COST};

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Check a password against a stored hash. Undecodable hashes count as a
/// mismatch rather than an error.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    verify(password, password_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_roundtrip() {
        let hashed = hash_password("hunter2").unwrap();
        assert_ne!(hashed, "hunter2");
        assert!(verify_password("hunter2", &hashed));
        assert!(!verify_password("hunter3", &hashed));
    }

    #[test]
    fn test_garbage_hash_is_mismatch() {
        assert!(!verify_password("hunter2", "not-a-bcrypt-hash"));
    }
}
