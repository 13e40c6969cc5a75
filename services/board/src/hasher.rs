//! Password hashing with Argon2id

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};

/// One-way password hasher
#[derive(Clone, Default)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Hasher with explicit Argon2id cost parameters
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| anyhow::anyhow!("Invalid Argon2 parameters: {}", e))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password into a PHC string
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        Ok(password_hash)
    }

    /// Check a password against a stored PHC string
    pub fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = CredentialHasher::with_params(8, 1, 1).unwrap();
        let hash = hasher.hash("pw123456").unwrap();

        assert_ne!(hash, "pw123456");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("pw123456", &hash).unwrap());
        assert!(!hasher.verify("pw1234567", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = CredentialHasher::with_params(8, 1, 1).unwrap();
        assert_ne!(
            hasher.hash("pw123456").unwrap(),
            hasher.hash("pw123456").unwrap()
        );
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let hasher = CredentialHasher::default();
        assert!(hasher.verify("pw123456", "not-a-phc-string").is_err());
    }
}
