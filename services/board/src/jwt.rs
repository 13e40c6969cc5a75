//! JWT service for session token generation and validation
//!
//! Session tokens are HS256-signed and carry the account's identity and
//! access level. Nothing about them is stored server-side: a token stays
//! valid until it expires, even if the account's access level changes in
//! the meantime.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::models::{AccessLevel, Account};

/// Seven days, the lifetime of both the token and its cookie
pub const DEFAULT_TOKEN_EXPIRY: u64 = 604_800;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared secret for signing and verifying tokens
    pub secret: String,
    /// Token expiration time in seconds (default: 7 days)
    pub token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HS256 signing secret
    /// - `JWT_TOKEN_EXPIRY`: Token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let token_expiry = std::env::var("JWT_TOKEN_EXPIRY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_EXPIRY);

        Ok(JwtConfig {
            secret,
            token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID
    pub sub: Uuid,
    /// Account email at issuance
    pub email: String,
    /// Access level at issuance
    pub access_level: Option<AccessLevel>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Issue a session token reflecting the account's current state
    pub fn issue(&self, account: &Account) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: account.id,
            email: account.email.clone(),
            access_level: account.access_level,
            iat: now,
            exp: now + self.config.token_expiry,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token's signature and expiry and return the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Get the token expiry time in seconds
    pub fn token_expiry(&self) -> u64 {
        self.config.token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serial_test::serial;

    fn service(secret: &str) -> JwtService {
        JwtService::new(JwtConfig {
            secret: secret.to_string(),
            token_expiry: DEFAULT_TOKEN_EXPIRY,
        })
    }

    fn active_account(level: AccessLevel) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: Some("hash".to_string()),
            is_temporary: false,
            access_level: Some(level),
            verification_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_token_round_trips_identity() {
        let jwt = service("test-secret");
        let account = active_account(AccessLevel::Read);

        let claims = jwt.validate_token(&jwt.issue(&account).unwrap()).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.access_level, Some(AccessLevel::Read));
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_EXPIRY);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = service("secret-a")
            .issue(&active_account(AccessLevel::Write))
            .unwrap();
        assert!(service("secret-b").validate_token(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = service("test-secret");
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            access_level: Some(AccessLevel::Read),
            iat: now - 2 * 3600,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(jwt.validate_token(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(service("test-secret").validate_token("not.a.token").is_err());
        assert!(service("test-secret").validate_token("").is_err());
    }

    #[test]
    #[serial]
    fn test_jwt_config_from_env() {
        unsafe {
            std::env::set_var("JWT_SECRET", "from-env");
            std::env::remove_var("JWT_TOKEN_EXPIRY");
        }
        let config = JwtConfig::from_env().unwrap();
        assert_eq!(config.secret, "from-env");
        assert_eq!(config.token_expiry, DEFAULT_TOKEN_EXPIRY);

        unsafe {
            std::env::set_var("JWT_TOKEN_EXPIRY", "60");
        }
        assert_eq!(JwtConfig::from_env().unwrap().token_expiry, 60);

        unsafe {
            std::env::remove_var("JWT_SECRET");
            std::env::remove_var("JWT_TOKEN_EXPIRY");
        }
        assert!(JwtConfig::from_env().is_err());
    }
}
