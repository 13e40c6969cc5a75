//! Server configuration

use anyhow::Result;
use std::str::FromStr;

/// Where accounts and messages are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("unknown STORE_BACKEND: {}", other),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_address: String,
    /// Whether session cookies carry the `Secure` attribute
    pub cookie_secure: bool,
    /// Shared secret that grants write access
    pub upgrade_code: String,
    /// Store implementation
    pub store_backend: StoreBackend,
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDRESS`: Listener address (default: 0.0.0.0:3000)
    /// - `COOKIE_SECURE`: `true` or `false` (default: true)
    /// - `UPGRADE_CODE`: Shared write-access secret (default: alkira)
    /// - `STORE_BACKEND`: `postgres` or `memory` (default: postgres)
    pub fn from_env() -> Result<Self> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let cookie_secure = match std::env::var("COOKIE_SECURE") {
            Ok(value) => parse_bool(&value)
                .ok_or_else(|| anyhow::anyhow!("COOKIE_SECURE must be true or false"))?,
            Err(_) => true,
        };

        let upgrade_code = std::env::var("UPGRADE_CODE")
            .ok()
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(|| "alkira".to_string());

        let store_backend = match std::env::var("STORE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Postgres,
        };

        Ok(ServerConfig {
            bind_address,
            cookie_secure,
            upgrade_code,
            store_backend,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 4] = [
        "BIND_ADDRESS",
        "COOKIE_SECURE",
        "UPGRADE_CODE",
        "STORE_BACKEND",
    ];

    fn clear() {
        for key in KEYS {
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn test_server_config_defaults() {
        clear();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert!(config.cookie_secure);
        assert_eq!(config.upgrade_code, "alkira");
        assert_eq!(config.store_backend, StoreBackend::Postgres);
    }

    #[test]
    #[serial]
    fn test_server_config_from_env_with_custom_values() {
        clear();
        unsafe {
            std::env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            std::env::set_var("COOKIE_SECURE", "false");
            std::env::set_var("UPGRADE_CODE", "letmein");
            std::env::set_var("STORE_BACKEND", "Memory");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert!(!config.cookie_secure);
        assert_eq!(config.upgrade_code, "letmein");
        assert_eq!(config.store_backend, StoreBackend::Memory);

        unsafe {
            std::env::set_var("COOKIE_SECURE", "sometimes");
        }
        assert!(ServerConfig::from_env().is_err());
        clear();
    }
}
