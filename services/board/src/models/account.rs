//! Account model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

/// Coarse authorization tier carried in session tokens.
///
/// Ordered so that `Write` satisfies any `Read` requirement. An account with
/// no level yet is modelled as `Option::<AccessLevel>::None`, which sorts
/// below both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Read,
    Write,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown access level: {0}")]
pub struct UnknownAccessLevel(pub String);

impl FromStr for AccessLevel {
    type Err = UnknownAccessLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(AccessLevel::Read),
            "write" => Ok(AccessLevel::Write),
            other => Err(UnknownAccessLevel(other.to_string())),
        }
    }
}

/// Account entity, one per normalized email
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub is_temporary: bool,
    pub access_level: Option<AccessLevel>,
    pub verification_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Public view, without password hash or verification code
    pub fn to_view(&self) -> AccountView {
        AccountView {
            id: self.id,
            email: self.email.clone(),
            is_temporary: self.is_temporary,
            access_level: self.access_level,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Lookup view, which also exposes the pending verification code
    pub fn to_lookup_view(&self) -> AccountLookupView {
        AccountLookupView {
            account: self.to_view(),
            verification_code: self.verification_code.clone(),
        }
    }
}

/// Payload for claiming an email with a fresh verification code
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub verification_code: String,
}

/// Account as returned by the API
///
/// Timestamps are camelCase while the state fields keep their snake_case
/// wire names, which existing clients read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub email: String,
    #[serde(rename = "is_temporary")]
    pub is_temporary: bool,
    #[serde(rename = "access_level")]
    pub access_level: Option<AccessLevel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account view for the by-email lookup endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountLookupView {
    #[serde(flatten)]
    pub account: AccountView,
    pub verification_code: Option<String>,
}
