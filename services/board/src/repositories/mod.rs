//! Repositories for account and message persistence
//!
//! Controllers only see the [`AccountStore`] and [`MessageStore`] traits.
//! PostgreSQL repositories back the service in production; [`MemoryStore`]
//! backs local development and the test suite.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{AccessLevel, Account, MessageScope, MessageView, NewAccount, NewMessage};

pub mod account;
pub mod memory;
pub mod message;

pub use account::AccountRepository;
pub use memory::MemoryStore;
pub use message::MessageRepository;

/// Persistence for accounts, one per normalized email
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Find an account by its normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Find an account by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    /// Claim an email as a temporary account holding `verification_code`.
    ///
    /// If the email was claimed concurrently, the stored code is overwritten
    /// instead and the existing account is returned.
    async fn insert_temporary(&self, new_account: &NewAccount) -> Result<Account>;

    /// Persist every mutable field of `account` and bump `updated_at`
    async fn save(&self, account: &Account) -> Result<Account>;

    /// Change only the access level, leaving the code and password as stored
    async fn set_access_level(&self, id: Uuid, level: AccessLevel) -> Result<Option<Account>>;
}

/// Persistence for board messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Store a message and return it joined with the author's email
    async fn insert(&self, new_message: &NewMessage) -> Result<MessageView>;

    /// List messages newest-first
    async fn list(&self, scope: MessageScope) -> Result<Vec<MessageView>>;
}
