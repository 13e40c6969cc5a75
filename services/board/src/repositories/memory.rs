//! In-memory store for local development and tests

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, MessageStore};
use crate::models::{
    AccessLevel, Account, BOARD_PAGE_SIZE, Message, MessageScope, MessageView, NewAccount, NewMessage,
};

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<Uuid, Account>,
    /// Insertion order
    messages: Vec<Message>,
}

/// Accounts and messages held in process memory.
///
/// Clones share the same data. Nothing survives a restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn view_of(message: &Message, accounts: &HashMap<Uuid, Account>) -> Option<MessageView> {
    let author = accounts.get(&message.author_id)?;
    Some(MessageView {
        id: message.id,
        body: message.body.clone(),
        author_id: message.author_id,
        author_email: author.email.clone(),
        created_at: message.created_at,
        updated_at: message.updated_at,
    })
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn insert_temporary(&self, new_account: &NewAccount) -> Result<Account> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        if let Some(existing) = state
            .accounts
            .values_mut()
            .find(|account| account.email == new_account.email)
        {
            existing.verification_code = Some(new_account.verification_code.clone());
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: new_account.email.clone(),
            password_hash: None,
            is_temporary: true,
            access_level: None,
            verification_code: Some(new_account.verification_code.clone()),
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn save(&self, account: &Account) -> Result<Account> {
        let mut state = self.state.write().await;
        let Some(stored) = state.accounts.get_mut(&account.id) else {
            anyhow::bail!("account {} no longer exists", account.id);
        };

        stored.password_hash = account.password_hash.clone();
        stored.is_temporary = account.is_temporary;
        stored.access_level = account.access_level;
        stored.verification_code = account.verification_code.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn set_access_level(&self, id: Uuid, level: AccessLevel) -> Result<Option<Account>> {
        let mut state = self.state.write().await;
        Ok(state.accounts.get_mut(&id).map(|stored| {
            stored.access_level = Some(level);
            stored.updated_at = Utc::now();
            stored.clone()
        }))
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, new_message: &NewMessage) -> Result<MessageView> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let message = Message {
            id: Uuid::new_v4(),
            author_id: new_message.author_id,
            body: new_message.body.clone(),
            created_at: now,
            updated_at: now,
        };

        let Some(view) = view_of(&message, &state.accounts) else {
            anyhow::bail!("author {} does not exist", new_message.author_id);
        };
        state.messages.push(message);
        Ok(view)
    }

    async fn list(&self, scope: MessageScope) -> Result<Vec<MessageView>> {
        let state = self.state.read().await;

        // Newest first; equal timestamps keep reverse insertion order
        let mut messages: Vec<&Message> = state
            .messages
            .iter()
            .rev()
            .filter(|message| match scope {
                MessageScope::Board => true,
                MessageScope::Author(author_id) => message.author_id == author_id,
            })
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        if scope == MessageScope::Board {
            messages.truncate(BOARD_PAGE_SIZE);
        }

        Ok(messages
            .into_iter()
            .filter_map(|message| view_of(message, &state.accounts))
            .collect())
    }
}
