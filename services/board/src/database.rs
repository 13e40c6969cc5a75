//! Store construction for the board service

use anyhow::Result;
use common::{
    database::{DatabaseConfig, SharedPool, health_check},
    error::DatabaseResult,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    repositories::{AccountRepository, AccountStore, MemoryStore, MessageRepository, MessageStore},
    settings::StoreBackend,
};

/// Account and message stores backing one service instance
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn AccountStore>,
    pub messages: Arc<dyn MessageStore>,
}

impl Stores {
    /// Both stores backed by one in-memory store
    pub fn memory() -> Self {
        let store = MemoryStore::new();
        Stores {
            accounts: Arc::new(store.clone()),
            messages: Arc::new(store),
        }
    }

    /// Both stores backed by PostgreSQL through one shared pool
    pub fn postgres(pool: SharedPool) -> Self {
        Stores {
            accounts: Arc::new(AccountRepository::new(pool.clone())),
            messages: Arc::new(MessageRepository::new(pool)),
        }
    }
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &SharedPool) -> DatabaseResult<()> {
    let pool = pool.get().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("Database migrations applied");
    Ok(())
}

/// Open the configured stores, migrating PostgreSQL first
pub async fn open_stores(backend: StoreBackend) -> Result<Stores> {
    match backend {
        StoreBackend::Memory => {
            info!("Using in-memory store, data will not survive a restart");
            Ok(Stores::memory())
        }
        StoreBackend::Postgres => {
            let pool = SharedPool::new(DatabaseConfig::from_env()?);
            run_migrations(&pool).await?;

            if !health_check(&pool.get().await?).await? {
                anyhow::bail!("Failed to connect to database");
            }
            info!("Database connection successful");

            Ok(Stores::postgres(pool))
        }
    }
}
