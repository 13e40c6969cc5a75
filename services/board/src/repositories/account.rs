//! PostgreSQL account repository

use anyhow::Result;
use async_trait::async_trait;
use common::database::SharedPool;
use sqlx::{Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::AccountStore;
use crate::models::{AccessLevel, Account, NewAccount};

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, is_temporary, access_level, \
                               verification_code, created_at, updated_at";

/// Account repository
#[derive(Clone)]
pub struct AccountRepository {
    pool: SharedPool,
}

impl AccountRepository {
    /// Create a new account repository
    pub fn new(pool: SharedPool) -> Self {
        Self { pool }
    }
}

fn account_from_row(row: &PgRow) -> Result<Account> {
    let access_level = row
        .get::<Option<String>, _>("access_level")
        .map(|level| level.parse::<AccessLevel>())
        .transpose()?;

    Ok(Account {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_temporary: row.get("is_temporary"),
        access_level,
        verification_code: row.get("verification_code"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl AccountStore for AccountRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let pool = self.pool.get().await?;
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let pool = self.pool.get().await?;
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn insert_temporary(&self, new_account: &NewAccount) -> Result<Account> {
        info!("Claiming email: {}", new_account.email);

        let pool = self.pool.get().await?;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO accounts (id, email, is_temporary, verification_code)
            VALUES ($1, $2, TRUE, $3)
            ON CONFLICT (email) DO UPDATE
                SET verification_code = EXCLUDED.verification_code,
                    updated_at = NOW()
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_account.email)
        .bind(&new_account.verification_code)
        .fetch_one(&pool)
        .await?;

        account_from_row(&row)
    }

    async fn save(&self, account: &Account) -> Result<Account> {
        let pool = self.pool.get().await?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE accounts
            SET password_hash = $2,
                is_temporary = $3,
                access_level = $4,
                verification_code = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(account.id)
        .bind(&account.password_hash)
        .bind(account.is_temporary)
        .bind(account.access_level.map(|level| level.as_str()))
        .bind(&account.verification_code)
        .fetch_optional(&pool)
        .await?;

        match row {
            Some(row) => account_from_row(&row),
            None => anyhow::bail!("account {} no longer exists", account.id),
        }
    }

    async fn set_access_level(&self, id: Uuid, level: AccessLevel) -> Result<Option<Account>> {
        let pool = self.pool.get().await?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE accounts
            SET access_level = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(level.as_str())
        .fetch_optional(&pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }
}
