//! Persistence collaborator.
//!
//! The remote store holds exactly one scalar per user: the wallet
//! balance. The `BalanceStore` trait keeps that contract narrow — read
//! and write, keyed by user id, no transaction or conflict-resolution
//! guarantees assumed. The shipped implementation is SQLite via sqlx;
//! tests use the generated mock or the in-memory store from the
//! integration suite.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// Abstraction over the remote balance store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Read the stored balance for a user. `None` means no record
    /// exists yet (fresh user).
    async fn read(&self, user_id: &str) -> Result<Option<u64>>;

    /// Write the balance for a user, creating the record if absent.
    async fn write(&self, user_id: &str, balance: u64) -> Result<()>;
}

// ---------------------------------------------------------------------------
// SQLite implementation
// ---------------------------------------------------------------------------

const CREATE_WALLETS: &str = "CREATE TABLE IF NOT EXISTS wallets (
    user_id TEXT PRIMARY KEY,
    balance INTEGER NOT NULL
)";

/// sqlx-backed store, one row per user.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to the given sqlx sqlite URL and ensure the schema
    /// exists. An in-memory URL is pinned to a single connection so
    /// every query sees the same database.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {url}"))?
            .create_if_missing(true);

        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {url}"))?;

        sqlx::query(CREATE_WALLETS)
            .execute(&pool)
            .await
            .context("Failed to create wallets table")?;

        info!(url, "Balance store ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl BalanceStore for SqliteStore {
    async fn read(&self, user_id: &str) -> Result<Option<u64>> {
        let row = sqlx::query("SELECT balance FROM wallets WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to read balance for {user_id}"))?;

        match row {
            Some(row) => {
                let balance: i64 = row
                    .try_get("balance")
                    .context("wallets.balance column")?;
                Ok(Some(balance.max(0) as u64))
            }
            None => {
                debug!(user_id, "No stored balance");
                Ok(None)
            }
        }
    }

    async fn write(&self, user_id: &str, balance: u64) -> Result<()> {
        sqlx::query(
            "INSERT INTO wallets (user_id, balance) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET balance = excluded.balance",
        )
        .bind(user_id)
        .bind(balance as i64)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to write balance for {user_id}"))?;

        debug!(user_id, balance, "Balance persisted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
