//! Mock balance store for integration testing.
//!
//! Provides a deterministic `BalanceStore` implementation that keeps
//! balances in memory, records every write, and can be forced to fail
//! — no external dependencies.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use goldflip::store::BalanceStore;

/// In-memory balance store, fully controllable from test code.
pub struct MemoryStore {
    balances: Mutex<HashMap<String, u64>>,
    writes: Mutex<Vec<(String, u64)>>,
    /// If set, all operations will return this error.
    force_error: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            force_error: Mutex::new(None),
        }
    }

    /// Create a store pre-seeded with one user's balance.
    pub fn with_balance(user_id: &str, balance: u64) -> Self {
        let store = Self::new();
        store
            .balances
            .lock()
            .unwrap()
            .insert(user_id.to_string(), balance);
        store
    }

    /// Force all subsequent operations to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    /// Clear any forced error.
    pub fn clear_error(&self) {
        *self.force_error.lock().unwrap() = None;
    }

    /// The currently stored balance for a user, bypassing the trait.
    pub fn stored(&self, user_id: &str) -> Option<u64> {
        self.balances.lock().unwrap().get(user_id).copied()
    }

    /// Every write recorded so far, in order.
    pub fn writes(&self) -> Vec<(String, u64)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl BalanceStore for MemoryStore {
    async fn read(&self, user_id: &str) -> Result<Option<u64>> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        Ok(self.balances.lock().unwrap().get(user_id).copied())
    }

    async fn write(&self, user_id: &str, balance: u64) -> Result<()> {
        if let Some(err) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{}", err));
        }
        self.balances
            .lock()
            .unwrap()
            .insert(user_id.to_string(), balance);
        self.writes
            .lock()
            .unwrap()
            .push((user_id.to_string(), balance));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_absent_user() {
        let store = MemoryStore::new();
        assert!(store.read("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::new();
        store.write("player-1", 120).await.unwrap();
        assert_eq!(store.read("player-1").await.unwrap(), Some(120));
        assert_eq!(store.writes(), vec![("player-1".to_string(), 120)]);
    }

    #[tokio::test]
    async fn test_seeded_balance() {
        let store = MemoryStore::with_balance("player-1", 250);
        assert_eq!(store.read("player-1").await.unwrap(), Some(250));
        assert!(store.writes().is_empty()); // seeding is not a write
    }

    #[tokio::test]
    async fn test_forced_error() {
        let store = MemoryStore::new();
        store.set_error("simulated outage");

        assert!(store.read("player-1").await.is_err());
        assert!(store.write("player-1", 10).await.is_err());
        assert!(store.writes().is_empty());

        store.clear_error();
        assert!(store.write("player-1", 10).await.is_ok());
    }
}
