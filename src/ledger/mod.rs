//! Balance Ledger — the single authority for a user's balance.
//!
//! The ledger owns the in-memory balance value; nothing else mutates
//! it. The Wager Manager requests mutation through `debit`/`credit`,
//! the promo path through `grant`, and synchronization with the remote
//! store happens through `load_or_init`/`sync`.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::store::BalanceStore;
use crate::types::GameError;

/// Authoritative balance for one user session.
///
/// `u64` makes the non-negativity invariant structural: the only way
/// down is a checked debit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    balance: u64,
}

impl Ledger {
    pub fn new(balance: u64) -> Self {
        Self { balance }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Remove `amount` from the balance.
    ///
    /// Errors when `amount > balance`. Callers are expected to have
    /// checked the submit predicate already, so a failure here is a
    /// programming-error condition — fail fast, never clamp.
    pub fn debit(&mut self, amount: u64) -> Result<(), GameError> {
        if amount > self.balance {
            return Err(GameError::InsufficientBalance {
                needed: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Add `amount` to the balance. No upper bound is enforced.
    pub fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Out-of-band balance override, used solely by promotional
    /// redemption.
    pub fn grant(&mut self, balance: u64) {
        self.balance = balance;
    }
}

// ---------------------------------------------------------------------------
// Remote synchronization
// ---------------------------------------------------------------------------

/// Load a user's ledger from the store. A fresh user gets the starting
/// balance, persisted immediately.
pub async fn load_or_init(
    store: &dyn BalanceStore,
    user_id: &str,
    starting_balance: u64,
) -> Result<Ledger> {
    match store
        .read(user_id)
        .await
        .with_context(|| format!("Failed to load wallet for {user_id}"))?
    {
        Some(balance) => {
            info!(user_id, balance, "Wallet loaded");
            Ok(Ledger::new(balance))
        }
        None => {
            store
                .write(user_id, starting_balance)
                .await
                .with_context(|| format!("Failed to initialise wallet for {user_id}"))?;
            info!(user_id, balance = starting_balance, "Fresh wallet initialised");
            Ok(Ledger::new(starting_balance))
        }
    }
}

/// Persist the current balance to the remote store.
///
/// Failures are not retried and never block gameplay; the in-memory
/// balance has already advanced, so a failed write is logged as a
/// divergence for operators to reconcile. Returns whether the write
/// landed.
pub async fn sync(store: &dyn BalanceStore, user_id: &str, balance: u64) -> bool {
    match store.write(user_id, balance).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                user_id,
                balance,
                error = %e,
                "Balance write failed — in-memory and stored balance have diverged"
            );
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
