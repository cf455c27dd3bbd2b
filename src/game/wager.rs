//! Wager selection and the settlement state machine.
//!
//! `WagerSlot` holds the pending selection (amount, side) and drives
//! the explicit status cycle `Unselected → Selected → InFlight →
//! Settled → Unselected`. Tests assert on named states, not flag
//! combinations.

use tracing::debug;

use crate::types::{CoinSide, WagerStatus};

/// The pending wager for one session.
#[derive(Debug, Clone)]
pub struct WagerSlot {
    amount: Option<u64>,
    side: Option<CoinSide>,
    status: WagerStatus,
}

impl Default for WagerSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl WagerSlot {
    pub fn new() -> Self {
        WagerSlot {
            amount: None,
            side: None,
            status: WagerStatus::Unselected,
        }
    }

    pub fn amount(&self) -> Option<u64> {
        self.amount
    }

    pub fn side(&self) -> Option<CoinSide> {
        self.side
    }

    pub fn status(&self) -> WagerStatus {
        self.status
    }

    /// Set the pending amount. Zero clears the selection (the "0 =
    /// unselected" convention). The amount may exceed the balance —
    /// that is surfaced as non-submittable, not as an error. Ignored
    /// while a wager blocks submission.
    pub fn select_amount(&mut self, amount: u64) {
        if self.status.blocks_submission() {
            debug!(amount, status = %self.status, "Amount selection ignored");
            return;
        }
        self.amount = if amount == 0 { None } else { Some(amount) };
        self.refresh_selection();
    }

    /// Set the pending side. Ignored while a wager blocks submission.
    pub fn select_side(&mut self, side: CoinSide) {
        if self.status.blocks_submission() {
            debug!(%side, status = %self.status, "Side selection ignored");
            return;
        }
        self.side = Some(side);
        self.refresh_selection();
    }

    fn refresh_selection(&mut self) {
        self.status = if self.amount.is_some() && self.side.is_some() {
            WagerStatus::Selected
        } else {
            WagerStatus::Unselected
        };
    }

    /// The submit predicate: amount chosen, side chosen, amount within
    /// balance, and nothing currently blocking submission.
    pub fn can_submit(&self, balance: u64) -> bool {
        match (self.status, self.amount) {
            (WagerStatus::Selected, Some(amount)) => amount <= balance,
            _ => false,
        }
    }

    /// Transition `Selected → InFlight` if the predicate holds,
    /// returning the armed stake and side. `None` leaves every field
    /// untouched — the silent no-op the callers rely on.
    pub fn begin_flight(&mut self, balance: u64) -> Option<(u64, CoinSide)> {
        if !self.can_submit(balance) {
            return None;
        }
        // can_submit guarantees both selections are present
        let (amount, side) = (self.amount?, self.side?);
        self.status = WagerStatus::InFlight;
        Some((amount, side))
    }

    /// Transition `InFlight → Settled`. Submission stays blocked until
    /// `reset`.
    pub fn mark_settled(&mut self) {
        if self.status == WagerStatus::InFlight {
            self.status = WagerStatus::Settled;
        }
    }

    /// Clear the selection and reopen submission — the sole mechanism
    /// that re-enables new wagers.
    pub fn reset(&mut self) {
        self.amount = None;
        self.side = None;
        self.status = WagerStatus::Unselected;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
