//! Per-user game session — the Wager Manager.
//!
//! Ties the wager state machine to the ledger and the flip history,
//! and produces the presentation view. Settlement itself is the pure
//! `Settlement::resolve`; this module only applies its result to the
//! ledger. No timers live here — the presentation adapter schedules
//! resolution and reset around these synchronous operations.

use serde::Serialize;
use tracing::{debug, info};

use crate::ledger::Ledger;
use crate::game::wager::WagerSlot;
use crate::types::{CoinSide, FlipHistory, FlipRecord, GameError, Settlement, WagerStatus};

/// Result of a submission attempt. An invalid submission is a silent
/// no-op, not an error — the caller is expected to have disabled the
/// affordance via the submit predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The wager went in-flight and the stake was debited.
    Accepted { stake: u64, side: CoinSide },
    /// Preconditions unmet; zero state change.
    Rejected,
}

/// All state for one signed-in user.
pub struct Session {
    user_id: String,
    ledger: Ledger,
    wager: WagerSlot,
    history: FlipHistory,
    last_flip: Option<CoinSide>,
    last_settlement: Option<Settlement>,
    notice: Option<String>,
}

impl Session {
    pub fn new(user_id: &str, ledger: Ledger, history_limit: usize) -> Self {
        Session {
            user_id: user_id.to_string(),
            ledger,
            wager: WagerSlot::new(),
            history: FlipHistory::new(history_limit),
            last_flip: None,
            last_settlement: None,
            notice: None,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn balance(&self) -> u64 {
        self.ledger.balance()
    }

    pub fn status(&self) -> WagerStatus {
        self.wager.status()
    }

    pub fn history(&self) -> &FlipHistory {
        &self.history
    }

    pub fn select_amount(&mut self, amount: u64) {
        self.wager.select_amount(amount);
    }

    pub fn select_side(&mut self, side: CoinSide) {
        self.wager.select_side(side);
    }

    /// Submit the pending wager.
    ///
    /// On success the wager goes in-flight and the stake is debited
    /// immediately — a pessimistic reservation: a crash mid-flight
    /// leaves the player down the stake, never up. The ledger error
    /// branch is unreachable while the submit predicate holds.
    pub fn submit(&mut self) -> Result<SubmitOutcome, GameError> {
        let Some((stake, side)) = self.wager.begin_flight(self.ledger.balance()) else {
            debug!(user_id = %self.user_id, "Submission rejected");
            return Ok(SubmitOutcome::Rejected);
        };

        self.ledger.debit(stake)?;
        self.last_flip = None;
        self.notice = None;

        info!(
            user_id = %self.user_id,
            stake,
            %side,
            balance = self.ledger.balance(),
            "Wager in flight — stake reserved"
        );
        Ok(SubmitOutcome::Accepted { stake, side })
    }

    /// Settle the in-flight wager against the resolved flip.
    ///
    /// At most once per wager: a no-op (`None`) unless a wager is in
    /// flight. A win credits `2 × stake`; a loss credits nothing (the
    /// stake was forfeited at debit time). The outcome lands in the
    /// history and the user-facing notice.
    pub fn settle(&mut self, flipped: CoinSide) -> Option<Settlement> {
        if self.wager.status() != WagerStatus::InFlight {
            return None;
        }
        let (stake, chosen) = match (self.wager.amount(), self.wager.side()) {
            (Some(stake), Some(chosen)) => (stake, chosen),
            _ => return None,
        };

        let settlement = Settlement::resolve(stake, chosen, flipped);
        if settlement.outcome.is_win() {
            self.ledger.credit(settlement.payout);
        }

        self.history.record(FlipRecord::from_settlement(&settlement));
        self.last_flip = Some(flipped);
        self.notice = Some(notice_for(&settlement));
        self.wager.mark_settled();

        info!(
            user_id = %self.user_id,
            stake,
            %chosen,
            %flipped,
            outcome = %settlement.outcome,
            balance = self.ledger.balance(),
            "Wager settled"
        );

        self.last_settlement = Some(settlement.clone());
        Some(settlement)
    }

    /// Clear the selection and reopen submission. Runs after the
    /// settled result has been displayed.
    pub fn reset(&mut self) {
        self.wager.reset();
        self.notice = None;
        debug!(user_id = %self.user_id, "Wager selection reset");
    }

    /// Override the balance from a promotional redemption.
    pub fn apply_grant(&mut self, balance: u64) {
        self.ledger.grant(balance);
        self.notice = Some(format!("🎁 Coupon redeemed — balance set to ${balance}!"));
    }

    /// Snapshot for the presentation collaborator.
    pub fn view(&self, leaderboard_threshold: u64) -> SessionView {
        let balance = self.ledger.balance();
        SessionView {
            balance,
            pending_amount: self.wager.amount(),
            pending_side: self.wager.side(),
            status: self.wager.status(),
            in_flight: self.wager.status().blocks_submission(),
            can_submit: self.wager.can_submit(balance),
            last_flip: self.last_flip,
            last_settlement: self.last_settlement.clone(),
            history: self.history.snapshot(),
            notice: self.notice.clone(),
            leaderboard: leaderboard_notice(balance, leaderboard_threshold),
            prompt: self.prompt(),
        }
    }

    /// The submit-affordance text, mirroring what the betting panel
    /// renders for each predicate failure.
    fn prompt(&self) -> String {
        if self.wager.status().blocks_submission() {
            return "Flipping...".to_string();
        }
        match (self.wager.amount(), self.wager.side()) {
            (None, _) => "Select Amount".to_string(),
            (Some(_), None) => "Choose Heads or Tails".to_string(),
            (Some(amount), Some(_)) if amount > self.ledger.balance() => {
                "Insufficient Balance".to_string()
            }
            (Some(amount), Some(_)) => format!("Bet ${amount} - Win ${}", amount * 2),
        }
    }
}

fn notice_for(settlement: &Settlement) -> String {
    if settlement.outcome.is_win() {
        format!(
            "🎉 YOU WON! You won ${}! The coin landed on {}.",
            settlement.stake, settlement.flipped,
        )
    } else {
        format!(
            "😢 You Lost. Better luck next time! The coin landed on {}.",
            settlement.flipped,
        )
    }
}

fn leaderboard_notice(balance: u64, threshold: u64) -> Option<String> {
    (threshold > 0 && balance >= threshold)
        .then(|| format!("🏆 High roller! ${balance} puts you on the leaderboard."))
}

// ---------------------------------------------------------------------------
// Presentation view
// ---------------------------------------------------------------------------

/// The state tuple handed to the presentation collaborator on every
/// change.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub balance: u64,
    pub pending_amount: Option<u64>,
    pub pending_side: Option<CoinSide>,
    pub status: WagerStatus,
    /// True while submission is blocked (flip through display window).
    pub in_flight: bool,
    pub can_submit: bool,
    pub last_flip: Option<CoinSide>,
    pub last_settlement: Option<Settlement>,
    pub history: Vec<FlipRecord>,
    pub notice: Option<String>,
    pub leaderboard: Option<String>,
    pub prompt: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
