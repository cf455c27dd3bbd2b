//! Shared types for the GOLDFLIP service.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that the ledger, game, and
//! server modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

// ---------------------------------------------------------------------------
// Coin side
// ---------------------------------------------------------------------------

/// One face of the coin — also the side a wager is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    /// The opposite face.
    pub fn opposite(&self) -> Self {
        match self {
            CoinSide::Heads => CoinSide::Tails,
            CoinSide::Tails => CoinSide::Heads,
        }
    }
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => write!(f, "heads"),
            CoinSide::Tails => write!(f, "tails"),
        }
    }
}

impl std::str::FromStr for CoinSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "heads" | "head" => Ok(CoinSide::Heads),
            "tails" | "tail" => Ok(CoinSide::Tails),
            _ => Err(anyhow::anyhow!("Unknown coin side: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Wager status
// ---------------------------------------------------------------------------

/// Lifecycle state of the pending wager.
///
/// Transitions form a cycle with no skipped states:
/// `Unselected → Selected → InFlight → Settled → Unselected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WagerStatus {
    Unselected,
    Selected,
    InFlight,
    Settled,
}

impl WagerStatus {
    /// Whether this state blocks a new submission. `InFlight` and
    /// `Settled` both block — the window only reopens on reset.
    pub fn blocks_submission(&self) -> bool {
        matches!(self, WagerStatus::InFlight | WagerStatus::Settled)
    }
}

impl fmt::Display for WagerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WagerStatus::Unselected => write!(f, "unselected"),
            WagerStatus::Selected => write!(f, "selected"),
            WagerStatus::InFlight => write!(f, "in-flight"),
            WagerStatus::Settled => write!(f, "settled"),
        }
    }
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// Win or loss of a settled wager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn is_win(&self) -> bool {
        matches!(self, Outcome::Win)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Win => write!(f, "win"),
            Outcome::Loss => write!(f, "loss"),
        }
    }
}

/// The result of resolving one wager against one flip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    /// Stake that was debited at submission.
    pub stake: u64,
    /// Side the player chose.
    pub chosen: CoinSide,
    /// Side the coin landed on.
    pub flipped: CoinSide,
    pub outcome: Outcome,
    /// Amount credited back: `2 × stake` on a win, `0` on a loss.
    pub payout: u64,
    pub at: DateTime<Utc>,
}

impl Settlement {
    /// Resolve a wager. Pure with respect to balance and timers: the
    /// win condition is `flipped == chosen` and nothing else.
    pub fn resolve(stake: u64, chosen: CoinSide, flipped: CoinSide) -> Self {
        let outcome = if flipped == chosen {
            Outcome::Win
        } else {
            Outcome::Loss
        };
        let payout = match outcome {
            Outcome::Win => stake * 2,
            Outcome::Loss => 0,
        };
        Settlement {
            stake,
            chosen,
            flipped,
            outcome,
            payout,
            at: Utc::now(),
        }
    }

    /// Net change relative to the balance *before* the stake was
    /// debited: `+stake` on a win, `-stake` on a loss.
    pub fn net_delta(&self) -> i64 {
        match self.outcome {
            Outcome::Win => self.stake as i64,
            Outcome::Loss => -(self.stake as i64),
        }
    }
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ${} on {} (landed {}, payout ${})",
            self.outcome, self.stake, self.chosen, self.flipped, self.payout,
        )
    }
}

// ---------------------------------------------------------------------------
// Flip history
// ---------------------------------------------------------------------------

/// One completed flip, as shown in the results strip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlipRecord {
    pub flipped: CoinSide,
    pub chosen: CoinSide,
    pub stake: u64,
    pub outcome: Outcome,
    pub at: DateTime<Utc>,
}

impl FlipRecord {
    pub fn from_settlement(s: &Settlement) -> Self {
        FlipRecord {
            flipped: s.flipped,
            chosen: s.chosen,
            stake: s.stake,
            outcome: s.outcome,
            at: s.at,
        }
    }
}

/// Bounded, most-recent-first log of past flips.
///
/// Appended exactly once per completed flip; the oldest entry is
/// evicted once the bound is reached.
#[derive(Debug, Clone)]
pub struct FlipHistory {
    entries: VecDeque<FlipRecord>,
    limit: usize,
}

impl FlipHistory {
    pub fn new(limit: usize) -> Self {
        FlipHistory {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Record a flip at the front. Evicts beyond the bound.
    pub fn record(&mut self, record: FlipRecord) {
        self.entries.push_front(record);
        self.entries.truncate(self.limit);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent flip, if any.
    pub fn latest(&self) -> Option<&FlipRecord> {
        self.entries.front()
    }

    /// Snapshot in most-recent-first order, for the presentation view.
    pub fn snapshot(&self) -> Vec<FlipRecord> {
        self.entries.iter().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for GOLDFLIP.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Insufficient balance: need ${needed}, have ${available}")]
    InsufficientBalance { needed: u64, available: u64 },

    #[error("Sign in required")]
    Unauthenticated,

    #[error("Invalid coupon")]
    InvalidCoupon,

    #[error("Invalid coupon")]
    CouponAlreadyRedeemed,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
