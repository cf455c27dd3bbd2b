//! Outcome Resolver.
//!
//! Produces a single uniform random binary outcome per call. The
//! `FlipSource` trait is the seam: production uses the thread RNG,
//! tests inject seeded or fixed sources. There is deliberately no
//! cryptographic fairness guarantee — a plain uniform choice, as the
//! game advertises.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use crate::types::CoinSide;

/// Abstraction over the coin-flip random source.
///
/// Each call is an independent 50/50 draw; implementors hold no
/// outcome-relevant persisted state.
pub trait FlipSource: Send + Sync {
    fn flip(&self) -> CoinSide;
}

fn side_from_bool(heads: bool) -> CoinSide {
    if heads {
        CoinSide::Heads
    } else {
        CoinSide::Tails
    }
}

/// Production source backed by the thread-local RNG.
pub struct ThreadRngFlip;

impl FlipSource for ThreadRngFlip {
    fn flip(&self) -> CoinSide {
        side_from_bool(rand::thread_rng().gen_bool(0.5))
    }
}

/// Deterministic source for reproducible sequences.
pub struct SeededFlip {
    rng: Mutex<StdRng>,
}

impl SeededFlip {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl FlipSource for SeededFlip {
    fn flip(&self) -> CoinSide {
        side_from_bool(self.rng.lock().unwrap().gen_bool(0.5))
    }
}

/// Always lands on the given side. Scenario-test support.
pub struct FixedFlip {
    side: CoinSide,
}

impl FixedFlip {
    pub fn new(side: CoinSide) -> Self {
        Self { side }
    }
}

impl FlipSource for FixedFlip {
    fn flip(&self) -> CoinSide {
        self.side
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
