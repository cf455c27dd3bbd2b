//! Core game — wager lifecycle, outcome resolution, and per-user
//! session state.

pub mod flip;
pub mod wager;
pub mod session;
