//! Deterministic random number generation
//!
//! Uses the xorshift64* algorithm for fast, reproducible draws.
//! Every random decision in the engine (arrival gaps, consultation lengths,
//! break acceptance, reneging) goes through a single `RngManager` per run.

mod xorshift;

pub use xorshift::RngManager;
