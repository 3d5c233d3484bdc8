//! # Hearth Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixture data and pre-deployed games
//! - A scripted player for driving whole games
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
