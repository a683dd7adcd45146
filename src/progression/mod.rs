//! Event-driven bracket progression.
//!
//! This module implements:
//! - The idempotent match factory that plans slot mutations on a
//!   tournament document
//! - The progression engine, which seeds round 1, advances winners on
//!   match-decided events, and completes the tournament after the
//!   final
//!
//! All writes go through a versioned compare-and-set with bounded
//! retries, so duplicate, unordered, and concurrent event deliveries
//! converge on the same bracket.

pub mod engine;
pub mod errors;
pub mod factory;

pub use engine::{MatchDecided, ProgressionEngine, ProgressionOutcome};
pub use errors::{ProgressionError, ProgressionResult};
pub use factory::EnsureOutcome;
