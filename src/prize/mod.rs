//! Prize distribution with an immutable winnings ledger.
//!
//! This module implements:
//! - Rank-indexed prize distributions with validation and standard
//!   splits
//! - Exactly-once payout, gated by the tournament's
//!   `prize_distributed` flag inside the store's atomic unit
//! - Ledger transaction records written together with every balance
//!   credit

pub mod distributor;
pub mod errors;
pub mod models;

pub use distributor::PrizeDistributor;
pub use errors::{PrizeError, PrizeResult};
pub use models::{
    PrizeDistribution, Transaction, TransactionId, TransactionStatus, TransactionType,
};
