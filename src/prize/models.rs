//! Prize distribution and transaction ledger models.

use super::errors::PrizeError;
use crate::bracket::{PlayerId, TournamentId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Transaction ID type
pub type TransactionId = Uuid;

/// Ledger transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Winnings,
    EntryFee,
    Refund,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Winnings => write!(f, "winnings"),
            TransactionType::EntryFee => write!(f, "entry_fee"),
            TransactionType::Refund => write!(f, "refund"),
        }
    }
}

/// Ledger transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Immutable ledger record, appended in the same atomic unit as the
/// balance change it describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub player_id: PlayerId,
    pub tournament_id: TournamentId,
    pub amount: i64,
    pub txn_type: TransactionType,
    pub status: TransactionStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Completed winnings credit for a ranked finisher
    pub fn winnings(
        player_id: PlayerId,
        tournament_id: TournamentId,
        amount: i64,
        rank: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            player_id,
            tournament_id,
            amount,
            txn_type: TransactionType::Winnings,
            status: TransactionStatus::Completed,
            description: Some(format!("Tournament winnings, rank {rank}")),
            created_at: Utc::now(),
        }
    }
}

/// Prize money per rank (1-indexed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeDistribution {
    payouts: BTreeMap<u32, i64>,
}

impl PrizeDistribution {
    /// Validate a rank → amount mapping
    ///
    /// Ranks start at 1 and every amount must be positive.
    pub fn new(payouts: BTreeMap<u32, i64>) -> Result<Self, PrizeError> {
        if payouts.is_empty() {
            return Err(PrizeError::EmptyDistribution);
        }
        for (&rank, &amount) in &payouts {
            if rank == 0 {
                return Err(PrizeError::InvalidRank(rank));
            }
            if amount <= 0 {
                return Err(PrizeError::InvalidAmount { rank, amount });
            }
        }
        Ok(Self { payouts })
    }

    /// The whole pool to rank 1
    pub fn winner_takes_all(pool: i64) -> Result<Self, PrizeError> {
        Self::new(BTreeMap::from([(1, pool)]))
    }

    /// Standard 50/30/20 split over the top three ranks
    ///
    /// Integer division remainders stay with rank 1.
    pub fn standard_split(pool: i64) -> Result<Self, PrizeError> {
        let second = pool * 30 / 100;
        let third = pool * 20 / 100;
        let first = pool - second - third;
        Self::new(BTreeMap::from([(1, first), (2, second), (3, third)]))
    }

    /// Iterate (rank, amount) pairs in rank order
    pub fn amounts(&self) -> impl Iterator<Item = (u32, i64)> + '_ {
        self.payouts.iter().map(|(&rank, &amount)| (rank, amount))
    }

    /// Sum of all payouts
    pub fn total(&self) -> i64 {
        self.payouts.values().sum()
    }
}
