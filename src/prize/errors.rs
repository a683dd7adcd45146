//! Prize distribution error types.

use crate::bracket::TournamentId;
use crate::store::StoreError;
use thiserror::Error;

/// Prize distribution errors
#[derive(Debug, Error)]
pub enum PrizeError {
    /// Tournament does not exist
    #[error("tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    /// Prizes were already paid out; a hard stop, never retried
    #[error("prizes already distributed for tournament {0}")]
    AlreadyDistributed(TournamentId),

    /// Distribution requested before the final match was decided
    #[error("tournament {0} is not completed")]
    TournamentNotCompleted(TournamentId),

    /// Ranks are 1-indexed
    #[error("invalid prize rank: {0}")]
    InvalidRank(u32),

    /// Prize amounts must be positive
    #[error("invalid prize amount {amount} for rank {rank}")]
    InvalidAmount { rank: u32, amount: i64 },

    /// A distribution must name at least one rank
    #[error("prize distribution is empty")]
    EmptyDistribution,

    /// Optimistic retries exhausted under sustained contention
    #[error("gave up distributing prizes for tournament {tournament_id} after {attempts} version conflicts")]
    ConflictRetriesExhausted {
        tournament_id: TournamentId,
        attempts: u32,
    },

    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for prize operations
pub type PrizeResult<T> = Result<T, PrizeError>;
