//! Progression error types.

use crate::bracket::{LayoutError, MatchId, PairingError, TournamentId};
use crate::store::StoreError;
use thiserror::Error;

/// Progression errors
///
/// Everything except `ConflictRetriesExhausted` is a consistency
/// violation: fatal for the triggering event, surfaced to the caller,
/// never silently retried.
#[derive(Debug, Error)]
pub enum ProgressionError {
    /// Tournament does not exist
    #[error("tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    /// Match document does not exist
    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    /// Event delivered for a match without a decided winner
    #[error("match {0} is not decided")]
    MatchNotDecided(MatchId),

    /// Bracket lookup failure
    #[error(transparent)]
    Pairing(#[from] PairingError),

    /// Invalid bracket geometry
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Optimistic retries exhausted under sustained contention
    #[error("gave up advancing tournament {tournament_id} after {attempts} version conflicts")]
    ConflictRetriesExhausted {
        tournament_id: TournamentId,
        attempts: u32,
    },

    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for progression operations
pub type ProgressionResult<T> = Result<T, ProgressionError>;
