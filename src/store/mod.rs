//! Persistence seam for tournament, match, and wallet documents.
//!
//! The engine never mutates shared state directly: every slot
//! check-then-write goes through a versioned compare-and-set on the
//! owning tournament document, and prize credits ride in the same
//! atomic unit that flips the distribution flag. Implementations must
//! make each trait method atomic; `VersionConflict` is the transient
//! signal callers retry with fresh reads.
//!
//! Two implementations are provided: [`MemoryStore`] for tests and
//! embedders, and [`PgStore`] over PostgreSQL.

use crate::bracket::{Match, MatchId, PlayerId, PlayerSummary, Tournament, TournamentId};
use crate::prize::Transaction;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

pub mod config;
pub mod memory;
pub mod postgres;

pub use config::DatabaseConfig;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Document version for optimistic concurrency
pub type Version = i64;

/// A document together with the version it was read at
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub doc: T,
    pub version: Version,
}

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Document (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Optimistic write lost to a concurrent update; retry with a
    /// fresh read
    #[error("version conflict on tournament {0}")]
    VersionConflict(TournamentId),

    /// Compare-and-set target does not exist
    #[error("tournament {0} not found")]
    NotFound(TournamentId),

    /// Insert target already exists
    #[error("tournament {0} already exists")]
    AlreadyExists(TournamentId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository for tournament and match documents
#[async_trait]
pub trait BracketStore: Send + Sync {
    /// Fetch a tournament with its current version
    async fn fetch_tournament(
        &self,
        id: TournamentId,
    ) -> StoreResult<Option<Versioned<Tournament>>>;

    /// Insert a new tournament at version 1
    async fn insert_tournament(&self, tournament: &Tournament) -> StoreResult<Version>;

    /// Compare-and-set the tournament document and insert any
    /// newly created matches in the same atomic unit
    ///
    /// Fails with `VersionConflict` when the stored version no longer
    /// equals `expected_version`.
    async fn update_tournament_with_matches(
        &self,
        tournament: &Tournament,
        expected_version: Version,
        new_matches: &[Match],
    ) -> StoreResult<Version>;

    /// Fetch a match document
    async fn fetch_match(&self, id: MatchId) -> StoreResult<Option<Match>>;

    /// Fetch the profiles for the given players; missing profiles are
    /// simply absent from the map
    async fn fetch_players(
        &self,
        ids: &[PlayerId],
    ) -> StoreResult<HashMap<PlayerId, PlayerSummary>>;
}

/// Repository for balances and the winnings ledger
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Atomically compare-and-set the tournament document (with
    /// `prize_distributed` flipped by the caller), credit every
    /// player named in `credits`, and append the transaction records
    ///
    /// All-or-nothing: a `VersionConflict` leaves balances untouched.
    async fn apply_prize_distribution(
        &self,
        tournament: &Tournament,
        expected_version: Version,
        credits: &[Transaction],
    ) -> StoreResult<Version>;

    /// Current balance for a player, zero when no wallet exists yet
    async fn balance(&self, player_id: PlayerId) -> StoreResult<i64>;
}
