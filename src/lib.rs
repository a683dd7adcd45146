//! # Bracket Engine
//!
//! A single-elimination tournament progression engine with versioned
//! optimistic concurrency and exactly-once prize payout.
//!
//! This library keeps a tournament's bracket consistent while match
//! results arrive as at-least-once, unordered events. The bracket is a
//! round-major slot sequence owned by one tournament document; every
//! mutation is a compare-and-set against that document's version, so
//! duplicate and concurrent deliveries converge instead of corrupting
//! the bracket.
//!
//! ## Lifecycle
//!
//! - **Seed**: pair the entrant list into round-1 matches, giving the
//!   odd tail player a bye
//! - **Advance**: on each decided match, pair the winner with the
//!   sibling slot's winner, or park them in a placeholder until the
//!   sibling resolves
//! - **Complete**: the final match's winner becomes the champion
//! - **Pay out**: credit the prize distribution to the winners exactly
//!   once, with ledger records written in the same atomic unit
//!
//! ## Core Modules
//!
//! - [`bracket`]: tournament and match documents, round geometry, and
//!   the pure pairing resolver
//! - [`progression`]: the event-driven engine and idempotent match
//!   factory
//! - [`prize`]: prize distributions and the exactly-once distributor
//! - [`store`]: the persistence seam, with in-memory and PostgreSQL
//!   implementations
//!
//! ## Example
//!
//! ```no_run
//! use bracket_engine::{BracketStore, MemoryStore, ProgressionEngine, Tournament};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let players: Vec<Uuid> = (0..8).map(|_| Uuid::new_v4()).collect();
//!
//! let tournament = Tournament::new("Friday Cup", 100, players);
//! store.insert_tournament(&tournament).await?;
//!
//! let engine = ProgressionEngine::new(store);
//! let round_one = engine.initialize_bracket(tournament.id).await?;
//! assert_eq!(round_one.len(), 4);
//! # Ok(())
//! # }
//! ```

/// Tournament and match documents, bracket geometry, pairing.
pub mod bracket;
pub use bracket::{
    Match, MatchId, MatchStatus, PlayerId, RoundLayout, Slot, Tournament, TournamentId,
    TournamentStatus,
};

/// Prize distributions and the exactly-once distributor.
pub mod prize;
pub use prize::{PrizeDistribution, PrizeDistributor, PrizeError, Transaction};

/// Event-driven bracket progression.
pub mod progression;
pub use progression::{MatchDecided, ProgressionEngine, ProgressionError, ProgressionOutcome};

/// Persistence seam and its implementations.
pub mod store;
pub use store::{BracketStore, MemoryStore, PgStore, StoreError, WalletStore};
