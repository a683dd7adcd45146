//! Bracket model for single-elimination tournaments.
//!
//! This module provides:
//! - Persisted documents (`Tournament`, `Match`) and the tagged `Slot`
//!   variant that makes illegal bracket states unrepresentable
//! - Explicit round geometry (`RoundLayout`) derived from the player
//!   count, so sibling pairing stays correct for non-power-of-two
//!   rounds
//! - The pure pairing resolver used by the progression engine

pub mod layout;
pub mod models;
pub mod pairing;

pub use layout::{LayoutError, RoundLayout};
pub use models::{
    Match, MatchId, MatchStatus, PlayerId, PlayerSummary, Slot, Tournament, TournamentId,
    TournamentStatus,
};
pub use pairing::{Advancement, PairingError, PairingResult};
