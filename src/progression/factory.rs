//! Match factory: idempotent slot mutations on a tournament document.
//!
//! These functions plan the next-round state on an in-memory document;
//! the progression engine persists the result through one versioned
//! compare-and-set, which is what makes the check-then-write here
//! atomic under concurrent sibling completions. A slot that is already
//! filled is the expected outcome under duplicate delivery, so every
//! function reports it as a successful no-op rather than an error.

use crate::bracket::{Match, MatchId, PlayerId, PlayerSummary, Slot, Tournament};
use std::collections::HashMap;

/// Result of an idempotent slot mutation
#[derive(Debug, Clone, PartialEq)]
pub enum EnsureOutcome {
    /// A new match document was created and its slot written
    Created(Match),
    /// The winner was recorded as waiting for an opponent
    PlaceholderWritten,
    /// The player was advanced without an opponent
    ByeWritten,
    /// The slot already references a match; duplicate-safe no-op
    AlreadyFilled(MatchId),
    /// Nothing to do; the slot already carries the requested state
    Unchanged,
}

/// Create the next-round match once both participants are known
///
/// No-op when the target slot already holds a match. An existing
/// placeholder is upgraded into the full match.
pub fn ensure_match(
    tournament: &mut Tournament,
    slot_index: usize,
    round: u32,
    winner: PlayerId,
    opponent: PlayerId,
    profiles: HashMap<PlayerId, PlayerSummary>,
) -> EnsureOutcome {
    tournament.grow_to(slot_index);
    match &tournament.bracket[slot_index] {
        Slot::Ready { match_id, .. } => EnsureOutcome::AlreadyFilled(*match_id),
        Slot::Bye { player } => {
            log::warn!(
                "slot {slot_index} of tournament {} holds a bye for {player}, refusing to pair {winner} vs {opponent} there",
                tournament.id,
            );
            EnsureOutcome::Unchanged
        }
        Slot::Empty | Slot::Placeholder { .. } => {
            let m = Match::new(
                tournament.id,
                round,
                vec![winner, opponent],
                profiles,
                tournament.entry_fee,
            );
            tournament.bracket[slot_index] = Slot::Ready {
                match_id: m.id,
                players: [winner, opponent],
            };
            EnsureOutcome::Created(m)
        }
    }
}

/// Record a winner waiting for the sibling match to resolve
///
/// Writes only into a vacant slot: a placeholder must never clobber a
/// match created through another path, and an existing placeholder is
/// left for the sibling's own completion to upgrade.
pub fn ensure_placeholder(
    tournament: &mut Tournament,
    slot_index: usize,
    winner: PlayerId,
) -> EnsureOutcome {
    tournament.grow_to(slot_index);
    match &tournament.bracket[slot_index] {
        Slot::Empty => {
            tournament.bracket[slot_index] = Slot::Placeholder { player: winner };
            EnsureOutcome::PlaceholderWritten
        }
        Slot::Ready { match_id, .. } => EnsureOutcome::AlreadyFilled(*match_id),
        Slot::Placeholder { .. } | Slot::Bye { .. } => EnsureOutcome::Unchanged,
    }
}

/// Advance a player without an opponent into the next round
pub fn ensure_bye(
    tournament: &mut Tournament,
    slot_index: usize,
    player: PlayerId,
) -> EnsureOutcome {
    tournament.grow_to(slot_index);
    match &tournament.bracket[slot_index] {
        Slot::Empty => {
            tournament.bracket[slot_index] = Slot::Bye { player };
            EnsureOutcome::ByeWritten
        }
        Slot::Bye { player: existing } if *existing == player => EnsureOutcome::Unchanged,
        Slot::Ready { match_id, .. } => EnsureOutcome::AlreadyFilled(*match_id),
        other => {
            log::warn!(
                "slot {slot_index} of tournament {} is {other:?}, refusing to write a bye for {player}",
                tournament.id,
            );
            EnsureOutcome::Unchanged
        }
    }
}
