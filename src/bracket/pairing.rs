//! Pairing resolution for decided bracket slots.
//!
//! Pure functions only: the progression engine owns all document reads
//! and writes and calls in here to work out where a winner goes next.

use super::layout::{LayoutError, RoundLayout};
use super::models::{Match, MatchId, PlayerId, Slot, Tournament, TournamentId};
use thiserror::Error;

/// Pairing errors; all are consistency violations, not retryable
#[derive(Debug, Error)]
pub enum PairingError {
    #[error("tournament {0} has no bracket")]
    BracketMissing(TournamentId),

    #[error("match {match_id} not found in the bracket of tournament {tournament_id}")]
    SlotNotFound {
        tournament_id: TournamentId,
        match_id: MatchId,
    },

    #[error("slot index {0} is outside the bracket layout")]
    SlotOutOfRange(usize),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

pub type PairingResult<T> = Result<T, PairingError>;

/// Where a decided slot's winner advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advancement {
    /// The decided slot was the final: the tournament is complete
    Complete,
    Advance {
        /// Round (1-indexed) of the decided slot
        round: u32,
        /// Sibling slot in the same round; `None` for the unpaired
        /// tail slot of an odd-sized round
        sibling_index: Option<usize>,
        /// Destination slot in the next round
        next_slot_index: usize,
    },
}

/// Flat bracket index of the slot referencing `decided`
///
/// Fails when the bracket is empty or the match is absent from it;
/// both are consistency violations the caller must surface.
pub fn locate(tournament: &Tournament, decided: &Match) -> PairingResult<usize> {
    if tournament.bracket.is_empty() {
        return Err(PairingError::BracketMissing(tournament.id));
    }
    tournament
        .position_of(decided.id)
        .ok_or(PairingError::SlotNotFound {
            tournament_id: tournament.id,
            match_id: decided.id,
        })
}

/// Resolve the advancement of the winner sitting at `slot_index`
pub fn resolve_slot(layout: &RoundLayout, slot_index: usize) -> PairingResult<Advancement> {
    let round = layout
        .round_of(slot_index)
        .ok_or(PairingError::SlotOutOfRange(slot_index))?;
    match layout.destination(slot_index) {
        None => Ok(Advancement::Complete),
        Some(next_slot_index) => Ok(Advancement::Advance {
            round,
            sibling_index: layout.sibling(slot_index),
            next_slot_index,
        }),
    }
}

/// Implicit winner of a sibling slot, if it is already decided
///
/// A bye slot is decided the moment it exists, with its lone player as
/// the winner. A ready slot is decided once its match document carries
/// a winner; `sibling_match` is that fetched document (callers pass
/// `None` when the slot references no match or the fetch found
/// nothing, which reads as "opponent not yet known").
pub fn sibling_winner(sibling: &Slot, sibling_match: Option<&Match>) -> Option<PlayerId> {
    match sibling {
        Slot::Bye { player } => Some(*player),
        Slot::Ready { match_id, .. } => sibling_match
            .filter(|m| m.id == *match_id && m.is_decided())
            .and_then(|m| m.winner_id),
        Slot::Empty | Slot::Placeholder { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::models::MatchStatus;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn tournament_of(n: usize) -> Tournament {
        let players: Vec<Uuid> = (0..n).map(|_| Uuid::new_v4()).collect();
        Tournament::new("Pairing Test", 100, players)
    }

    fn ready_match(t: &Tournament, a: PlayerId, b: PlayerId, round: u32) -> Match {
        Match::new(t.id, round, vec![a, b], HashMap::new(), t.entry_fee)
    }

    #[test]
    fn locate_fails_on_empty_bracket() {
        let t = tournament_of(4);
        let m = ready_match(&t, t.player_ids[0], t.player_ids[1], 1);
        assert!(matches!(
            locate(&t, &m),
            Err(PairingError::BracketMissing(_))
        ));
    }

    #[test]
    fn locate_fails_on_foreign_match() {
        let mut t = tournament_of(4);
        let seeded = ready_match(&t, t.player_ids[0], t.player_ids[1], 1);
        t.bracket.push(Slot::Ready {
            match_id: seeded.id,
            players: [t.player_ids[0], t.player_ids[1]],
        });
        let foreign = ready_match(&t, t.player_ids[2], t.player_ids[3], 1);
        assert!(matches!(
            locate(&t, &foreign),
            Err(PairingError::SlotNotFound { .. })
        ));
        assert_eq!(locate(&t, &seeded).unwrap(), 0);
    }

    #[test]
    fn final_slot_resolves_to_complete() {
        let layout = RoundLayout::new(4).unwrap();
        assert_eq!(resolve_slot(&layout, 2).unwrap(), Advancement::Complete);
    }

    #[test]
    fn first_round_slot_advances_with_sibling() {
        let layout = RoundLayout::new(4).unwrap();
        assert_eq!(
            resolve_slot(&layout, 0).unwrap(),
            Advancement::Advance {
                round: 1,
                sibling_index: Some(1),
                next_slot_index: 2,
            }
        );
    }

    #[test]
    fn unpaired_tail_slot_has_no_sibling() {
        let layout = RoundLayout::new(6).unwrap();
        assert_eq!(
            resolve_slot(&layout, 2).unwrap(),
            Advancement::Advance {
                round: 1,
                sibling_index: None,
                next_slot_index: 4,
            }
        );
    }

    #[test]
    fn out_of_range_slot_is_an_error() {
        let layout = RoundLayout::new(4).unwrap();
        assert!(matches!(
            resolve_slot(&layout, 3),
            Err(PairingError::SlotOutOfRange(3))
        ));
    }

    #[test]
    fn bye_slot_is_immediately_decided() {
        let player = Uuid::new_v4();
        assert_eq!(sibling_winner(&Slot::Bye { player }, None), Some(player));
    }

    #[test]
    fn ready_slot_is_decided_only_with_a_winner() {
        let t = tournament_of(4);
        let mut m = ready_match(&t, t.player_ids[0], t.player_ids[1], 1);
        let slot = Slot::Ready {
            match_id: m.id,
            players: [t.player_ids[0], t.player_ids[1]],
        };

        assert_eq!(sibling_winner(&slot, Some(&m)), None);
        assert_eq!(sibling_winner(&slot, None), None);

        m.winner_id = Some(t.player_ids[0]);
        m.status = MatchStatus::Completed;
        assert_eq!(sibling_winner(&slot, Some(&m)), Some(t.player_ids[0]));
    }

    #[test]
    fn vacant_slots_yield_no_opponent() {
        let player = Uuid::new_v4();
        assert_eq!(sibling_winner(&Slot::Empty, None), None);
        assert_eq!(sibling_winner(&Slot::Placeholder { player }, None), None);
    }
}
