//! Bracket data models: tournaments, slots, and matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Tournament ID type
pub type TournamentId = Uuid;

/// Match ID type
pub type MatchId = Uuid;

/// Player ID type
pub type PlayerId = Uuid;

/// Tournament lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Announced, bracket not yet seeded
    Upcoming,
    /// Bracket seeded, matches in progress
    Live,
    /// Final match decided
    Completed,
    /// Cancelled before completion
    Cancelled,
    /// Temporarily halted by an operator
    Paused,
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentStatus::Upcoming => write!(f, "upcoming"),
            TournamentStatus::Live => write!(f, "live"),
            TournamentStatus::Completed => write!(f, "completed"),
            TournamentStatus::Cancelled => write!(f, "cancelled"),
            TournamentStatus::Paused => write!(f, "paused"),
        }
    }
}

/// Match lifecycle state
///
/// Only `Completed` with a set `winner_id` triggers bracket progression.
/// `Disputed` and `Cancelled` are terminal until manual resolution
/// re-marks the match completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Waiting,
    InProgress,
    Completed,
    Disputed,
    Cancelled,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::Waiting => write!(f, "waiting"),
            MatchStatus::InProgress => write!(f, "in_progress"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::Disputed => write!(f, "disputed"),
            MatchStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Denormalized player profile carried on match documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub name: String,
    pub avatar: Option<String>,
}

impl PlayerSummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            avatar: None,
        }
    }

    /// Fallback summary when the profile document is missing
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".to_string(),
            avatar: None,
        }
    }
}

/// One bracket position, round-major within `Tournament::bracket`
///
/// The tagged representation makes illegal slot states unrepresentable:
/// a slot is vacant, holds a single player waiting on an opponent,
/// holds a player advancing without an opponent, or references a real
/// match with both participants known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Slot {
    /// Not yet fed by any earlier round
    Empty,
    /// One participant known, opponent still undecided
    Placeholder { player: PlayerId },
    /// Odd seed advancing without an opponent
    Bye { player: PlayerId },
    /// Both participants known, match document created
    Ready {
        match_id: MatchId,
        players: [PlayerId; 2],
    },
}

impl Slot {
    /// Match referenced by this slot, if one has been created
    pub fn match_id(&self) -> Option<MatchId> {
        match self {
            Slot::Ready { match_id, .. } => Some(*match_id),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye { .. })
    }
}

/// A single-elimination match document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// 1-indexed round within the bracket
    pub round: u32,
    /// Denormalized profiles for display, keyed by player id
    pub players: HashMap<PlayerId, PlayerSummary>,
    pub player_ids: Vec<PlayerId>,
    pub status: MatchStatus,
    pub winner_id: Option<PlayerId>,
    pub bet_amount: i64,
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Create a pending match between two known participants
    pub fn new(
        tournament_id: TournamentId,
        round: u32,
        player_ids: Vec<PlayerId>,
        players: HashMap<PlayerId, PlayerSummary>,
        bet_amount: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            round,
            players,
            player_ids,
            status: MatchStatus::Pending,
            winner_id: None,
            bet_amount,
            created_at: Utc::now(),
        }
    }

    /// Whether the match has reached a decided state
    pub fn is_decided(&self) -> bool {
        self.status == MatchStatus::Completed && self.winner_id.is_some()
    }
}

/// A tournament document, exclusive owner of its bracket sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub entry_fee: i64,
    pub total_slots: u32,
    pub prize_pool: i64,
    pub status: TournamentStatus,
    /// Seed order; fixes the bracket geometry
    pub player_ids: Vec<PlayerId>,
    /// Round-major slots, grown lazily as rounds are discovered
    pub bracket: Vec<Slot>,
    pub prize_distributed: bool,
    /// Rank-indexed: winners[0] is the champion
    pub winners: Vec<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Create an upcoming tournament from its seeded player list
    pub fn new(name: impl Into<String>, entry_fee: i64, player_ids: Vec<PlayerId>) -> Self {
        let total_slots = player_ids.len() as u32;
        let prize_pool = entry_fee * player_ids.len() as i64;
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            entry_fee,
            total_slots,
            prize_pool,
            status: TournamentStatus::Upcoming,
            player_ids,
            bracket: Vec::new(),
            prize_distributed: false,
            winners: Vec::new(),
            created_at: Utc::now(),
            start_time: None,
            end_time: None,
        }
    }

    /// Slot at `index`, treating unallocated positions as `Empty`
    pub fn slot(&self, index: usize) -> &Slot {
        self.bracket.get(index).unwrap_or(&Slot::Empty)
    }

    /// Grow the bracket with `Empty` slots so `index` is addressable
    pub fn grow_to(&mut self, index: usize) {
        if self.bracket.len() <= index {
            self.bracket.resize(index + 1, Slot::Empty);
        }
    }

    /// Flat index of the slot referencing `match_id`, if present
    pub fn position_of(&self, match_id: MatchId) -> Option<usize> {
        self.bracket
            .iter()
            .position(|slot| slot.match_id() == Some(match_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_serializes_with_state_tag() {
        let player = Uuid::new_v4();
        let value = serde_json::to_value(Slot::Bye { player }).unwrap();
        assert_eq!(value["state"], "bye");
        assert_eq!(value["player"], player.to_string());

        let value = serde_json::to_value(Slot::Empty).unwrap();
        assert_eq!(value["state"], "empty");
    }

    #[test]
    fn slot_roundtrips_through_json() {
        let slot = Slot::Ready {
            match_id: Uuid::new_v4(),
            players: [Uuid::new_v4(), Uuid::new_v4()],
        };
        let json = serde_json::to_string(&slot).unwrap();
        let back: Slot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, slot);
    }

    #[test]
    fn new_tournament_derives_pool_from_entry_fee() {
        let players: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let t = Tournament::new("Test Cup", 250, players);
        assert_eq!(t.prize_pool, 1000);
        assert_eq!(t.total_slots, 4);
        assert_eq!(t.status, TournamentStatus::Upcoming);
        assert!(t.bracket.is_empty());
        assert!(!t.prize_distributed);
    }

    #[test]
    fn slot_lookup_beyond_bracket_is_empty() {
        let t = Tournament::new("Test", 0, vec![Uuid::new_v4(), Uuid::new_v4()]);
        assert!(t.slot(10).is_empty());
    }

    #[test]
    fn grow_to_pads_with_empty_slots() {
        let mut t = Tournament::new("Test", 0, vec![Uuid::new_v4(), Uuid::new_v4()]);
        t.grow_to(2);
        assert_eq!(t.bracket.len(), 3);
        assert!(t.bracket.iter().all(Slot::is_empty));
    }

    #[test]
    fn position_of_finds_ready_slot() {
        let mut t = Tournament::new("Test", 0, vec![Uuid::new_v4(), Uuid::new_v4()]);
        let match_id = Uuid::new_v4();
        t.bracket.push(Slot::Ready {
            match_id,
            players: [t.player_ids[0], t.player_ids[1]],
        });
        assert_eq!(t.position_of(match_id), Some(0));
        assert_eq!(t.position_of(Uuid::new_v4()), None);
    }

    #[test]
    fn match_decided_requires_completed_status_and_winner() {
        let winner = Uuid::new_v4();
        let mut m = Match::new(Uuid::new_v4(), 1, vec![winner], HashMap::new(), 100);
        assert!(!m.is_decided());
        m.winner_id = Some(winner);
        assert!(!m.is_decided());
        m.status = MatchStatus::Completed;
        assert!(m.is_decided());
    }

    #[test]
    fn status_display_matches_storage_form() {
        assert_eq!(TournamentStatus::Live.to_string(), "live");
        assert_eq!(MatchStatus::InProgress.to_string(), "in_progress");
    }
}
