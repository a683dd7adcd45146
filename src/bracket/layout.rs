//! Round geometry for single-elimination brackets.
//!
//! Slots are laid out round-major: all of round 1, then round 2, and so
//! on. Round *r* (1-indexed) holds `ceil(n / 2^r)` slots for `n`
//! players, so an odd-sized round carries exactly one bye slot at its
//! tail. Sibling pairing and next-round destinations are computed from
//! explicit round boundaries; global parity over the flat index is
//! wrong whenever a round size is not a power of two.

use thiserror::Error;

/// Layout errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("a bracket needs at least 2 players, got {0}")]
    InvalidPlayerCount(usize),
}

/// Per-round slot counts and offsets for a fixed player count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundLayout {
    total_players: usize,
    /// slots[r - 1] is the slot count of round r
    slots: Vec<usize>,
    /// offsets[r - 1] is the flat index of round r's first slot
    offsets: Vec<usize>,
}

impl RoundLayout {
    /// Derive the layout for `total_players` seeded entrants
    pub fn new(total_players: usize) -> Result<Self, LayoutError> {
        if total_players < 2 {
            return Err(LayoutError::InvalidPlayerCount(total_players));
        }

        let mut slots = Vec::new();
        let mut offsets = Vec::new();
        let mut entrants = total_players;
        let mut offset = 0;
        while entrants > 1 {
            let count = entrants.div_ceil(2);
            slots.push(count);
            offsets.push(offset);
            offset += count;
            entrants = count;
        }

        Ok(Self {
            total_players,
            slots,
            offsets,
        })
    }

    pub fn total_players(&self) -> usize {
        self.total_players
    }

    /// Number of rounds, equal to ceil(log2(total_players))
    pub fn total_rounds(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Total slot count across all rounds (N - 1 plus one per bye)
    pub fn total_slots(&self) -> usize {
        self.slots.iter().sum()
    }

    /// Slot count of `round` (1-indexed)
    pub fn slots_in_round(&self, round: u32) -> Option<usize> {
        self.slots.get(round.checked_sub(1)? as usize).copied()
    }

    /// Flat index range occupied by `round` (1-indexed)
    pub fn round_range(&self, round: u32) -> Option<std::ops::Range<usize>> {
        let i = round.checked_sub(1)? as usize;
        let offset = *self.offsets.get(i)?;
        Some(offset..offset + self.slots[i])
    }

    /// Round (1-indexed) containing `slot_index`
    pub fn round_of(&self, slot_index: usize) -> Option<u32> {
        if slot_index >= self.total_slots() {
            return None;
        }
        let position = self
            .offsets
            .iter()
            .rposition(|&offset| offset <= slot_index)?;
        Some(position as u32 + 1)
    }

    /// Sibling slot within the same round, or `None` for the unpaired
    /// tail slot of an odd-sized round. Siblings never cross round
    /// boundaries.
    pub fn sibling(&self, slot_index: usize) -> Option<usize> {
        let round = self.round_of(slot_index)?;
        let range = self.round_range(round)?;
        let within = slot_index - range.start;
        let partner = if within.is_multiple_of(2) {
            slot_index + 1
        } else {
            slot_index - 1
        };
        range.contains(&partner).then_some(partner)
    }

    /// Next-round slot fed by `slot_index`, or `None` for the final
    /// round
    pub fn destination(&self, slot_index: usize) -> Option<usize> {
        let round = self.round_of(slot_index)?;
        let range = self.round_range(round)?;
        let next = self.round_range(round + 1)?;
        let within = slot_index - range.start;
        Some(next.start + within / 2)
    }
}
