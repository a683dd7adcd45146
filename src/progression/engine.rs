//! Progression engine: advances the bracket as matches are decided.
//!
//! The engine is invoked once per match-state-change event. Delivery
//! is at-least-once and unordered, so every path here is idempotent:
//! duplicate or racing events converge on the slot check inside one
//! versioned compare-and-set against the tournament document. Lost
//! writes are retried with fresh reads, bounded, and then surfaced.

use super::errors::{ProgressionError, ProgressionResult};
use super::factory::{self, EnsureOutcome};
use crate::bracket::{
    pairing, Advancement, Match, MatchId, PlayerId, PlayerSummary, RoundLayout, Slot, Tournament,
    TournamentId, TournamentStatus,
};
use crate::store::{BracketStore, StoreError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Bounded optimistic retries before surfacing a conflict
const MAX_CAS_ATTEMPTS: u32 = 5;

/// Match completion event, as delivered by the result-verification
/// workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDecided {
    pub match_id: MatchId,
    pub tournament_id: TournamentId,
    pub round: u32,
    pub winner_id: PlayerId,
}

/// What one progression event accomplished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressionOutcome {
    /// Both participants were known: the next-round match exists now
    MatchCreated(MatchId),
    /// Opponent undecided: the winner waits in a placeholder slot
    PlaceholderRecorded,
    /// The final match was decided: the tournament is complete
    TournamentCompleted,
    /// Duplicate or racing delivery; the bracket already reflects this
    /// event
    AlreadyProcessed,
}

enum Commit {
    Unchanged(ProgressionOutcome),
    Write {
        outcome: ProgressionOutcome,
        new_matches: Vec<Match>,
    },
}

/// Event-driven bracket progression controller
pub struct ProgressionEngine<S> {
    store: Arc<S>,
}

impl<S> ProgressionEngine<S>
where
    S: BracketStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Handle a match reaching its decided state
    ///
    /// Creates the next-round match when the sibling is also decided,
    /// records a placeholder when it is not, advances unpaired winners
    /// as byes, and completes the tournament after the final. Safe
    /// under duplicate and concurrent delivery.
    pub async fn handle_match_decided(
        &self,
        event: &MatchDecided,
    ) -> ProgressionResult<ProgressionOutcome> {
        let decided = self
            .store
            .fetch_match(event.match_id)
            .await?
            .ok_or(ProgressionError::MatchNotFound(event.match_id))?;
        let winner = match decided.winner_id {
            Some(winner) if decided.is_decided() => winner,
            _ => return Err(ProgressionError::MatchNotDecided(event.match_id)),
        };
        if winner != event.winner_id {
            log::warn!(
                "event for match {} names winner {} but the document records {winner}; using the document",
                event.match_id,
                event.winner_id,
            );
        }

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let versioned = self
                .store
                .fetch_tournament(event.tournament_id)
                .await?
                .ok_or(ProgressionError::TournamentNotFound(event.tournament_id))?;
            let mut tournament = versioned.doc;

            let slot_index = pairing::locate(&tournament, &decided)?;
            let commit = self.advance(&mut tournament, slot_index, winner).await?;

            match commit {
                Commit::Unchanged(outcome) => return Ok(outcome),
                Commit::Write {
                    outcome,
                    new_matches,
                } => {
                    match self
                        .store
                        .update_tournament_with_matches(
                            &tournament,
                            versioned.version,
                            &new_matches,
                        )
                        .await
                    {
                        Ok(_) => {
                            log::debug!(
                                "advanced winner {winner} of match {} in tournament {}: {outcome:?}",
                                event.match_id,
                                event.tournament_id,
                            );
                            return Ok(outcome);
                        }
                        Err(StoreError::VersionConflict(_)) => {
                            log::warn!(
                                "version conflict advancing tournament {}, attempt {attempt}",
                                event.tournament_id,
                            );
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        Err(ProgressionError::ConflictRetriesExhausted {
            tournament_id: event.tournament_id,
            attempts: MAX_CAS_ATTEMPTS,
        })
    }

    /// Seed round 1 from the tournament's player list
    ///
    /// Pairs players in seed order into pending matches, gives the odd
    /// tail player a bye, and eagerly propagates unpaired byes into
    /// later rounds. Idempotent: a tournament whose bracket already
    /// exists is left untouched. Returns the ids of the created
    /// round-1 matches.
    pub async fn initialize_bracket(
        &self,
        tournament_id: TournamentId,
    ) -> ProgressionResult<Vec<MatchId>> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let versioned = self
                .store
                .fetch_tournament(tournament_id)
                .await?
                .ok_or(ProgressionError::TournamentNotFound(tournament_id))?;
            let mut tournament = versioned.doc;

            if !tournament.bracket.is_empty() {
                log::debug!("bracket of tournament {tournament_id} is already seeded");
                return Ok(Vec::new());
            }

            let layout = RoundLayout::new(tournament.player_ids.len())?;
            let profiles = self.profiles_for(&tournament.player_ids).await?;

            let mut matches = Vec::new();
            for pair in tournament.player_ids.clone().chunks(2) {
                match *pair {
                    [a, b] => {
                        let m = Match::new(
                            tournament.id,
                            1,
                            vec![a, b],
                            profiles
                                .iter()
                                .filter(|(id, _)| **id == a || **id == b)
                                .map(|(id, p)| (*id, p.clone()))
                                .collect(),
                            tournament.entry_fee,
                        );
                        tournament.bracket.push(Slot::Ready {
                            match_id: m.id,
                            players: [a, b],
                        });
                        matches.push(m);
                    }
                    [odd] => tournament.bracket.push(Slot::Bye { player: odd }),
                    _ => unreachable!("chunks(2) yields one or two players"),
                }
            }

            // An unpaired bye advances on its own: nothing will ever
            // read it through sibling resolution, so push it forward
            // until it lands next to a slot that will.
            if let Some(Slot::Bye { player }) = tournament.bracket.last().cloned() {
                let mut index = tournament.bracket.len() - 1;
                while let Advancement::Advance {
                    sibling_index: None,
                    next_slot_index,
                    ..
                } = pairing::resolve_slot(&layout, index)?
                {
                    factory::ensure_bye(&mut tournament, next_slot_index, player);
                    index = next_slot_index;
                }
            }

            tournament.status = TournamentStatus::Live;
            tournament.start_time = Some(Utc::now());

            match self
                .store
                .update_tournament_with_matches(&tournament, versioned.version, &matches)
                .await
            {
                Ok(_) => {
                    log::info!(
                        "seeded tournament {tournament_id}: {} players, {} round-1 matches",
                        tournament.player_ids.len(),
                        matches.len(),
                    );
                    return Ok(matches.iter().map(|m| m.id).collect());
                }
                Err(StoreError::VersionConflict(_)) => {
                    log::warn!(
                        "version conflict seeding tournament {tournament_id}, attempt {attempt}"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ProgressionError::ConflictRetriesExhausted {
            tournament_id,
            attempts: MAX_CAS_ATTEMPTS,
        })
    }

    /// Advance the winner at `slot_index`, cascading through unpaired
    /// byes, and plan the resulting document state
    async fn advance(
        &self,
        tournament: &mut Tournament,
        mut slot_index: usize,
        winner: PlayerId,
    ) -> ProgressionResult<Commit> {
        let layout = RoundLayout::new(tournament.player_ids.len())?;
        let mut new_matches = Vec::new();
        let mut changed = false;

        loop {
            match pairing::resolve_slot(&layout, slot_index)? {
                Advancement::Complete => {
                    // Re-delivery of the final result must not re-run
                    // completion.
                    if tournament.status == TournamentStatus::Completed {
                        return Ok(Commit::Unchanged(ProgressionOutcome::AlreadyProcessed));
                    }
                    tournament.status = TournamentStatus::Completed;
                    tournament.winners = vec![winner];
                    tournament.end_time = Some(Utc::now());
                    log::info!(
                        "tournament {} completed, champion {winner}",
                        tournament.id
                    );
                    return Ok(Commit::Write {
                        outcome: ProgressionOutcome::TournamentCompleted,
                        new_matches,
                    });
                }
                Advancement::Advance {
                    sibling_index: None,
                    next_slot_index,
                    ..
                } => {
                    if factory::ensure_bye(tournament, next_slot_index, winner)
                        == EnsureOutcome::ByeWritten
                    {
                        changed = true;
                    }
                    // The bye is itself decided; keep advancing from
                    // its slot.
                    slot_index = next_slot_index;
                }
                Advancement::Advance {
                    round,
                    sibling_index: Some(sibling_index),
                    next_slot_index,
                } => {
                    let sibling = tournament.slot(sibling_index).clone();
                    let sibling_match = match sibling.match_id() {
                        Some(id) => self.store.fetch_match(id).await?,
                        None => None,
                    };
                    let opponent = pairing::sibling_winner(&sibling, sibling_match.as_ref());

                    let outcome = match opponent {
                        Some(opponent) => {
                            let profiles = self.profiles_for(&[winner, opponent]).await?;
                            match factory::ensure_match(
                                tournament,
                                next_slot_index,
                                round + 1,
                                winner,
                                opponent,
                                profiles,
                            ) {
                                EnsureOutcome::Created(m) => {
                                    let id = m.id;
                                    new_matches.push(m);
                                    changed = true;
                                    ProgressionOutcome::MatchCreated(id)
                                }
                                _ => ProgressionOutcome::AlreadyProcessed,
                            }
                        }
                        None => match factory::ensure_placeholder(
                            tournament,
                            next_slot_index,
                            winner,
                        ) {
                            EnsureOutcome::PlaceholderWritten => {
                                changed = true;
                                ProgressionOutcome::PlaceholderRecorded
                            }
                            _ => ProgressionOutcome::AlreadyProcessed,
                        },
                    };

                    return Ok(if changed {
                        Commit::Write {
                            outcome,
                            new_matches,
                        }
                    } else {
                        Commit::Unchanged(outcome)
                    });
                }
            }
        }
    }

    /// Profiles for the given players, with an anonymous fallback for
    /// any the profile collaborator has not written yet
    async fn profiles_for(
        &self,
        ids: &[PlayerId],
    ) -> ProgressionResult<HashMap<PlayerId, PlayerSummary>> {
        let mut profiles = self.store.fetch_players(ids).await?;
        for id in ids {
            if !profiles.contains_key(id) {
                log::warn!("no profile for player {id}, using an anonymous summary");
                profiles.insert(*id, PlayerSummary::anonymous());
            }
        }
        Ok(profiles)
    }
}
