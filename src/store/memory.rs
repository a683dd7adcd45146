//! In-memory document store for tests and embedders.
//!
//! Every trait method takes the single interior lock for its whole
//! read-modify-write, which gives the same per-tournament atomicity
//! the PostgreSQL implementation gets from transactions.

use super::{BracketStore, StoreError, StoreResult, Version, Versioned, WalletStore};
use crate::bracket::{
    Match, MatchId, MatchStatus, PlayerId, PlayerSummary, Tournament, TournamentId,
};
use crate::prize::Transaction;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    tournaments: HashMap<TournamentId, (Tournament, Version)>,
    matches: HashMap<MatchId, Match>,
    players: HashMap<PlayerId, PlayerSummary>,
    wallets: HashMap<PlayerId, i64>,
    transactions: Vec<Transaction>,
}

/// In-memory store implementing [`BracketStore`] and [`WalletStore`]
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store lock poisoned")
    }

    /// Register a player profile (stands in for the out-of-scope
    /// profile collaborator)
    pub fn register_player(&self, id: PlayerId, summary: PlayerSummary) {
        self.lock().players.insert(id, summary);
    }

    /// Mark a match completed with the given winner (stands in for the
    /// out-of-scope result-verification workflow)
    ///
    /// The winner is immutable once set: a second call leaves the
    /// original decision in place. Returns `false` when the match does
    /// not exist.
    pub fn decide_match(&self, id: MatchId, winner: PlayerId) -> bool {
        let mut inner = self.lock();
        let Some(m) = inner.matches.get_mut(&id) else {
            return false;
        };
        if m.winner_id.is_none() {
            m.winner_id = Some(winner);
            m.status = MatchStatus::Completed;
        }
        true
    }

    /// Number of match documents ever created
    pub fn match_count(&self) -> usize {
        self.lock().matches.len()
    }

    /// All matches of one tournament round, in no particular order
    pub fn matches_in_round(&self, tournament_id: TournamentId, round: u32) -> Vec<Match> {
        self.lock()
            .matches
            .values()
            .filter(|m| m.tournament_id == tournament_id && m.round == round)
            .cloned()
            .collect()
    }

    /// Snapshot of the transaction ledger
    pub fn transactions(&self) -> Vec<Transaction> {
        self.lock().transactions.clone()
    }
}

#[async_trait]
impl BracketStore for MemoryStore {
    async fn fetch_tournament(
        &self,
        id: TournamentId,
    ) -> StoreResult<Option<Versioned<Tournament>>> {
        Ok(self
            .lock()
            .tournaments
            .get(&id)
            .map(|(doc, version)| Versioned {
                doc: doc.clone(),
                version: *version,
            }))
    }

    async fn insert_tournament(&self, tournament: &Tournament) -> StoreResult<Version> {
        let mut inner = self.lock();
        if inner.tournaments.contains_key(&tournament.id) {
            return Err(StoreError::AlreadyExists(tournament.id));
        }
        inner
            .tournaments
            .insert(tournament.id, (tournament.clone(), 1));
        Ok(1)
    }

    async fn update_tournament_with_matches(
        &self,
        tournament: &Tournament,
        expected_version: Version,
        new_matches: &[Match],
    ) -> StoreResult<Version> {
        let mut inner = self.lock();
        let Some((doc, version)) = inner.tournaments.get_mut(&tournament.id) else {
            return Err(StoreError::NotFound(tournament.id));
        };
        if *version != expected_version {
            return Err(StoreError::VersionConflict(tournament.id));
        }
        *doc = tournament.clone();
        *version += 1;
        let new_version = *version;
        for m in new_matches {
            inner.matches.insert(m.id, m.clone());
        }
        Ok(new_version)
    }

    async fn fetch_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.lock().matches.get(&id).cloned())
    }

    async fn fetch_players(
        &self,
        ids: &[PlayerId],
    ) -> StoreResult<HashMap<PlayerId, PlayerSummary>> {
        let inner = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| inner.players.get(id).map(|p| (*id, p.clone())))
            .collect())
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn apply_prize_distribution(
        &self,
        tournament: &Tournament,
        expected_version: Version,
        credits: &[Transaction],
    ) -> StoreResult<Version> {
        let mut inner = self.lock();
        let Some((doc, version)) = inner.tournaments.get_mut(&tournament.id) else {
            return Err(StoreError::NotFound(tournament.id));
        };
        if *version != expected_version {
            return Err(StoreError::VersionConflict(tournament.id));
        }
        *doc = tournament.clone();
        *version += 1;
        let new_version = *version;
        for credit in credits {
            *inner.wallets.entry(credit.player_id).or_insert(0) += credit.amount;
            inner.transactions.push(credit.clone());
        }
        Ok(new_version)
    }

    async fn balance(&self, player_id: PlayerId) -> StoreResult<i64> {
        Ok(self.lock().wallets.get(&player_id).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tournament() -> Tournament {
        let players: Vec<Uuid> = (0..2).map(|_| Uuid::new_v4()).collect();
        Tournament::new("Store Test", 100, players)
    }

    #[tokio::test]
    async fn insert_then_fetch_roundtrips() {
        let store = MemoryStore::new();
        let t = tournament();
        assert_eq!(store.insert_tournament(&t).await.unwrap(), 1);

        let fetched = store.fetch_tournament(t.id).await.unwrap().unwrap();
        assert_eq!(fetched.version, 1);
        assert_eq!(fetched.doc.name, "Store Test");

        assert!(matches!(
            store.insert_tournament(&t).await,
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = MemoryStore::new();
        let mut t = tournament();
        store.insert_tournament(&t).await.unwrap();

        t.name = "First Writer".to_string();
        let v2 = store
            .update_tournament_with_matches(&t, 1, &[])
            .await
            .unwrap();
        assert_eq!(v2, 2);

        // A writer still holding version 1 must lose.
        t.name = "Stale Writer".to_string();
        assert!(matches!(
            store.update_tournament_with_matches(&t, 1, &[]).await,
            Err(StoreError::VersionConflict(_))
        ));

        let fetched = store.fetch_tournament(t.id).await.unwrap().unwrap();
        assert_eq!(fetched.doc.name, "First Writer");
    }

    #[tokio::test]
    async fn matches_ride_the_tournament_write() {
        let store = MemoryStore::new();
        let t = tournament();
        store.insert_tournament(&t).await.unwrap();

        let m = Match::new(
            t.id,
            1,
            t.player_ids.clone(),
            HashMap::new(),
            t.entry_fee,
        );
        store
            .update_tournament_with_matches(&t, 1, std::slice::from_ref(&m))
            .await
            .unwrap();

        let fetched = store.fetch_match(m.id).await.unwrap().unwrap();
        assert_eq!(fetched.round, 1);
        assert_eq!(store.match_count(), 1);
    }

    #[tokio::test]
    async fn decide_match_keeps_first_winner() {
        let store = MemoryStore::new();
        let t = tournament();
        store.insert_tournament(&t).await.unwrap();
        let m = Match::new(
            t.id,
            1,
            t.player_ids.clone(),
            HashMap::new(),
            t.entry_fee,
        );
        store
            .update_tournament_with_matches(&t, 1, std::slice::from_ref(&m))
            .await
            .unwrap();

        assert!(store.decide_match(m.id, t.player_ids[0]));
        assert!(store.decide_match(m.id, t.player_ids[1]));

        let fetched = store.fetch_match(m.id).await.unwrap().unwrap();
        assert_eq!(fetched.winner_id, Some(t.player_ids[0]));
        assert!(!store.decide_match(Uuid::new_v4(), t.player_ids[0]));
    }

    #[tokio::test]
    async fn missing_profiles_are_absent_not_errors() {
        let store = MemoryStore::new();
        let known = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        store.register_player(known, PlayerSummary::new("Ada"));

        let profiles = store.fetch_players(&[known, unknown]).await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[&known].name, "Ada");
    }

    #[tokio::test]
    async fn unknown_wallet_balance_is_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.balance(Uuid::new_v4()).await.unwrap(), 0);
    }
}
