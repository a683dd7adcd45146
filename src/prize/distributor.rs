//! Prize distributor: pays ranked winners exactly once.

use super::errors::{PrizeError, PrizeResult};
use super::models::{PrizeDistribution, Transaction};
use crate::bracket::{TournamentId, TournamentStatus};
use crate::store::{BracketStore, StoreError, WalletStore};
use std::sync::Arc;

/// Bounded optimistic retries before surfacing a conflict
const MAX_CAS_ATTEMPTS: u32 = 5;

/// Prize distributor
///
/// Credits each ranked winner and flips `prize_distributed` in one
/// atomic store unit. The flag is checked on every fresh read, so a
/// concurrent duplicate invocation loses the compare-and-set and then
/// observes `AlreadyDistributed` instead of paying twice.
pub struct PrizeDistributor<S> {
    store: Arc<S>,
}

impl<S> PrizeDistributor<S>
where
    S: BracketStore + WalletStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Distribute `distribution` for a completed tournament
    ///
    /// Ranks without a defined winner are skipped. Returns the ledger
    /// records written.
    ///
    /// # Errors
    ///
    /// * `TournamentNotFound` - no such tournament
    /// * `TournamentNotCompleted` - final match not yet decided
    /// * `AlreadyDistributed` - prizes were already paid; hard stop
    pub async fn distribute(
        &self,
        tournament_id: TournamentId,
        distribution: &PrizeDistribution,
    ) -> PrizeResult<Vec<Transaction>> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let versioned = self
                .store
                .fetch_tournament(tournament_id)
                .await?
                .ok_or(PrizeError::TournamentNotFound(tournament_id))?;
            let mut tournament = versioned.doc;

            if tournament.prize_distributed {
                return Err(PrizeError::AlreadyDistributed(tournament_id));
            }
            if tournament.status != TournamentStatus::Completed {
                return Err(PrizeError::TournamentNotCompleted(tournament_id));
            }

            let credits: Vec<Transaction> = distribution
                .amounts()
                .filter_map(|(rank, amount)| {
                    tournament
                        .winners
                        .get(rank as usize - 1)
                        .map(|&player| Transaction::winnings(player, tournament_id, amount, rank))
                })
                .collect();

            tournament.prize_distributed = true;

            match self
                .store
                .apply_prize_distribution(&tournament, versioned.version, &credits)
                .await
            {
                Ok(_) => {
                    log::info!(
                        "distributed {} across {} winners for tournament {tournament_id}",
                        credits.iter().map(|c| c.amount).sum::<i64>(),
                        credits.len(),
                    );
                    return Ok(credits);
                }
                Err(StoreError::VersionConflict(_)) => {
                    log::warn!(
                        "version conflict distributing prizes for tournament {tournament_id}, attempt {attempt}"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(PrizeError::ConflictRetriesExhausted {
            tournament_id,
            attempts: MAX_CAS_ATTEMPTS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::Tournament;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use uuid::Uuid;

    fn completed_tournament(champion: Uuid) -> Tournament {
        let mut t = Tournament::new("Prize Test", 100, vec![champion, Uuid::new_v4()]);
        t.status = TournamentStatus::Completed;
        t.winners = vec![champion];
        t.end_time = Some(Utc::now());
        t
    }

    #[tokio::test]
    async fn distributes_once_and_credits_the_champion() {
        let store = Arc::new(MemoryStore::new());
        let champion = Uuid::new_v4();
        let t = completed_tournament(champion);
        let id = t.id;
        store.insert_tournament(&t).await.unwrap();

        let distributor = PrizeDistributor::new(Arc::clone(&store));
        let distribution = PrizeDistribution::winner_takes_all(200).unwrap();
        let credits = distributor.distribute(id, &distribution).await.unwrap();

        assert_eq!(credits.len(), 1);
        assert_eq!(store.balance(champion).await.unwrap(), 200);
        assert_eq!(store.transactions().len(), 1);

        let fetched = store.fetch_tournament(id).await.unwrap().unwrap();
        assert!(fetched.doc.prize_distributed);
    }

    #[tokio::test]
    async fn second_distribution_is_a_hard_stop() {
        let store = Arc::new(MemoryStore::new());
        let champion = Uuid::new_v4();
        let t = completed_tournament(champion);
        let id = t.id;
        store.insert_tournament(&t).await.unwrap();

        let distributor = PrizeDistributor::new(Arc::clone(&store));
        let distribution = PrizeDistribution::winner_takes_all(200).unwrap();
        distributor.distribute(id, &distribution).await.unwrap();

        let err = distributor.distribute(id, &distribution).await.unwrap_err();
        assert!(matches!(err, PrizeError::AlreadyDistributed(_)));

        // No balance change and no extra ledger entry from the retry.
        assert_eq!(store.balance(champion).await.unwrap(), 200);
        assert_eq!(store.transactions().len(), 1);
    }

    #[tokio::test]
    async fn preflagged_tournament_rejects_with_zero_credits() {
        let store = Arc::new(MemoryStore::new());
        let champion = Uuid::new_v4();
        let mut t = completed_tournament(champion);
        t.prize_distributed = true;
        let id = t.id;
        store.insert_tournament(&t).await.unwrap();

        let distributor = PrizeDistributor::new(Arc::clone(&store));
        let distribution = PrizeDistribution::winner_takes_all(200).unwrap();
        let err = distributor.distribute(id, &distribution).await.unwrap_err();

        assert!(matches!(err, PrizeError::AlreadyDistributed(_)));
        assert_eq!(store.balance(champion).await.unwrap(), 0);
        assert!(store.transactions().is_empty());
    }

    #[tokio::test]
    async fn live_tournament_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut t = completed_tournament(Uuid::new_v4());
        t.status = TournamentStatus::Live;
        t.winners.clear();
        let id = t.id;
        store.insert_tournament(&t).await.unwrap();

        let distributor = PrizeDistributor::new(Arc::clone(&store));
        let distribution = PrizeDistribution::winner_takes_all(200).unwrap();
        let err = distributor.distribute(id, &distribution).await.unwrap_err();
        assert!(matches!(err, PrizeError::TournamentNotCompleted(_)));
    }

    #[tokio::test]
    async fn unknown_tournament_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let distributor = PrizeDistributor::new(store);
        let distribution = PrizeDistribution::winner_takes_all(200).unwrap();
        let err = distributor
            .distribute(Uuid::new_v4(), &distribution)
            .await
            .unwrap_err();
        assert!(matches!(err, PrizeError::TournamentNotFound(_)));
    }

    #[tokio::test]
    async fn ranks_without_winners_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        let champion = Uuid::new_v4();
        let t = completed_tournament(champion);
        let id = t.id;
        store.insert_tournament(&t).await.unwrap();

        let distributor = PrizeDistributor::new(Arc::clone(&store));
        let distribution = PrizeDistribution::standard_split(1000).unwrap();
        let credits = distributor.distribute(id, &distribution).await.unwrap();

        // Only the champion is recorded; ranks 2 and 3 have no winner.
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].amount, 500);
        assert_eq!(store.balance(champion).await.unwrap(), 500);
    }

    #[tokio::test]
    async fn concurrent_distribution_pays_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let champion = Uuid::new_v4();
        let t = completed_tournament(champion);
        let id = t.id;
        store.insert_tournament(&t).await.unwrap();

        let distributor = Arc::new(PrizeDistributor::new(Arc::clone(&store)));
        let distribution = PrizeDistribution::winner_takes_all(300).unwrap();

        let a = {
            let d = Arc::clone(&distributor);
            let dist = distribution.clone();
            tokio::spawn(async move { d.distribute(id, &dist).await })
        };
        let b = {
            let d = Arc::clone(&distributor);
            let dist = distribution.clone();
            tokio::spawn(async move { d.distribute(id, &dist).await })
        };

        let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
        let successes = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one invocation may pay out");

        assert_eq!(store.balance(champion).await.unwrap(), 300);
        assert_eq!(store.transactions().len(), 1);
    }
}
