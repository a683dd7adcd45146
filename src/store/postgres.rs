//! PostgreSQL document store.
//!
//! Tournament and match documents are stored as JSONB with a bigint
//! version column on the tournament row. Optimistic writes go through
//! `UPDATE ... WHERE id = $1 AND version = $2`; zero affected rows
//! means a concurrent writer advanced the version (or the row is
//! gone), which the caller sees as `VersionConflict` / `NotFound`.

use super::config::DatabaseConfig;
use super::{BracketStore, StoreError, StoreResult, Version, Versioned, WalletStore};
use crate::bracket::{Match, MatchId, PlayerId, PlayerSummary, Tournament, TournamentId};
use crate::prize::Transaction;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::collections::HashMap;
use std::time::Duration;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS tournaments (
        id UUID PRIMARY KEY,
        doc JSONB NOT NULL,
        version BIGINT NOT NULL DEFAULT 1
    )",
    "CREATE TABLE IF NOT EXISTS matches (
        id UUID PRIMARY KEY,
        tournament_id UUID NOT NULL,
        doc JSONB NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS matches_tournament_idx ON matches (tournament_id)",
    "CREATE TABLE IF NOT EXISTS players (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        avatar TEXT
    )",
    "CREATE TABLE IF NOT EXISTS wallets (
        player_id UUID PRIMARY KEY,
        balance BIGINT NOT NULL DEFAULT 0,
        updated_at TIMESTAMP NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS transactions (
        id UUID PRIMARY KEY,
        player_id UUID NOT NULL,
        tournament_id UUID NOT NULL,
        amount BIGINT NOT NULL,
        txn_type TEXT NOT NULL,
        status TEXT NOT NULL,
        description TEXT,
        created_at TIMESTAMP NOT NULL
    )",
];

/// PostgreSQL store implementing [`BracketStore`] and [`WalletStore`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check that the database connection is healthy
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Create the store tables when they do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert or update a player profile
    pub async fn upsert_player(
        &self,
        id: PlayerId,
        summary: &PlayerSummary,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO players (id, name, avatar)
             VALUES ($1, $2, $3)
             ON CONFLICT (id)
             DO UPDATE SET name = EXCLUDED.name, avatar = EXCLUDED.avatar",
        )
        .bind(id)
        .bind(&summary.name)
        .bind(&summary.avatar)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Map a zero-rows CAS outcome to conflict vs missing row
    async fn cas_failure(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: TournamentId,
    ) -> StoreError {
        let exists = sqlx::query("SELECT 1 FROM tournaments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await;
        match exists {
            Ok(Some(_)) => StoreError::VersionConflict(id),
            Ok(None) => StoreError::NotFound(id),
            Err(e) => StoreError::Database(e),
        }
    }
}

#[async_trait]
impl BracketStore for PgStore {
    async fn fetch_tournament(
        &self,
        id: TournamentId,
    ) -> StoreResult<Option<Versioned<Tournament>>> {
        let row = sqlx::query("SELECT doc, version FROM tournaments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let doc: Tournament = serde_json::from_value(row.get("doc"))?;
                Ok(Some(Versioned {
                    doc,
                    version: row.get("version"),
                }))
            }
            None => Ok(None),
        }
    }

    async fn insert_tournament(&self, tournament: &Tournament) -> StoreResult<Version> {
        let doc = serde_json::to_value(tournament)?;
        let result = sqlx::query(
            "INSERT INTO tournaments (id, doc, version) VALUES ($1, $2, 1)",
        )
        .bind(tournament.id)
        .bind(doc)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(1),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::AlreadyExists(tournament.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_tournament_with_matches(
        &self,
        tournament: &Tournament,
        expected_version: Version,
        new_matches: &[Match],
    ) -> StoreResult<Version> {
        let doc = serde_json::to_value(tournament)?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE tournaments
             SET doc = $2, version = version + 1
             WHERE id = $1 AND version = $3",
        )
        .bind(tournament.id)
        .bind(doc)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::cas_failure(&mut tx, tournament.id).await);
        }

        for m in new_matches {
            let match_doc = serde_json::to_value(m)?;
            sqlx::query("INSERT INTO matches (id, tournament_id, doc) VALUES ($1, $2, $3)")
                .bind(m.id)
                .bind(m.tournament_id)
                .bind(match_doc)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(expected_version + 1)
    }

    async fn fetch_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        let row = sqlx::query("SELECT doc FROM matches WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(serde_json::from_value(row.get("doc"))?)),
            None => Ok(None),
        }
    }

    async fn fetch_players(
        &self,
        ids: &[PlayerId],
    ) -> StoreResult<HashMap<PlayerId, PlayerSummary>> {
        let rows = sqlx::query("SELECT id, name, avatar FROM players WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.get::<PlayerId, _>("id"),
                    PlayerSummary {
                        name: row.get("name"),
                        avatar: row.get("avatar"),
                    },
                )
            })
            .collect())
    }
}

#[async_trait]
impl WalletStore for PgStore {
    async fn apply_prize_distribution(
        &self,
        tournament: &Tournament,
        expected_version: Version,
        credits: &[Transaction],
    ) -> StoreResult<Version> {
        let doc = serde_json::to_value(tournament)?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE tournaments
             SET doc = $2, version = version + 1
             WHERE id = $1 AND version = $3",
        )
        .bind(tournament.id)
        .bind(doc)
        .bind(expected_version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::cas_failure(&mut tx, tournament.id).await);
        }

        for credit in credits {
            sqlx::query(
                "INSERT INTO wallets (player_id, balance, updated_at)
                 VALUES ($1, $2, NOW())
                 ON CONFLICT (player_id)
                 DO UPDATE SET
                    balance = wallets.balance + EXCLUDED.balance,
                    updated_at = NOW()",
            )
            .bind(credit.player_id)
            .bind(credit.amount)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO transactions
                    (id, player_id, tournament_id, amount, txn_type, status, description, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(credit.id)
            .bind(credit.player_id)
            .bind(credit.tournament_id)
            .bind(credit.amount)
            .bind(credit.txn_type.to_string())
            .bind(credit.status.to_string())
            .bind(&credit.description)
            .bind(credit.created_at.naive_utc())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(expected_version + 1)
    }

    async fn balance(&self, player_id: PlayerId) -> StoreResult<i64> {
        let row = sqlx::query("SELECT balance FROM wallets WHERE player_id = $1")
            .bind(player_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("balance")).unwrap_or(0))
    }
}
