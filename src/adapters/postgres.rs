use super::ports::{AwardStore, InsertOutcome, MatchFactSource, NotificationLedger, PlayerDirectory};
use crate::domain::{
    AwardKey, AwardKind, AwardPayload, AwardRecord, MatchFact, NotificationCategory, PlayerContact, Position,
    Window,
};
use crate::error::{LaurelError, Result};
use crate::ranking::AggregatedEntry;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// PostgreSQL storage adapter for the operational store
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }
}

// ==================== Match facts ====================

fn count_column(row: &PgRow, column: &str) -> Result<Option<u32>> {
    let value: Option<i32> = row.try_get(column)?;
    // Negative counts are corrupt input; treat them as missing so the fact is skipped
    Ok(value.and_then(|v| u32::try_from(v).ok()))
}

/// Map a fact row; `None` when the position code is not recognised
pub(crate) fn fact_from_row(row: &PgRow) -> Result<Option<MatchFact>> {
    let player_id: String = row.try_get("player_id")?;
    let match_id: String = row.try_get("match_id")?;
    let position: String = row.try_get("position")?;

    let role_at_match = match position.parse::<Position>() {
        Ok(p) => p,
        Err(e) => {
            warn!("Skipping fact {}/{}: {}", match_id, player_id, e);
            return Ok(None);
        }
    };

    Ok(Some(MatchFact {
        player_id,
        match_id,
        role_at_match,
        minutes_played: count_column(row, "minutes_played")?,
        goals: count_column(row, "goals")?,
        assists: count_column(row, "assists")?,
        yellow_cards: count_column(row, "yellow_cards")?.unwrap_or(0),
        red_cards: count_column(row, "red_cards")?.unwrap_or(0),
        team_goals: count_column(row, "team_goals")?,
        opponent_goals: count_column(row, "opponent_goals")?,
        mvp_votes: count_column(row, "mvp_votes")?.unwrap_or(0),
        match_timestamp: row.try_get("match_timestamp")?,
    }))
}

#[async_trait]
impl MatchFactSource for PostgresStore {
    fn name(&self) -> &str {
        "operational"
    }

    #[instrument(skip(self))]
    async fn list_match_facts(&self, window: &Window) -> Result<Vec<MatchFact>> {
        let rows = sqlx::query(
            r#"
            SELECT player_id, match_id, position, minutes_played, goals, assists,
                   yellow_cards, red_cards, team_goals, opponent_goals, mvp_votes,
                   match_timestamp
            FROM match_facts
            WHERE finalized
              AND match_timestamp >= $1 AND match_timestamp < $2
            ORDER BY match_timestamp ASC, match_id ASC, player_id ASC
            "#,
        )
        .bind(window.start())
        .bind(window.end_exclusive())
        .fetch_all(&self.pool)
        .await?;

        let mut facts = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(fact) = fact_from_row(row)? {
                facts.push(fact);
            }
        }

        debug!("Loaded {} operational facts for {}", facts.len(), window);
        Ok(facts)
    }
}

// ==================== Awards ====================

fn award_from_row(row: &PgRow) -> Result<AwardRecord> {
    let kind: String = row.try_get("award_kind")?;
    let payload: sqlx::types::Json<AwardPayload> = row.try_get("payload")?;
    Ok(AwardRecord {
        key: AwardKey {
            kind: kind.parse::<AwardKind>()?,
            scope: row.try_get("scope")?,
            subject: row.try_get("subject")?,
        },
        payload: payload.0,
        issued_by_run: row.try_get("issued_by_run")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl AwardStore for PostgresStore {
    #[instrument(skip(self, record), fields(key = %record.key))]
    async fn insert_if_absent(&self, record: &AwardRecord) -> Result<InsertOutcome> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO awards (
                award_kind, natural_key, scope, subject, period_key, payload, issued_by_run, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (natural_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(record.key.kind.as_str())
        .bind(record.key.natural_key())
        .bind(&record.key.scope)
        .bind(&record.key.subject)
        .bind(record.payload.period_key())
        .bind(sqlx::types::Json(&record.payload))
        .bind(record.issued_by_run)
        .bind(record.created_at)
        .fetch_optional(&self.pool)
        .await?;

        if inserted.is_some() {
            debug!("Inserted award {}", record.key);
            return Ok(InsertOutcome::Inserted);
        }

        match self.find(&record.key).await? {
            Some(existing) => Ok(InsertOutcome::Existing(existing)),
            None => Err(LaurelError::Internal(format!(
                "award {} conflicted but could not be read back",
                record.key
            ))),
        }
    }

    async fn find(&self, key: &AwardKey) -> Result<Option<AwardRecord>> {
        let row = sqlx::query(
            r#"
            SELECT award_kind, scope, subject, payload, issued_by_run, created_at
            FROM awards
            WHERE natural_key = $1
            "#,
        )
        .bind(key.natural_key())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(award_from_row).transpose()
    }

    async fn append_achievement(&self, player_id: &str, record: &AwardRecord) -> Result<bool> {
        let row = sqlx::query(
            r#"
            INSERT INTO player_achievements (player_id, natural_key, award_kind)
            VALUES ($1, $2, $3)
            ON CONFLICT (natural_key, player_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(player_id)
        .bind(record.key.natural_key())
        .bind(record.key.kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn save_snapshot(&self, period_key: &str, entries: &[AggregatedEntry]) -> Result<u64> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut written = 0u64;
        // Stay well below the bind-parameter limit
        for chunk in entries.chunks(1000) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO ranking_snapshots \
                 (period_key, player_id, category, group_key, total_score, matches_counted) ",
            );
            qb.push_values(chunk.iter(), |mut b, e| {
                b.push_bind(period_key)
                    .push_bind(&e.player_id)
                    .push_bind(e.category.as_str())
                    .push_bind(e.group.to_string())
                    .push_bind(e.total_score)
                    .push_bind(i32::try_from(e.matches_counted).unwrap_or(i32::MAX));
            });
            qb.push(" ON CONFLICT DO NOTHING");

            written += qb.build().execute(&self.pool).await?.rows_affected();
        }

        debug!("Saved {} snapshot rows for {}", written, period_key);
        Ok(written)
    }
}

// ==================== Notification counters ====================

#[async_trait]
impl NotificationLedger for PostgresStore {
    async fn reserve_send(
        &self,
        recipient: &str,
        category: NotificationCategory,
        day: NaiveDate,
        cap: u32,
    ) -> Result<bool> {
        if cap == 0 {
            return Ok(false);
        }

        // Insert the first send, or bump the counter only while under the cap.
        // No row is returned when the cap has been reached.
        let row = sqlx::query(
            r#"
            INSERT INTO notification_sends (recipient, category, day, count)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (recipient, category, day) DO UPDATE SET
                count = notification_sends.count + 1,
                updated_at = NOW()
            WHERE notification_sends.count < $4
            RETURNING count
            "#,
        )
        .bind(recipient)
        .bind(category.as_str())
        .bind(day)
        .bind(i32::try_from(cap).unwrap_or(i32::MAX))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }
}

// ==================== Player directory ====================

fn contact_from_row(row: &PgRow) -> Result<PlayerContact> {
    Ok(PlayerContact {
        player_id: row.try_get("player_id")?,
        display_name: row.try_get("display_name")?,
        country: row.try_get("country")?,
        contact_token: row.try_get("contact_token")?,
    })
}

#[async_trait]
impl PlayerDirectory for PostgresStore {
    async fn lookup(&self, player_id: &str) -> Result<Option<PlayerContact>> {
        let row = sqlx::query(
            "SELECT player_id, display_name, country, contact_token FROM players WHERE player_id = $1",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(contact_from_row).transpose()
    }

    async fn lookup_many(&self, player_ids: &[String]) -> Result<HashMap<String, PlayerContact>> {
        if player_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT player_id, display_name, country, contact_token FROM players WHERE player_id = ANY($1)",
        )
        .bind(player_ids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| contact_from_row(row).map(|c| (c.player_id.clone(), c)))
            .collect()
    }
}
