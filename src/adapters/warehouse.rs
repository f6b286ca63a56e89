//! Analytical warehouse reader
//!
//! The warehouse speaks the Postgres wire protocol and exposes the
//! `match_fact_history` rollup with the same columns as `match_facts`.
//! It is populated by a batch export outside this crate, so recent matches
//! may be missing or duplicated relative to the operational store.

use super::postgres::fact_from_row;
use super::ports::MatchFactSource;
use crate::domain::{MatchFact, Window};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, instrument};

#[derive(Clone)]
pub struct WarehouseStore {
    pool: PgPool,
}

impl WarehouseStore {
    pub async fn new(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        info!("Connected to analytical warehouse");
        Ok(Self { pool })
    }
}

#[async_trait]
impl MatchFactSource for WarehouseStore {
    fn name(&self) -> &str {
        "warehouse"
    }

    #[instrument(skip(self))]
    async fn list_match_facts(&self, window: &Window) -> Result<Vec<MatchFact>> {
        let rows = sqlx::query(
            r#"
            SELECT player_id, match_id, position, minutes_played, goals, assists,
                   yellow_cards, red_cards, team_goals, opponent_goals, mvp_votes,
                   match_timestamp
            FROM match_fact_history
            WHERE match_timestamp >= $1 AND match_timestamp < $2
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

        debug!("Loaded {} warehouse facts for {}", facts.len(), window);
        Ok(facts)
    }
}
