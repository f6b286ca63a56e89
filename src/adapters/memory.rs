//! In-memory adapters for tests and local previews
//!
//! Each map entry is updated under its shard lock, which gives the same
//! insert-if-absent and increment-if-under-cap semantics as the SQL store.

use super::ports::{AwardStore, InsertOutcome, MatchFactSource, NotificationDispatcher, NotificationLedger, PlayerDirectory};
use crate::domain::{AwardKey, AwardRecord, MatchFact, Notification, NotificationCategory, PlayerContact, Window};
use crate::error::{LaurelError, Result};
use crate::ranking::AggregatedEntry;
use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Fact source backed by a vector
#[derive(Debug, Default)]
pub struct InMemoryFactSource {
    name: String,
    facts: Vec<MatchFact>,
    delay: Option<Duration>,
    failure: Option<String>,
}

impl InMemoryFactSource {
    pub fn new(name: &str, facts: Vec<MatchFact>) -> Self {
        Self {
            name: name.to_string(),
            facts,
            ..Default::default()
        }
    }

    /// Respond only after `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every query with `reason`
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }
}

#[async_trait]
impl MatchFactSource for InMemoryFactSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_match_facts(&self, window: &Window) -> Result<Vec<MatchFact>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.failure {
            return Err(LaurelError::unavailable(&self.name, reason));
        }
        Ok(self
            .facts
            .iter()
            .filter(|f| window.contains(f.match_timestamp))
            .cloned()
            .collect())
    }
}

/// Award store, notification ledger and player directory in one place
#[derive(Debug, Default)]
pub struct InMemoryStore {
    awards: DashMap<String, AwardRecord>,
    achievements: DashSet<(String, String)>,
    snapshots: DashMap<(String, String, String, String), f64>,
    sends: DashMap<(String, NotificationCategory, NaiveDate), u32>,
    players: DashMap<String, PlayerContact>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&self, contact: PlayerContact) {
        self.players.insert(contact.player_id.clone(), contact);
    }

    pub fn award_count(&self) -> usize {
        self.awards.len()
    }

    pub fn awards(&self) -> Vec<AwardRecord> {
        let mut records: Vec<AwardRecord> = self.awards.iter().map(|r| r.value().clone()).collect();
        records.sort_by_key(|r| r.key.natural_key());
        records
    }

    pub fn achievement_count(&self) -> usize {
        self.achievements.len()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}

#[async_trait]
impl AwardStore for InMemoryStore {
    async fn insert_if_absent(&self, record: &AwardRecord) -> Result<InsertOutcome> {
        match self.awards.entry(record.key.natural_key()) {
            Entry::Occupied(existing) => Ok(InsertOutcome::Existing(existing.get().clone())),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn find(&self, key: &AwardKey) -> Result<Option<AwardRecord>> {
        Ok(self.awards.get(&key.natural_key()).map(|r| r.value().clone()))
    }

    async fn append_achievement(&self, player_id: &str, record: &AwardRecord) -> Result<bool> {
        Ok(self
            .achievements
            .insert((record.key.natural_key(), player_id.to_string())))
    }

    async fn save_snapshot(&self, period_key: &str, entries: &[AggregatedEntry]) -> Result<u64> {
        let mut written = 0;
        for e in entries {
            let key = (
                period_key.to_string(),
                e.player_id.clone(),
                e.category.to_string(),
                e.group.to_string(),
            );
            if let Entry::Vacant(slot) = self.snapshots.entry(key) {
                slot.insert(e.total_score);
                written += 1;
            }
        }
        Ok(written)
    }
}

#[async_trait]
impl NotificationLedger for InMemoryStore {
    async fn reserve_send(
        &self,
        recipient: &str,
        category: NotificationCategory,
        day: NaiveDate,
        cap: u32,
    ) -> Result<bool> {
        let mut count = self
            .sends
            .entry((recipient.to_string(), category, day))
            .or_insert(0);
        if *count >= cap {
            return Ok(false);
        }
        *count += 1;
        Ok(true)
    }
}

#[async_trait]
impl PlayerDirectory for InMemoryStore {
    async fn lookup(&self, player_id: &str) -> Result<Option<PlayerContact>> {
        Ok(self.players.get(player_id).map(|c| c.value().clone()))
    }

    async fn lookup_many(&self, player_ids: &[String]) -> Result<HashMap<String, PlayerContact>> {
        Ok(player_ids
            .iter()
            .filter_map(|id| self.players.get(id).map(|c| (id.clone(), c.value().clone())))
            .collect())
    }
}

/// Dispatcher that records every message; selected recipients can be made to fail
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Notification>>,
    failing: DashSet<String>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing.insert(recipient.to_string());
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, notification: &Notification) -> Result<()> {
        if self.failing.contains(&notification.recipient) {
            return Err(LaurelError::Dispatch(format!(
                "invalid token for {}",
                notification.recipient
            )));
        }
        self.sent
            .lock()
            .map_err(|_| LaurelError::Internal("dispatcher lock poisoned".into()))?
            .push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reserve_send_respects_cap() {
        let store = InMemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let cat = NotificationCategory::TeamSelection;

        assert!(store.reserve_send("p1", cat, day, 2).await.unwrap());
        assert!(store.reserve_send("p1", cat, day, 2).await.unwrap());
        assert!(!store.reserve_send("p1", cat, day, 2).await.unwrap());

        // Other categories and days have their own counters
        assert!(store
            .reserve_send("p1", NotificationCategory::StarOfTheMatch, day, 2)
            .await
            .unwrap());
        assert!(store.reserve_send("p1", cat, day.succ_opt().unwrap(), 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_failing_source() {
        let source = InMemoryFactSource::new("warehouse", vec![]).failing("connection refused");
        let day = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let err = source
            .list_match_facts(&Window::new(day, day).unwrap())
            .await
            .unwrap_err();
        assert!(err.is_source_failure());
    }
}
