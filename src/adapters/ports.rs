//! Traits for the engine's external collaborators
//!
//! Every shared mutable resource is reached only through conditional
//! primitives: insert-if-absent for awards, increment-if-under-cap for
//! notification counters.

use crate::domain::{AwardKey, AwardRecord, MatchFact, Notification, NotificationCategory, PlayerContact, Window};
use crate::error::Result;
use crate::ranking::AggregatedEntry;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Where match facts are read from
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MatchFactSource: Send + Sync {
    /// Store name used in logs and errors
    fn name(&self) -> &str;

    /// All facts whose match timestamp falls inside the window
    async fn list_match_facts(&self, window: &Window) -> Result<Vec<MatchFact>>;
}

/// Result of a conditional award insert
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with the same natural key already existed
    Existing(AwardRecord),
}

/// Award/record store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AwardStore: Send + Sync {
    /// Insert the award unless its natural key already exists, atomically
    async fn insert_if_absent(&self, record: &AwardRecord) -> Result<InsertOutcome>;

    async fn find(&self, key: &AwardKey) -> Result<Option<AwardRecord>>;

    /// Append the award to a player's public achievement history.
    /// Returns false when the entry was already present.
    async fn append_achievement(&self, player_id: &str, record: &AwardRecord) -> Result<bool>;

    /// Persist aggregated entries for audit; returns rows written
    async fn save_snapshot(&self, period_key: &str, entries: &[AggregatedEntry]) -> Result<u64>;
}

/// Per-recipient daily send counters
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationLedger: Send + Sync {
    /// Increment today's counter if it is below `cap`.
    /// Returns false when the cap was already reached.
    async fn reserve_send(
        &self,
        recipient: &str,
        category: NotificationCategory,
        day: NaiveDate,
        cap: u32,
    ) -> Result<bool>;
}

/// Fire-and-forget delivery
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> Result<()>;
}

/// Read-only player lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn lookup(&self, player_id: &str) -> Result<Option<PlayerContact>>;

    /// Batched lookup; unknown ids are absent from the map
    async fn lookup_many(&self, player_ids: &[String]) -> Result<HashMap<String, PlayerContact>>;
}
