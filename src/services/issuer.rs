use crate::adapters::{AwardStore, InsertOutcome};
use crate::domain::{AwardKey, AwardPayload, AwardRecord};
use crate::error::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Idempotent award issuer
///
/// Issues each award at most once per natural key, however many times the
/// scheduler re-runs the job.
///
/// # How it works
/// 1. Build the award record for the natural key
/// 2. Conditionally insert it (insert succeeds only if the key is absent)
/// 3. If the key already existed, return the stored record untouched
/// 4. Only a fresh insert appends the award to each recipient's achievement
///    history and lets the caller notify
///
/// # Example
/// ```rust,ignore
/// let issuer = AwardIssuer::new(store, run_id);
/// let issued = issuer.issue(key, AwardPayload::Team(team)).await?;
/// if issued.created {
///     // notify recipients
/// }
/// ```
pub struct AwardIssuer {
    store: Arc<dyn AwardStore>,
    run_id: Uuid,
}

/// Result of an issue attempt
#[derive(Debug, Clone, PartialEq)]
pub struct Issued {
    /// True only for the invocation that wrote the row
    pub created: bool,
    /// The stored award (the pre-existing one when `created` is false)
    pub record: AwardRecord,
}

impl AwardIssuer {
    pub fn new(store: Arc<dyn AwardStore>, run_id: Uuid) -> Self {
        Self { store, run_id }
    }

    pub async fn issue(&self, key: AwardKey, payload: AwardPayload) -> Result<Issued> {
        let record = AwardRecord {
            key,
            payload,
            issued_by_run: Some(self.run_id),
            created_at: Utc::now(),
        };

        match self.store.insert_if_absent(&record).await? {
            InsertOutcome::Inserted => {
                info!("Issued award {}", record.key);
                self.append_achievements(&record).await;
                Ok(Issued {
                    created: true,
                    record,
                })
            }
            InsertOutcome::Existing(existing) => {
                debug!(
                    "Award {} already issued (run {:?}), skipping",
                    existing.key, existing.issued_by_run
                );
                Ok(Issued {
                    created: false,
                    record: existing,
                })
            }
        }
    }

    /// Best effort: the award itself is already durable
    async fn append_achievements(&self, record: &AwardRecord) {
        for player_id in record.payload.recipients() {
            if let Err(e) = self.store.append_achievement(&player_id, record).await {
                warn!(
                    "Failed to append {} to achievements of {}: {}",
                    record.key, player_id, e
                );
            }
        }
    }
}
