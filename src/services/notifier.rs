//! Notification fan-out
//!
//! Best-effort, bounded-parallel delivery of one template to many recipients.
//! A recipient is skipped when unknown, without a push token, or over the
//! daily cap. One recipient failing never affects the others.

use crate::adapters::{NotificationDispatcher, NotificationLedger, PlayerDirectory};
use crate::domain::{Notification, NotificationTemplate};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to one recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    NoContact,
    CapReached,
    Failed,
}

/// Fan-out statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub attempted: usize,
    pub sent: usize,
    pub no_contact: usize,
    pub capped: usize,
    pub failed: usize,
}

impl FanOutReport {
    fn record(&mut self, delivery: Delivery) {
        self.attempted += 1;
        match delivery {
            Delivery::Sent => self.sent += 1,
            Delivery::NoContact => self.no_contact += 1,
            Delivery::CapReached => self.capped += 1,
            Delivery::Failed => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: FanOutReport) {
        self.attempted += other.attempted;
        self.sent += other.sent;
        self.no_contact += other.no_contact;
        self.capped += other.capped;
        self.failed += other.failed;
    }
}

pub struct NotificationFanout {
    directory: Arc<dyn PlayerDirectory>,
    ledger: Arc<dyn NotificationLedger>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    daily_cap: u32,
    max_concurrent: usize,
}

impl NotificationFanout {
    pub fn new(
        directory: Arc<dyn PlayerDirectory>,
        ledger: Arc<dyn NotificationLedger>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        daily_cap: u32,
        max_concurrent: usize,
    ) -> Self {
        Self {
            directory,
            ledger,
            dispatcher,
            daily_cap,
            max_concurrent: max_concurrent.max(1),
        }
    }

    async fn deliver(&self, recipient: &str, template: &NotificationTemplate, day: NaiveDate) -> Delivery {
        let contact = match self.directory.lookup(recipient).await {
            Ok(Some(contact)) => contact,
            Ok(None) => {
                debug!("No directory entry for {}", recipient);
                return Delivery::NoContact;
            }
            Err(e) => {
                warn!("Directory lookup failed for {}: {}", recipient, e);
                return Delivery::Failed;
            }
        };

        let Some(token) = contact.contact_token.as_deref().filter(|t| !t.is_empty()) else {
            debug!("{} has no push token", recipient);
            return Delivery::NoContact;
        };

        match self
            .ledger
            .reserve_send(recipient, template.category, day, self.daily_cap)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!("{} reached the daily {} cap", recipient, template.category);
                return Delivery::CapReached;
            }
            Err(e) => {
                warn!("Send counter unavailable for {}: {}", recipient, e);
                return Delivery::Failed;
            }
        }

        let notification = Notification::render(template, &contact, token);
        match self.dispatcher.dispatch(&notification).await {
            Ok(()) => Delivery::Sent,
            Err(e) => {
                warn!("Dispatch to {} failed: {}", recipient, e);
                Delivery::Failed
            }
        }
    }

    /// Deliver `template` to every recipient, counting against `day`'s caps
    pub async fn fan_out(&self, recipients: &[String], template: &NotificationTemplate, day: NaiveDate) -> FanOutReport {
        let deliveries: Vec<Delivery> = stream::iter(recipients.iter())
            .map(|recipient| self.deliver(recipient, template, day))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let report = deliveries.into_iter().fold(FanOutReport::default(), |mut acc, d| {
            acc.record(d);
            acc
        });

        info!(
            "{} fan-out: {} sent / {} attempted ({} capped, {} no contact, {} failed)",
            template.category, report.sent, report.attempted, report.capped, report.no_contact, report.failed
        );
        report
    }
}
