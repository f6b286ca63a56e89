use crate::error::{LaurelError, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Closed interval of calendar days (UTC) over which performance is aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Window {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(LaurelError::InvalidWindow(format!(
                "start {from} is after end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// The `days` full days that ended before `today`
    pub fn last_closed_days(today: NaiveDate, days: u32) -> Result<Self> {
        if days == 0 {
            return Err(LaurelError::InvalidWindow("window must span at least one day".into()));
        }
        let out_of_range =
            || LaurelError::InvalidWindow(format!("{days} days before {today} is out of range"));
        let to = today.pred_opt().ok_or_else(out_of_range)?;
        let from = to
            .checked_sub_signed(Duration::days(i64::from(days) - 1))
            .ok_or_else(out_of_range)?;
        Self::new(from, to)
    }

    /// First instant of the window
    pub fn start(&self) -> DateTime<Utc> {
        self.from.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
    }

    /// First instant after the window (exclusive bound for range queries)
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        (self.to + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc()
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let day = ts.date_naive();
        day >= self.from && day <= self.to
    }

    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// Stable period identifier derived from the window bounds
    pub fn period_key(&self) -> String {
        format!("{}_{}", self.from.format("%Y%m%d"), self.to.format("%Y%m%d"))
    }

    /// True once the whole window lies before `today`
    pub fn is_closed(&self, today: NaiveDate) -> bool {
        self.to < today
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {}]", self.from, self.to)
    }
}
