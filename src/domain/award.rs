use super::position::RoleCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Award types issued by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AwardKind {
    /// Composite team of the period
    TeamOfThePeriod,
    /// Single winner of one match
    StarOfTheMatch,
}

impl AwardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AwardKind::TeamOfThePeriod => "TEAM_OF_THE_PERIOD",
            AwardKind::StarOfTheMatch => "STAR_OF_THE_MATCH",
        }
    }
}

impl fmt::Display for AwardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AwardKind {
    type Err = crate::error::LaurelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEAM_OF_THE_PERIOD" => Ok(AwardKind::TeamOfThePeriod),
            "STAR_OF_THE_MATCH" => Ok(AwardKind::StarOfTheMatch),
            other => Err(crate::error::LaurelError::Validation(format!(
                "unknown award kind: {other}"
            ))),
        }
    }
}

/// Natural idempotency key: at most one award exists per key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AwardKey {
    pub kind: AwardKind,
    /// Period key or match reference
    pub scope: String,
    /// Group key for teams, player id for period-scoped individual awards
    pub subject: Option<String>,
}

impl AwardKey {
    /// Composite team for one period and group
    pub fn team(period_key: &str, group: &GroupKey) -> Self {
        Self {
            kind: AwardKind::TeamOfThePeriod,
            scope: period_key.to_string(),
            subject: Some(group.to_string()),
        }
    }

    /// Match-scoped award: one winner per match
    pub fn for_match(kind: AwardKind, match_id: &str) -> Self {
        Self {
            kind,
            scope: match_id.to_string(),
            subject: None,
        }
    }

    /// Flattened form stored in the unique `natural_key` column
    pub fn natural_key(&self) -> String {
        match &self.subject {
            Some(subject) => format!("{}:{}:{}", self.kind, self.scope, subject),
            None => format!("{}:{}", self.kind, self.scope),
        }
    }
}

impl fmt::Display for AwardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.natural_key())
    }
}

/// Grouping of aggregated entries; one composite team per group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupKey {
    Global,
    Country(String),
}

impl GroupKey {
    pub fn country(code: Option<&str>) -> Self {
        match code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(c) => GroupKey::Country(c.to_ascii_uppercase()),
            None => GroupKey::Country("UNKNOWN".to_string()),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Global => write!(f, "global"),
            GroupKey::Country(code) => write!(f, "country:{code}"),
        }
    }
}

/// One roster slot of a composite team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub player_id: String,
    pub category: RoleCategory,
    pub score: f64,
}

/// Roster selected for one period and group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeTeam {
    pub period_key: String,
    pub group: GroupKey,
    pub members: Vec<TeamMember>,
}

impl CompositeTeam {
    pub fn player_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.player_id.clone()).collect()
    }
}

/// Award given to a single player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndividualAward {
    pub subject_player_id: String,
    pub kind: AwardKind,
    pub period_key: String,
    /// Match id for match-scoped awards, period key otherwise
    pub reference: String,
    pub value: f64,
}

/// What an award row holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AwardPayload {
    Team(CompositeTeam),
    Individual(IndividualAward),
}

impl AwardPayload {
    /// Players who receive this award
    pub fn recipients(&self) -> Vec<String> {
        match self {
            AwardPayload::Team(team) => team.player_ids(),
            AwardPayload::Individual(award) => vec![award.subject_player_id.clone()],
        }
    }

    pub fn period_key(&self) -> &str {
        match self {
            AwardPayload::Team(team) => &team.period_key,
            AwardPayload::Individual(award) => &award.period_key,
        }
    }
}

/// A persisted award
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardRecord {
    pub key: AwardKey,
    pub payload: AwardPayload,
    pub issued_by_run: Option<uuid::Uuid>,
    pub created_at: DateTime<Utc>,
}
