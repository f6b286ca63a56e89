use super::position::{Position, RoleCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One player's recorded statistics for one match.
///
/// The scoring inputs are optional because diary entries may be saved before
/// they are complete; the calculator refuses to score an incomplete fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFact {
    pub player_id: String,
    pub match_id: String,
    pub role_at_match: Position,
    pub minutes_played: Option<u32>,
    pub goals: Option<u32>,
    pub assists: Option<u32>,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub team_goals: Option<u32>,
    pub opponent_goals: Option<u32>,
    /// "Most valuable teammate" nominations received on this match record
    #[serde(default)]
    pub mvp_votes: u32,
    pub match_timestamp: DateTime<Utc>,
}

impl MatchFact {
    pub fn category(&self) -> RoleCategory {
        self.role_at_match.category()
    }

    pub fn is_nominated(&self) -> bool {
        self.mvp_votes > 0
    }
}

/// Result of a match from the player's team perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Win,
    Draw,
    Loss,
}

impl MatchOutcome {
    pub fn from_goals(own: u32, opponent: u32) -> Self {
        match own.cmp(&opponent) {
            std::cmp::Ordering::Greater => MatchOutcome::Win,
            std::cmp::Ordering::Equal => MatchOutcome::Draw,
            std::cmp::Ordering::Less => MatchOutcome::Loss,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_goals() {
        assert_eq!(MatchOutcome::from_goals(2, 1), MatchOutcome::Win);
        assert_eq!(MatchOutcome::from_goals(0, 0), MatchOutcome::Draw);
        assert_eq!(MatchOutcome::from_goals(1, 3), MatchOutcome::Loss);
    }

    #[test]
    fn test_category_follows_role_at_match() {
        let fact = MatchFact {
            player_id: "p1".to_string(),
            match_id: "m1".to_string(),
            role_at_match: Position::Cb,
            minutes_played: Some(90),
            goals: Some(0),
            assists: Some(0),
            yellow_cards: 0,
            red_cards: 0,
            team_goals: Some(1),
            opponent_goals: None,
            mvp_votes: 0,
            match_timestamp: Utc::now(),
        };
        assert_eq!(fact.category(), RoleCategory::Defenders);
        assert!(!fact.is_nominated());
    }
}
