//! Match score calculator
//!
//! Pure weighted sum over one player's match facts. No I/O.

use crate::config::ScoringWeights;
use crate::domain::{MatchFact, MatchOutcome};
use crate::error::MissingMatchDataError;

/// Bonus for the match result
pub fn result_bonus(weights: &ScoringWeights, own_goals: u32, opponent_goals: u32) -> f64 {
    match MatchOutcome::from_goals(own_goals, opponent_goals) {
        MatchOutcome::Win => weights.win,
        MatchOutcome::Draw => weights.draw,
        MatchOutcome::Loss => weights.loss,
    }
}

/// Performance score of one player in one match.
///
/// Fails instead of defaulting to zero when minutes, goals, assists or the
/// result are missing.
pub fn match_score(fact: &MatchFact, weights: &ScoringWeights) -> Result<f64, MissingMatchDataError> {
    let mut missing = Vec::new();
    if fact.minutes_played.is_none() {
        missing.push("minutes_played");
    }
    if fact.goals.is_none() {
        missing.push("goals");
    }
    if fact.assists.is_none() {
        missing.push("assists");
    }
    if fact.team_goals.is_none() || fact.opponent_goals.is_none() {
        missing.push("result");
    }

    let (Some(minutes), Some(goals), Some(assists), Some(own), Some(opp)) = (
        fact.minutes_played,
        fact.goals,
        fact.assists,
        fact.team_goals,
        fact.opponent_goals,
    ) else {
        return Err(MissingMatchDataError {
            player_id: fact.player_id.clone(),
            match_id: fact.match_id.clone(),
            missing,
        });
    };

    let score = f64::from(assists) * weights.assist
        + f64::from(goals) * weights.goal
        + f64::from(minutes) * weights.minute
        + result_bonus(weights, own, opp)
        + f64::from(fact.red_cards) * weights.red_card
        + f64::from(fact.yellow_cards) * weights.yellow_card
        + f64::from(own) * weights.goal_for
        + f64::from(opp) * weights.goal_against;

    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Position;
    use chrono::{TimeZone, Utc};

    fn fact(goals: u32, assists: u32, minutes: u32, own: u32, opp: u32) -> MatchFact {
        MatchFact {
            player_id: "p1".to_string(),
            match_id: "m1".to_string(),
            role_at_match: Position::St,
            minutes_played: Some(minutes),
            goals: Some(goals),
            assists: Some(assists),
            yellow_cards: 0,
            red_cards: 0,
            team_goals: Some(own),
            opponent_goals: Some(opp),
            mvp_votes: 0,
            match_timestamp: Utc.with_ymd_and_hms(2024, 3, 5, 18, 0, 0).unwrap(),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_literal_score() {
        let weights = ScoringWeights::default();
        // 2 goals, 1 assist, 90 min, won 2-0:
        // 20 + 6 + 9 + 30 + 2*1 + 0*-1 = 67
        let score = match_score(&fact(2, 1, 90, 2, 0), &weights).unwrap();
        assert!(approx(score, 67.0), "got {score}");
    }

    #[test]
    fn test_cards_are_penalties() {
        let weights = ScoringWeights::default();
        let clean = match_score(&fact(0, 0, 90, 1, 1), &weights).unwrap();

        let mut booked = fact(0, 0, 90, 1, 1);
        booked.yellow_cards = 1;
        booked.red_cards = 1;
        let penalized = match_score(&booked, &weights).unwrap();

        assert!(approx(clean - penalized, 13.0));
    }

    #[test]
    fn test_result_bonus_steps() {
        let weights = ScoringWeights::default();
        assert!(approx(result_bonus(&weights, 3, 1), 30.0));
        assert!(approx(result_bonus(&weights, 2, 2), 0.0));
        assert!(approx(result_bonus(&weights, 0, 1), -20.0));
    }

    #[test]
    fn test_win_never_scores_below_loss() {
        let weights = ScoringWeights::default();
        for goals in 0..4 {
            for minutes in [0, 45, 90] {
                for (own, opp) in [(1, 0), (3, 1), (5, 4), (2, 0)] {
                    let win = match_score(&fact(goals, 1, minutes, own, opp), &weights).unwrap();
                    let loss = match_score(&fact(goals, 1, minutes, opp, own), &weights).unwrap();
                    assert!(win >= loss, "win {win} < loss {loss}");
                }
            }
        }
    }

    #[test]
    fn test_zero_is_a_valid_score() {
        let weights = ScoringWeights {
            goal_for: 0.0,
            goal_against: 0.0,
            ..ScoringWeights::default()
        };
        let score = match_score(&fact(0, 0, 0, 0, 0), &weights).unwrap();
        assert!(approx(score, 0.0));
    }

    #[test]
    fn test_missing_fields_fail() {
        let mut incomplete = fact(1, 0, 90, 1, 0);
        incomplete.minutes_played = None;
        incomplete.opponent_goals = None;

        let err = match_score(&incomplete, &ScoringWeights::default()).unwrap_err();
        assert_eq!(err.missing, vec!["minutes_played", "result"]);
        assert_eq!(err.match_id, "m1");
    }
}
