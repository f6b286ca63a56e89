//! Single-winner ("star of the match") selection

use super::aggregator::ScoredFact;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// A player nominated on a match record
#[derive(Debug, Clone, PartialEq)]
pub struct Nominee {
    pub player_id: String,
    pub match_id: String,
    pub performance: f64,
    pub votes: u32,
}

impl Nominee {
    pub fn combined_value(&self, vote_weight: f64) -> f64 {
        self.performance + f64::from(self.votes) * vote_weight
    }
}

/// The selected winner and its combined value
#[derive(Debug, Clone, PartialEq)]
pub struct Winner {
    pub nominee: Nominee,
    pub value: f64,
}

/// Highest combined value wins; ties go to the lowest player id.
/// An empty pool yields no winner.
pub fn select_winner(nominees: &[Nominee], vote_weight: f64) -> Option<Winner> {
    nominees
        .iter()
        .max_by(|a, b| {
            OrderedFloat(a.combined_value(vote_weight))
                .cmp(&OrderedFloat(b.combined_value(vote_weight)))
                .then_with(|| b.player_id.cmp(&a.player_id))
        })
        .map(|n| Winner {
            nominee: n.clone(),
            value: n.combined_value(vote_weight),
        })
}

/// Nominees of every match, keyed by match id.
///
/// Only scoreable facts with at least one vote qualify. A player with two
/// facts in the same match has them summed.
pub fn nominees_by_match(scored: &[ScoredFact]) -> BTreeMap<String, Vec<Nominee>> {
    let mut by_match: BTreeMap<String, BTreeMap<String, Nominee>> = BTreeMap::new();

    for s in scored.iter().filter(|s| s.fact.is_nominated()) {
        by_match
            .entry(s.fact.match_id.clone())
            .or_default()
            .entry(s.fact.player_id.clone())
            .and_modify(|n| {
                n.performance += s.score;
                n.votes += s.fact.mvp_votes;
            })
            .or_insert_with(|| Nominee {
                player_id: s.fact.player_id.clone(),
                match_id: s.fact.match_id.clone(),
                performance: s.score,
                votes: s.fact.mvp_votes,
            });
    }

    by_match
        .into_iter()
        .map(|(match_id, players)| (match_id, players.into_values().collect()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nominee(player: &str, performance: f64, votes: u32) -> Nominee {
        Nominee {
            player_id: player.to_string(),
            match_id: "m1".to_string(),
            performance,
            votes,
        }
    }

    #[test]
    fn test_votes_can_decide() {
        let nominees = vec![nominee("a", 40.0, 0), nominee("b", 30.0, 3)];
        let winner = select_winner(&nominees, 5.0).unwrap();
        assert_eq!(winner.nominee.player_id, "b");
        assert!((winner.value - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_tie_goes_to_lowest_player_id() {
        let nominees = vec![nominee("zed", 10.0, 1), nominee("amy", 10.0, 1), nominee("kim", 5.0, 2)];
        let winner = select_winner(&nominees, 5.0).unwrap();
        assert_eq!(winner.nominee.player_id, "amy");
    }

    #[test]
    fn test_empty_pool_has_no_winner() {
        assert!(select_winner(&[], 5.0).is_none());
    }
}
