use chrono::{NaiveDate, TimeZone, Utc};
use laurel::config::{CategoryQuotas, ScoringWeights};
use laurel::domain::{GroupKey, MatchFact, Position, RoleCategory, Window};
use laurel::ranking::{aggregate, rank_category, select_composite_team, sort_ranked, AggregatedEntry};
use std::collections::{HashMap, HashSet};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

#[allow(clippy::too_many_arguments)]
fn fact(
    player: &str,
    match_id: &str,
    pos: Position,
    on: u32,
    minutes: u32,
    goals: u32,
    assists: u32,
    (own, opp): (u32, u32),
) -> MatchFact {
    MatchFact {
        player_id: player.to_string(),
        match_id: match_id.to_string(),
        role_at_match: pos,
        minutes_played: Some(minutes),
        goals: Some(goals),
        assists: Some(assists),
        yellow_cards: 0,
        red_cards: 0,
        team_goals: Some(own),
        opponent_goals: Some(opp),
        mvp_votes: 0,
        match_timestamp: Utc.with_ymd_and_hms(2024, 3, on, 18, 30, 0).unwrap(),
    }
}

fn totals(entries: &[AggregatedEntry]) -> HashMap<(String, RoleCategory), f64> {
    entries
        .iter()
        .map(|e| ((e.player_id.clone(), e.category), e.total_score))
        .collect()
}

/// Forwards pool: P1 (2 goals, 1 assist, 90', win), P2 (45', loss), P3 (1 goal, 90', draw)
#[test]
fn forwards_quota_two_selects_p1_then_p3() {
    let facts = vec![
        fact("P1", "m1", Position::St, 5, 90, 2, 1, (2, 0)),
        fact("P2", "m2", Position::Lw, 5, 45, 0, 0, (0, 1)),
        fact("P3", "m3", Position::Cf, 6, 90, 1, 0, (1, 1)),
    ];
    let window = Window::new(day(4), day(10)).unwrap();

    let aggregation = aggregate(&facts, &window, &ScoringWeights::default(), |_| GroupKey::Global);
    let top = rank_category(&aggregation.entries, RoleCategory::Forwards, 2);

    let ids: Vec<&str> = top.iter().map(|e| e.player_id.as_str()).collect();
    assert_eq!(ids, vec!["P1", "P3"]);
    assert_eq!(top[0].total_score, 67.0);
}

/// The ordering holds for other weightings where goals and assists outweigh minutes
#[test]
fn forwards_order_is_robust_to_weights() {
    let facts = vec![
        fact("P1", "m1", Position::St, 5, 90, 2, 1, (2, 0)),
        fact("P2", "m2", Position::Lw, 5, 45, 0, 0, (0, 1)),
        fact("P3", "m3", Position::Cf, 6, 90, 1, 0, (1, 1)),
    ];
    let window = Window::new(day(4), day(10)).unwrap();

    let weightings = [
        ScoringWeights {
            goal: 4.0,
            assist: 3.0,
            minute: 0.01,
            win: 3.0,
            draw: 1.0,
            loss: 0.0,
            ..ScoringWeights::default()
        },
        ScoringWeights {
            goal: 25.0,
            assist: 15.0,
            minute: 0.5,
            win: 0.0,
            draw: 0.0,
            loss: 0.0,
            goal_for: 0.0,
            goal_against: 0.0,
            ..ScoringWeights::default()
        },
    ];

    for weights in weightings {
        let aggregation = aggregate(&facts, &window, &weights, |_| GroupKey::Global);
        let top = rank_category(&aggregation.entries, RoleCategory::Forwards, 2);
        let ids: Vec<&str> = top.iter().map(|e| e.player_id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P3"], "weights {weights:?}");
    }
}

#[test]
fn aggregation_is_additive_over_adjacent_windows() {
    let facts = vec![
        fact("a", "m1", Position::Cb, 4, 90, 0, 0, (1, 0)),
        fact("a", "m2", Position::Cb, 6, 80, 1, 0, (1, 2)),
        fact("a", "m3", Position::Cm, 8, 90, 0, 2, (3, 3)),
        fact("b", "m1", Position::Gk, 4, 90, 0, 0, (1, 0)),
        fact("b", "m4", Position::Gk, 9, 90, 0, 0, (0, 4)),
        fact("c", "m5", Position::St, 10, 30, 2, 0, (2, 1)),
    ];
    let weights = ScoringWeights::default();

    let first = Window::new(day(4), day(6)).unwrap();
    let second = Window::new(day(7), day(10)).unwrap();
    let whole = Window::new(day(4), day(10)).unwrap();

    let mut summed = totals(&aggregate(&facts, &first, &weights, |_| GroupKey::Global).entries);
    for (key, score) in totals(&aggregate(&facts, &second, &weights, |_| GroupKey::Global).entries) {
        *summed.entry(key).or_insert(0.0) += score;
    }
    let direct = totals(&aggregate(&facts, &whole, &weights, |_| GroupKey::Global).entries);

    assert_eq!(summed.len(), direct.len());
    for (key, score) in direct {
        let split = summed[&key];
        assert!((split - score).abs() < 1e-9, "{key:?}: {split} != {score}");
    }
}

#[test]
fn composite_respects_quotas_and_has_no_duplicates() {
    let window = Window::new(day(4), day(10)).unwrap();
    let positions = [
        Position::Cb,
        Position::Lb,
        Position::Cm,
        Position::Cdm,
        Position::St,
        Position::Rw,
        Position::Gk,
    ];

    // every player appears in several categories
    let mut facts = Vec::new();
    for p in 0..12u32 {
        for (i, pos) in positions.iter().enumerate() {
            if (p as usize + i) % 3 == 0 {
                let goals = (p * 7 + i as u32) % 4;
                facts.push(fact(&format!("p{p:02}"), &format!("m{i}"), *pos, 5, 90, goals, p % 2, (2, 1)));
            }
        }
    }

    let aggregation = aggregate(&facts, &window, &ScoringWeights::default(), |_| GroupKey::Global);
    let quotas = CategoryQuotas::default();
    let team = select_composite_team(&aggregation.entries, &quotas, &window.period_key(), GroupKey::Global);

    assert!(team.members.len() <= quotas.total());
    let unique: HashSet<&str> = team.members.iter().map(|m| m.player_id.as_str()).collect();
    assert_eq!(unique.len(), team.members.len());
    for category in RoleCategory::ALL {
        let n = team.members.iter().filter(|m| m.category == category).count();
        assert!(n <= quotas.for_category(category), "{category} over quota");
    }
}

#[test]
fn ranking_is_deterministic_with_ties() {
    let window = Window::new(day(4), day(10)).unwrap();
    let facts: Vec<MatchFact> = ["zoe", "amy", "kim", "bob"]
        .iter()
        .map(|p| fact(p, "m1", Position::Cm, 5, 90, 1, 0, (1, 0)))
        .collect();

    let aggregation = aggregate(&facts, &window, &ScoringWeights::default(), |_| GroupKey::Global);

    let mut forward = aggregation.entries.clone();
    let mut reversed: Vec<AggregatedEntry> = aggregation.entries.iter().rev().cloned().collect();
    sort_ranked(&mut forward);
    sort_ranked(&mut reversed);

    assert_eq!(forward, reversed);
    let ids: Vec<&str> = forward.iter().map(|e| e.player_id.as_str()).collect();
    assert_eq!(ids, vec!["amy", "bob", "kim", "zoe"]);
}
