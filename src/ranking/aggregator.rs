//! Performance aggregator
//!
//! Scores every in-window fact and folds the scores into one entry per
//! (player, category played, group). Accumulation always starts from a fresh
//! map so independent runs never share state.

use super::calculator::match_score;
use crate::config::ScoringWeights;
use crate::domain::{GroupKey, MatchFact, RoleCategory, Window};
use crate::error::MissingMatchDataError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Summed performance of one player in one category over one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEntry {
    pub player_id: String,
    pub category: RoleCategory,
    pub group: GroupKey,
    pub total_score: f64,
    pub matches_counted: u32,
    pub window: Window,
}

/// A fact together with its computed score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFact {
    pub fact: MatchFact,
    pub score: f64,
}

/// Output of one aggregation pass
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub entries: Vec<AggregatedEntry>,
    pub scored: Vec<ScoredFact>,
    pub skipped: Vec<MissingMatchDataError>,
}

/// Merge facts from the operational store and the warehouse.
///
/// The same (match, player) pair may live in both stores while the warehouse
/// catches up; the operational copy wins so nothing is counted twice.
pub fn merge_facts(operational: Vec<MatchFact>, warehouse: Vec<MatchFact>) -> Vec<MatchFact> {
    let mut seen: HashSet<(String, String)> = operational
        .iter()
        .map(|f| (f.match_id.clone(), f.player_id.clone()))
        .collect();

    let mut merged = operational;
    let mut duplicates = 0usize;
    for fact in warehouse {
        if seen.insert((fact.match_id.clone(), fact.player_id.clone())) {
            merged.push(fact);
        } else {
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        debug!("Dropped {} warehouse facts already present in the operational store", duplicates);
    }
    merged
}

/// Score every fact inside the window; unscoreable facts are skipped and logged
pub fn score_facts(
    facts: &[MatchFact],
    window: &Window,
    weights: &ScoringWeights,
) -> (Vec<ScoredFact>, Vec<MissingMatchDataError>) {
    let mut scored = Vec::with_capacity(facts.len());
    let mut skipped = Vec::new();

    for fact in facts.iter().filter(|f| window.contains(f.match_timestamp)) {
        match match_score(fact, weights) {
            Ok(score) => scored.push(ScoredFact {
                fact: fact.clone(),
                score,
            }),
            Err(e) => {
                warn!("Skipping unscoreable fact: {}", e);
                skipped.push(e);
            }
        }
    }

    (scored, skipped)
}

/// Fold scored facts into aggregated entries.
///
/// A player who played two categories in the window gets two entries; the
/// category is taken from each match, never from a "current" position.
pub fn aggregate_scored<F>(scored: &[ScoredFact], window: &Window, group_of: F) -> Vec<AggregatedEntry>
where
    F: Fn(&MatchFact) -> GroupKey,
{
    let totals = scored.iter().fold(
        HashMap::<(String, RoleCategory, GroupKey), (f64, u32)>::new(),
        |mut acc, s| {
            let key = (s.fact.player_id.clone(), s.fact.category(), group_of(&s.fact));
            let slot = acc.entry(key).or_insert((0.0, 0));
            slot.0 += s.score;
            slot.1 += 1;
            acc
        },
    );

    let mut entries: Vec<AggregatedEntry> = totals
        .into_iter()
        .map(|((player_id, category, group), (total_score, matches_counted))| AggregatedEntry {
            player_id,
            category,
            group,
            total_score,
            matches_counted,
            window: *window,
        })
        .collect();

    entries.sort_by(|a, b| {
        a.group
            .cmp(&b.group)
            .then(a.category.cmp(&b.category))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    entries
}

/// Score and aggregate in one pass
pub fn aggregate<F>(facts: &[MatchFact], window: &Window, weights: &ScoringWeights, group_of: F) -> Aggregation
where
    F: Fn(&MatchFact) -> GroupKey,
{
    let (scored, skipped) = score_facts(facts, window, weights);
    let entries = aggregate_scored(&scored, window, group_of);
    Aggregation {
        entries,
        scored,
        skipped,
    }
}
